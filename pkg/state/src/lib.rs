pub mod store;

pub use store::{Generation, StatusStore};
