pub mod backoff;
pub mod error;
pub mod supervisor;
pub mod translator;
pub mod watcher;

#[cfg(test)]
mod testing;

pub use error::WatchError;
pub use supervisor::{SwitchOutcome, WatchSupervisor};
pub use watcher::{ServiceWatcher, WatchState, WatchStatus};
