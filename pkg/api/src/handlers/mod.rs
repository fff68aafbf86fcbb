pub mod contexts;
pub mod health;
pub mod services;
pub mod stream;
