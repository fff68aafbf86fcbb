pub mod config;
pub mod endpoint;
pub mod pod;
pub mod service;
pub mod status;
pub mod validate;
