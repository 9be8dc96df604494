pub mod config;
pub mod endpoint;
pub mod event;
pub mod validate;
