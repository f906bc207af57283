pub mod config;
pub mod err;
