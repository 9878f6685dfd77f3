pub mod config;
pub mod device_identity;
