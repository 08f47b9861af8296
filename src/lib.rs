pub mod automation;
pub mod capture;
pub mod config;
pub mod input;
pub mod vision;
