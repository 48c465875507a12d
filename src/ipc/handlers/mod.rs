pub mod calc;
pub mod config;
pub mod core;
pub mod reports;
