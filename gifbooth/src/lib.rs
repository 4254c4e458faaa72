pub mod config;
pub mod selection;

pub use config::Config;
