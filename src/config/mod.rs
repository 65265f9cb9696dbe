#![allow(clippy::module_inception)]
mod config;

pub use config::{config_file_path, load_file_config_with_path, Config, ConfigError, FileConfig};
