//! Configuration for keylayer.
//!
//! Provides compile-time constants and TOML config file support.

pub mod constants;
pub mod file;

pub use file::{
    config_path, ensure_config_file, ensure_config_file_at, load_config, load_config_from,
    parse_config, watch_config, Config, ConfigWatcher, KeybindingEntry, ViewOptionEntry,
};
