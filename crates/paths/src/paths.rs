//! Where keylayer keeps its files.
//!
//! Directories are resolved once and cached. Call [`set_config_dir`]
//! before first access to point keylayer somewhere else.

use std::path::PathBuf;
use std::sync::OnceLock;

static CONFIG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Environment variable that overrides the config directory.
pub const CONFIG_DIR_ENV: &str = "KEYLAYER_CONFIG_DIR";

/// ~/.config/keylayer (or platform equivalent), unless overridden.
pub fn config_dir() -> &'static PathBuf {
    CONFIG_DIR.get_or_init(|| {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return PathBuf::from(dir);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keylayer")
    })
}

/// Override the config dir. Has no effect after first access.
pub fn set_config_dir(path: PathBuf) {
    let _ = CONFIG_DIR.set(path);
}

/// config_dir()/config.toml
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_is_toml_inside_config_dir() {
        let path = config_file();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("toml"));
        assert_eq!(path.parent(), Some(config_dir().as_path()));
    }
}
