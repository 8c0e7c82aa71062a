//! TOML config file support with live reload.
//!
//! Config location: `~/.config/keylayer/config.toml`

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use indexmap::IndexMap;
use notify::Watcher;
use parking_lot::Mutex;
use serde::Deserialize;
use units::{Precision, Unit, UnitPolicy};

use crate::constants;

/// Idle-state binding override: maps a key chord to a command.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct KeybindingEntry {
    /// Key chord (e.g., "u", "shift-u")
    pub keys: String,
    /// Builtin command ("toggle-unit", ...), "tool:<name>", or "none"
    pub action: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// `v`-menu override: maps a single key to a view toggle.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ViewOptionEntry {
    pub key: char,
    /// "grid-plane:<x|y|z>", "option:<name>", or "none"
    pub action: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// User-facing config parsed from TOML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Milliseconds a partial key sequence waits for its next key.
    pub sequence_timeout_ms: u64,
    /// Milliseconds between cell reconciliation passes.
    pub reconcile_interval_ms: u64,
    /// Unit the session starts in.
    pub default_unit: Unit,
    /// Fraction denominator for inch display (8, 16 or 32).
    pub default_precision: Precision,
    /// Split whole inches into feet.
    pub feet: bool,
    /// Symbolic action name to host identifier.
    pub actions: IndexMap<String, String>,
    /// Views selected by `1v`, `2v`, ...
    pub camera_views: Vec<String>,
    pub keybindings: Vec<KeybindingEntry>,
    pub view_options: Vec<ViewOptionEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sequence_timeout_ms: constants::sequence::DEFAULT_TIMEOUT.as_millis() as u64,
            reconcile_interval_ms: constants::reconcile::DEFAULT_INTERVAL.as_millis() as u64,
            default_unit: Unit::default(),
            default_precision: Precision::default(),
            feet: false,
            actions: IndexMap::new(),
            camera_views: constants::views::DEFAULT_CAMERA_VIEWS
                .iter()
                .map(|view| view.to_string())
                .collect(),
            keybindings: Vec::new(),
            view_options: Vec::new(),
        }
    }
}

impl Config {
    pub fn sequence_timeout(&self) -> Duration {
        Duration::from_millis(self.sequence_timeout_ms).clamp(
            constants::sequence::MIN_TIMEOUT,
            constants::sequence::MAX_TIMEOUT,
        )
    }

    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_millis(self.reconcile_interval_ms).clamp(
            constants::reconcile::MIN_INTERVAL,
            constants::reconcile::MAX_INTERVAL,
        )
    }

    /// Session policy the unit commands start from.
    pub fn unit_policy(&self) -> UnitPolicy {
        UnitPolicy {
            unit: self.default_unit,
            precision: self.default_precision,
            feet_enabled: self.feet,
        }
    }

    /// Drop entries carrying absurdly long strings.
    fn sanitize(mut self) -> Self {
        let max = constants::settings::MAX_STRING_LENGTH;
        let too_long = |s: &str| s.len() > max;

        self.actions.retain(|name, id| {
            let keep = !too_long(name) && !too_long(id);
            if !keep {
                tracing::warn!("Ignoring oversized action mapping");
            }
            keep
        });
        self.camera_views.retain(|view| !too_long(view));
        self.keybindings.retain(|entry| {
            let keep = !too_long(&entry.keys)
                && !too_long(&entry.action)
                && !entry.label.as_deref().is_some_and(too_long);
            if !keep {
                tracing::warn!("Ignoring oversized keybinding entry");
            }
            keep
        });
        self.view_options.retain(|entry| {
            !too_long(&entry.action) && !entry.label.as_deref().is_some_and(too_long)
        });
        self
    }
}

/// Default config file content with comments (generated on first launch).
const DEFAULT_CONFIG: &str = r#"# keylayer configuration
# Changes are applied live; just save this file.

# How long a partial key sequence (e.g. "3x") waits for the next key
sequence-timeout-ms = 1000

# How often displayed measurement cells are re-checked
reconcile-interval-ms = 250

# Unit at startup: "mm" or "inch". Toggle with u, cycle precision with shift-u.
default-unit = "mm"

# Inch fraction precision: 8, 16 or 32
default-precision = 16

# Show feet for values of 12" and above (toggle with shift-f)
feet = false

# Views selected by 1v, 2v, ...
camera-views = ["view-front", "view-back", "view-top", "view-bottom", "view-left", "view-right", "view-iso"]

# Map symbolic action names to the host's own identifiers
# [actions]
# measure = "toolbar.measure"
# view-top = "camera.top"

# Custom keybindings (override defaults). Digits, y and v are reserved.
# [[keybindings]]
# keys = "shift-m"
# action = "tool:markup"
# label = "Markup"
#
# [[keybindings]]
# keys = "e"
# action = "none"

# Entries for the v menu
# [[view-options]]
# key = "s"
# action = "option:shadows"
# label = "Shadows"
"#;

/// Return the config file path.
pub fn config_path() -> PathBuf {
    keylayer_paths::config_file()
}

/// Write the commented default config at `path` unless a file exists.
/// Returns whether a file was created.
pub fn ensure_config_file_at(path: &Path) -> anyhow::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {}", parent.display()))?;
    }
    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("writing default config to {}", path.display()))?;
    tracing::info!("Created default config at {:?}", path);
    Ok(true)
}

/// Ensure the config file exists, creating a default if missing.
/// Returns the path to the config file.
pub fn ensure_config_file() -> anyhow::Result<PathBuf> {
    let path = config_path();
    ensure_config_file_at(&path)?;
    Ok(path)
}

/// Parse config text, rejecting oversized input.
pub fn parse_config(content: &str) -> anyhow::Result<Config> {
    if content.len() as u64 > constants::settings::MAX_FILE_SIZE {
        bail!("config file too large ({} bytes)", content.len());
    }
    let config: Config = toml::from_str(content).context("parsing config.toml")?;
    Ok(config.sanitize())
}

/// Load and parse the config file at `path`. Returns default on any error.
pub fn load_config_from(path: &Path) -> Config {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to read config: {}", e);
            }
            return Config::default();
        }
    };

    match parse_config(&content) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!("{:#}, using defaults", e);
            Config::default()
        }
    }
}

/// Load the config from its default location.
pub fn load_config() -> Config {
    load_config_from(&config_path())
}

/// Keeps the config file watched until dropped.
pub struct ConfigWatcher {
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
    current: Arc<Mutex<Config>>,
}

impl ConfigWatcher {
    /// Last config read from disk.
    pub fn current(&self) -> Config {
        self.current.lock().clone()
    }
}

/// Start watching the config file at `path`.
///
/// `on_change` runs on the watcher thread with every config that differs
/// from the previous one.
pub fn watch_config(
    path: PathBuf,
    on_change: impl Fn(Config) + Send + 'static,
) -> anyhow::Result<ConfigWatcher> {
    use notify_debouncer_mini::new_debouncer;

    let watch_dir = path
        .parent()
        .context("config path has no parent directory")?
        .to_path_buf();

    let current = Arc::new(Mutex::new(load_config_from(&path)));
    let current_clone = current.clone();
    let path_clone = path.clone();

    let mut debouncer = new_debouncer(
        constants::settings::WATCH_DEBOUNCE,
        move |res: Result<Vec<notify_debouncer_mini::DebouncedEvent>, _>| {
            let Ok(events) = res else {
                return;
            };
            if !events.iter().any(|event| event.path == path_clone) {
                return;
            }
            let new_config = load_config_from(&path_clone);
            let mut prev = current_clone.lock();
            if new_config != *prev {
                tracing::info!("Config file changed, reloading...");
                *prev = new_config.clone();
                drop(prev);
                on_change(new_config);
            }
        },
    )
    .context("creating config watcher")?;

    debouncer
        .watcher()
        .watch(&watch_dir, notify::RecursiveMode::NonRecursive)
        .with_context(|| format!("watching {}", watch_dir.display()))?;

    tracing::info!("Watching config file: {:?}", path);
    Ok(ConfigWatcher {
        _debouncer: debouncer,
        current,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_has_sane_values() {
        let cfg = Config::default();
        assert_eq!(cfg.sequence_timeout(), Duration::from_millis(1000));
        assert_eq!(cfg.reconcile_interval(), Duration::from_millis(250));
        assert_eq!(cfg.unit_policy(), UnitPolicy::millimeters());
        assert_eq!(cfg.camera_views.len(), 7);
        assert!(cfg.actions.is_empty());
    }

    #[test]
    fn default_config_template_matches_defaults() {
        let cfg = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn empty_string_parses_to_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn parses_full_toml() {
        let toml_str = r#"
sequence-timeout-ms = 600
reconcile-interval-ms = 100
default-unit = "inch"
default-precision = 32
feet = true
camera-views = ["top", "iso"]

[actions]
measure = "toolbar.measure"
top = "camera.top"

[[keybindings]]
keys = "shift-m"
action = "tool:markup"
label = "Markup"

[[view-options]]
key = "s"
action = "option:shadows"
"#;
        let cfg = parse_config(toml_str).unwrap();
        assert_eq!(cfg.sequence_timeout(), Duration::from_millis(600));
        assert_eq!(cfg.reconcile_interval(), Duration::from_millis(100));
        assert_eq!(
            cfg.unit_policy(),
            UnitPolicy::inches(Precision::ThirtySecond).with_feet(true)
        );
        assert_eq!(cfg.camera_views, vec!["top", "iso"]);
        assert_eq!(
            cfg.actions.keys().collect::<Vec<_>>(),
            vec!["measure", "top"]
        );
        assert_eq!(cfg.keybindings[0].label.as_deref(), Some("Markup"));
        assert_eq!(cfg.view_options[0].key, 's');
        assert_eq!(cfg.view_options[0].label, None);
    }

    #[test]
    fn timings_are_clamped() {
        let cfg = parse_config("sequence-timeout-ms = 5\nreconcile-interval-ms = 999999").unwrap();
        assert_eq!(cfg.sequence_timeout(), constants::sequence::MIN_TIMEOUT);
        assert_eq!(cfg.reconcile_interval(), constants::reconcile::MAX_INTERVAL);
    }

    #[test]
    fn rejects_bad_precision() {
        assert!(parse_config("default-precision = 10").is_err());
    }

    #[test]
    fn ignores_unknown_keys() {
        let cfg = parse_config("theme = \"Nord\"\nfeet = true").unwrap();
        assert!(cfg.feet);
    }

    #[test]
    fn rejects_oversized_file() {
        let padding = "#".repeat(constants::settings::MAX_FILE_SIZE as usize + 1);
        assert!(parse_config(&padding).is_err());
    }

    #[test]
    fn drops_oversized_entries() {
        let long = "x".repeat(constants::settings::MAX_STRING_LENGTH + 1);
        let toml_str = format!(
            "[[keybindings]]\nkeys = \"m\"\naction = \"tool:{long}\"\n\n[[keybindings]]\nkeys = \"n\"\naction = \"tool:ok\"\n"
        );
        let cfg = parse_config(&toml_str).unwrap();
        assert_eq!(cfg.keybindings.len(), 1);
        assert_eq!(cfg.keybindings[0].keys, "n");
    }

    #[test]
    fn ensure_creates_once_and_load_reads_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        assert!(ensure_config_file_at(&path).unwrap());
        assert!(!ensure_config_file_at(&path).unwrap());
        assert_eq!(load_config_from(&path), Config::default());

        std::fs::write(&path, "default-unit = \"in\"").unwrap();
        assert_eq!(load_config_from(&path).default_unit, Unit::Inch);
    }

    #[test]
    fn load_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert_eq!(load_config_from(&missing), Config::default());

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "feet = [").unwrap();
        assert_eq!(load_config_from(&broken), Config::default());
    }

    #[test]
    fn watcher_starts_with_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "feet = true").unwrap();

        let watcher = watch_config(path, |_| {}).unwrap();
        assert!(watcher.current().feet);
    }
}
