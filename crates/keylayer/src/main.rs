//! keylayer - keyboard sequences over a measurement panel.
//!
//! Runs the controller against an in-memory host. Key chords are read from
//! stdin one per line (`u`, `shift-u`, `ctrl-c`, `escape`); notifications,
//! prompts and clipboard contents go to stdout, logs to stderr.

mod console;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use controller::Controller;
use host::{Fixture, MemoryHost};
use sequence::KeyEvent;
use settings::Config;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use console::{ConsoleHost, StdoutClipboard};

const DEMO_FIXTURE: &str = include_str!("../fixtures/panel.json");

#[derive(Debug, Parser)]
#[command(name = "keylayer", version, about = "Keyboard sequences over a measurement panel")]
struct Args {
    /// JSON panel fixture to load instead of the built-in demo panel
    #[arg(long, short)]
    fixture: Option<PathBuf>,

    /// Config directory (defaults to the platform config dir)
    #[arg(long, env = keylayer_paths::CONFIG_DIR_ENV)]
    config_dir: Option<PathBuf>,

    /// Do not watch the config file for changes
    #[arg(long)]
    no_watch: bool,
}

fn is_debug_mode() -> bool {
    std::env::var("KEYLAYER_DEBUG").is_ok()
}

/// Workspace crates that log; each gets the same level as the binary.
const LOG_TARGETS: &[&str] = &[
    "keylayer",
    "controller",
    "sequence",
    "dispatch",
    "cell_cache",
    "settings",
    "actions",
    "host",
];

fn default_filter(debug: bool) -> String {
    let (level, rest) = if debug { ("trace", "info") } else { ("info", "warn") };
    let mut directives: Vec<String> = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect();
    directives.push(rest.to_string());
    directives.join(",")
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(is_debug_mode())));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .with(filter)
        .init();

    if is_debug_mode() {
        info!(
            "keylayer v{} starting up (DEBUG MODE ENABLED)",
            env!("CARGO_PKG_VERSION")
        );
    } else {
        info!("keylayer v{} starting up", env!("CARGO_PKG_VERSION"));
    }
}

fn parse_fixture(json: &str) -> Result<Fixture> {
    serde_json::from_str(json).context("invalid panel fixture")
}

fn load_fixture(path: Option<&Path>) -> Result<Fixture> {
    let Some(path) = path else {
        return parse_fixture(DEMO_FIXTURE);
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixture: {}", path.display()))?;
    parse_fixture(&json).with_context(|| format!("in {}", path.display()))
}

/// Forward parsed stdin lines until EOF. Unparseable lines are skipped.
async fn read_keys(keys: mpsc::UnboundedSender<KeyEvent>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.parse::<KeyEvent>() {
            Ok(event) => {
                if keys.send(event).is_err() {
                    break;
                }
            }
            Err(e) => warn!(line, "ignoring key: {e}"),
        }
    }
    debug!("stdin closed");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    if let Some(dir) = args.config_dir {
        keylayer_paths::set_config_dir(dir);
    }
    let config_path = settings::ensure_config_file()?;
    let config = settings::load_config_from(&config_path);
    debug!(path = %config_path.display(), ?config, "config loaded");

    let fixture = load_fixture(args.fixture.as_deref())?;
    let host = ConsoleHost::new(MemoryHost::from_fixture(&fixture));
    let controller = Controller::new(host, &config);

    let (config_tx, config_rx) = mpsc::unbounded_channel::<Config>();
    let _watcher = if args.no_watch {
        None
    } else {
        let watcher = settings::watch_config(config_path, move |config| {
            let _ = config_tx.send(config);
        })?;
        Some(watcher)
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?;

    let controller = runtime.block_on(async move {
        let (key_tx, key_rx) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_keys(key_tx));
        let controller =
            controller::run(controller, Arc::new(StdoutClipboard), key_rx, config_rx).await;
        match reader.await {
            Ok(Err(e)) => warn!("{e:#}"),
            Err(e) => warn!("stdin reader stopped: {e}"),
            Ok(Ok(())) => {}
        }
        controller
    });

    println!("Panel ({}):", controller.policy());
    controller.host().print_panel();
    info!("keylayer shutting down");
    Ok(())
}
