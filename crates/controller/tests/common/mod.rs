//! Shared helpers for controller integration tests.

#![allow(dead_code)]

use std::time::{Duration, Instant};

use controller::Controller;
use host::{CellRef, MemoryHost};
use sequence::KeyEvent;
use settings::Config;

/// Upper bound for anything the async loop has to finish.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Spacing between keys typed by [`type_keys`].
pub const KEY_GAP: Duration = Duration::from_millis(10);

/// Cells of the standard panel, in display order.
pub struct PanelCells {
    pub length: CellRef,
    pub center: [CellRef; 3],
    pub angle: CellRef,
}

/// Three rows and a header, plus the actions the default tables use.
pub fn panel_host() -> (MemoryHost, PanelCells) {
    let mut host = MemoryHost::new();
    let length = host.push_scalar_row("Length", "25.4");
    let center = host.push_vector_row("Center", ["12.7", "-6.35", "330.2"]);
    let angle = host.push_scalar_row("Angle", "45°");
    host.push_header_row("Selection");

    for tool in ["measure", "section", "inspector", "isolate", "explode"] {
        host.add_toggle(tool, false);
    }
    host.add_command("fit");
    for view in settings::constants::views::DEFAULT_CAMERA_VIEWS {
        host.add_command(view);
    }
    host.add_toggle("grid", true);
    host.add_toggle("grid-plane-x", false);
    host.set_node_count(3);

    (
        host,
        PanelCells {
            length,
            center,
            angle,
        },
    )
}

/// Defaults with the shortest sequence timeout allowed.
pub fn fast_config() -> Config {
    Config {
        sequence_timeout_ms: 100,
        reconcile_interval_ms: 50,
        ..Config::default()
    }
}

pub fn controller() -> (Controller<MemoryHost>, PanelCells) {
    let (host, cells) = panel_host();
    (Controller::new(host, &Config::default()), cells)
}

/// Type whitespace-separated keys starting at `start`. Returns the
/// consumed flags.
pub fn type_keys(ctl: &mut Controller<MemoryHost>, keys: &str, start: Instant) -> Vec<bool> {
    keys.split_whitespace()
        .enumerate()
        .map(|(i, key)| {
            let event: KeyEvent = key.parse().expect("valid key");
            ctl.handle_key(&event, start + KEY_GAP * i as u32)
        })
        .collect()
}

/// Let the armed sequence deadline fire.
pub fn expire(ctl: &mut Controller<MemoryHost>) {
    let token = ctl.pending_deadline().expect("deadline armed");
    ctl.handle_deadline(token, token.at);
}

pub fn last_notification(ctl: &Controller<MemoryHost>) -> Option<(String, bool)> {
    ctl.host().last_notification().cloned()
}
