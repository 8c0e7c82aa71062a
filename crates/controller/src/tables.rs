//! Turn config entries into the interpreter's key tables.

use actions::{Binding, BindingTable, Chord, Command, ViewMenu};
use dispatch::ActionMap;
use settings::{Config, KeybindingEntry, ViewOptionEntry};
use tracing::warn;

const UNBIND: &str = "none";

fn relabel(command: Command, label: &str) -> Command {
    match command {
        Command::ToggleTool { action, .. } => Command::tool(action, label),
        Command::ToggleViewOption { action, .. } => Command::view_option(action, label),
        other => other,
    }
}

fn default_label(command: &Command) -> String {
    match command {
        Command::ToggleTool { label, .. } | Command::ToggleViewOption { label, .. } => {
            label.clone()
        }
        other => other.to_string(),
    }
}

/// Default bindings with config overrides applied. Bad entries are
/// skipped with a warning.
pub fn binding_table(entries: &[KeybindingEntry]) -> BindingTable {
    let mut table = BindingTable::defaults();
    for entry in entries {
        let chord: Chord = match entry.keys.parse() {
            Ok(chord) => chord,
            Err(e) => {
                warn!(keys = %entry.keys, "skipping keybinding: {e}");
                continue;
            }
        };
        if entry.action.trim() == UNBIND {
            table.unbind(chord);
            continue;
        }
        let Some(command) = Command::parse_binding_action(&entry.action) else {
            warn!(
                keys = %entry.keys,
                action = %entry.action,
                "skipping keybinding: unknown action"
            );
            continue;
        };
        let label = entry
            .label
            .clone()
            .unwrap_or_else(|| default_label(&command));
        let binding = Binding {
            chord,
            command: relabel(command, &label),
            label,
        };
        if let Err(e) = table.bind(binding) {
            warn!(keys = %entry.keys, "skipping keybinding: {e}");
        }
    }
    table
}

/// Default `v` menu with config overrides applied.
pub fn view_menu(entries: &[ViewOptionEntry]) -> ViewMenu {
    let mut menu = ViewMenu::defaults();
    for entry in entries {
        if entry.key.is_uppercase() {
            warn!(key = %entry.key, "skipping view option: use a lowercase key");
            continue;
        }
        if entry.action.trim() == UNBIND {
            menu.remove(entry.key);
            continue;
        }
        let Some(command) = Command::parse_view_action(&entry.action) else {
            warn!(key = %entry.key, action = %entry.action, "skipping view option: unknown action");
            continue;
        };
        let label = entry
            .label
            .clone()
            .unwrap_or_else(|| default_label(&command));
        menu.set(entry.key, relabel(command, &label), label);
    }
    menu
}

pub fn action_map(config: &Config) -> ActionMap {
    config
        .actions
        .iter()
        .map(|(name, id)| (name.clone(), id.clone()))
        .collect()
}
