//! Idle-state bindings and the `v` view menu.

use indexmap::IndexMap;
use tracing::debug;

use crate::{Axis, Chord, Command};

/// Keys the sequence grammar owns. They can never be rebound: digits start
/// a count, `y` starts a yank and `v` opens the view menu.
pub fn is_reserved(chord: Chord) -> bool {
    !chord.shift && (chord.key.is_ascii_digit() || chord.key == 'y' || chord.key == 'v')
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub chord: Chord,
    pub command: Command,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("`{0}` is reserved for key sequences")]
    Reserved(Chord),
}

/// Single-key commands available from idle, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    bindings: IndexMap<Chord, Binding>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defaults() -> Self {
        let mut table = Self::new();
        let entries = [
            (Chord::plain('u'), Command::ToggleUnit, "Toggle mm / inch"),
            (Chord::shifted('u'), Command::CyclePrecision, "Cycle inch precision"),
            (Chord::shifted('f'), Command::ToggleFeet, "Toggle feet"),
            (Chord::plain('m'), Command::tool("measure", "Measure"), "Measure"),
            (Chord::plain('s'), Command::tool("section", "Section"), "Section"),
            (Chord::plain('i'), Command::tool("inspector", "Inspector"), "Inspector"),
            (Chord::shifted('i'), Command::tool("isolate", "Isolate"), "Isolate"),
            (Chord::plain('e'), Command::tool("explode", "Explode"), "Explode"),
            (Chord::plain('f'), Command::tool("fit", "Fit to view"), "Fit to view"),
        ];
        for (chord, command, label) in entries {
            table.bindings.insert(
                chord,
                Binding {
                    chord,
                    command,
                    label: label.to_string(),
                },
            );
        }
        table
    }

    /// Add or replace a binding. Reserved chords are refused.
    pub fn bind(&mut self, binding: Binding) -> Result<(), BindingError> {
        if is_reserved(binding.chord) {
            return Err(BindingError::Reserved(binding.chord));
        }
        debug!(chord = %binding.chord, command = %binding.command, "binding key");
        if let Some(previous) = self.bindings.insert(binding.chord, binding) {
            debug!(command = %previous.command, "replaced existing binding");
        }
        Ok(())
    }

    pub fn unbind(&mut self, chord: Chord) -> Option<Binding> {
        let removed = self.bindings.shift_remove(&chord);
        if removed.is_some() {
            debug!(%chord, "key unbound");
        }
        removed
    }

    pub fn lookup(&self, chord: Chord) -> Option<&Binding> {
        self.bindings.get(&chord)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewMenuEntry {
    pub key: char,
    pub command: Command,
    pub label: String,
}

/// Second-key table for the `v` prefix.
#[derive(Debug, Clone, Default)]
pub struct ViewMenu {
    entries: IndexMap<char, ViewMenuEntry>,
}

impl ViewMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defaults() -> Self {
        let mut menu = Self::new();
        let options = [
            ('g', "grid", "Grid"),
            ('e', "edges", "Edges"),
            ('w', "wireframe", "Wireframe"),
            ('p', "perspective", "Perspective"),
            ('t', "transparency", "Transparency"),
        ];
        for (key, action, label) in options {
            menu.set(key, Command::view_option(action, label), label);
        }
        for axis in Axis::ALL {
            let label = format!("Grid plane {}", axis.as_char().to_ascii_uppercase());
            menu.set(axis.as_char(), Command::ToggleGridPlane(axis), label);
        }
        menu
    }

    pub fn set(&mut self, key: char, command: Command, label: impl Into<String>) {
        self.entries.insert(
            key,
            ViewMenuEntry {
                key,
                command,
                label: label.into(),
            },
        );
    }

    pub fn remove(&mut self, key: char) -> Option<ViewMenuEntry> {
        self.entries.shift_remove(&key)
    }

    pub fn lookup(&self, key: char) -> Option<&ViewMenuEntry> {
        self.entries.get(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViewMenuEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
