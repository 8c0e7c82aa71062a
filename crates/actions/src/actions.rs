//! Command definitions shared across keylayer crates.
//!
//! A [`Command`] is only ever produced by a fully resolved key sequence,
//! and the dispatcher executes it whole. Host-facing commands carry
//! symbolic action names; turning those into host identifiers is
//! configuration, applied by the dispatcher.

pub mod chord;
pub mod table;

use std::fmt;

pub use chord::{Chord, ChordError};
pub use host::Axis;
pub use table::{is_reserved, Binding, BindingError, BindingTable, ViewMenu, ViewMenuEntry};

/// Row index that stands for "every row" / "every node".
pub const ALL_SENTINEL: usize = 0;

/// What a visibility toggle applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityTarget {
    All,
    /// 1-based scene-tree node.
    Node(usize),
}

/// Every action a key sequence can resolve to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ToggleTool { action: String, label: String },
    /// 1-based index into the configured camera views.
    SetCameraView(usize),
    ToggleViewOption { action: String, label: String },
    ToggleGridPlane(Axis),
    ToggleUnit,
    CyclePrecision,
    ToggleFeet,
    YankPrimary,
    /// 1-based panel row.
    YankRow(usize),
    YankRowAxis(usize, Axis),
    YankTable,
    ToggleVisibility(VisibilityTarget),
}

impl Command {
    /// `yank-row(n)`, with the all-rows sentinel meaning the whole table.
    pub fn yank_row(index: usize) -> Self {
        if index == ALL_SENTINEL {
            Self::YankTable
        } else {
            Self::YankRow(index)
        }
    }

    pub fn toggle_visibility(index: usize) -> Self {
        if index == ALL_SENTINEL {
            Self::ToggleVisibility(VisibilityTarget::All)
        } else {
            Self::ToggleVisibility(VisibilityTarget::Node(index))
        }
    }

    pub fn tool(action: impl Into<String>, label: impl Into<String>) -> Self {
        Self::ToggleTool {
            action: action.into(),
            label: label.into(),
        }
    }

    pub fn view_option(action: impl Into<String>, label: impl Into<String>) -> Self {
        Self::ToggleViewOption {
            action: action.into(),
            label: label.into(),
        }
    }

    /// Parse a builtin command name or `tool:<name>` as written in config.
    pub fn parse_binding_action(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(name) = text.strip_prefix("tool:") {
            return (!name.is_empty()).then(|| Self::tool(name, name));
        }
        match text {
            "toggle-unit" => Some(Self::ToggleUnit),
            "cycle-precision" => Some(Self::CyclePrecision),
            "toggle-feet" => Some(Self::ToggleFeet),
            "yank-primary" => Some(Self::YankPrimary),
            "yank-table" => Some(Self::YankTable),
            "toggle-all" => Some(Self::toggle_visibility(ALL_SENTINEL)),
            _ => None,
        }
    }

    /// Parse a `v`-menu action: `grid-plane:<axis>` or `option:<name>`.
    pub fn parse_view_action(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(axis) = text.strip_prefix("grid-plane:") {
            let mut chars = axis.chars();
            return match (chars.next().and_then(Axis::from_char), chars.next()) {
                (Some(axis), None) => Some(Self::ToggleGridPlane(axis)),
                _ => None,
            };
        }
        text.strip_prefix("option:")
            .filter(|name| !name.is_empty())
            .map(|name| Self::view_option(name, name))
    }

    /// Whether executing this command copies text.
    pub fn is_yank(&self) -> bool {
        matches!(
            self,
            Self::YankPrimary | Self::YankRow(_) | Self::YankRowAxis(..) | Self::YankTable
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToggleTool { action, .. } => write!(f, "toggle-tool({action})"),
            Self::SetCameraView(n) => write!(f, "set-camera-view({n})"),
            Self::ToggleViewOption { action, .. } => write!(f, "toggle-view-option({action})"),
            Self::ToggleGridPlane(axis) => write!(f, "toggle-grid-plane({axis})"),
            Self::ToggleUnit => write!(f, "toggle-unit"),
            Self::CyclePrecision => write!(f, "cycle-precision"),
            Self::ToggleFeet => write!(f, "toggle-feet"),
            Self::YankPrimary => write!(f, "yank-primary"),
            Self::YankRow(n) => write!(f, "yank-row({n})"),
            Self::YankRowAxis(n, axis) => write!(f, "yank-row-axis({n}, {axis})"),
            Self::YankTable => write!(f, "yank-table"),
            Self::ToggleVisibility(VisibilityTarget::All) => write!(f, "toggle-visibility(all)"),
            Self::ToggleVisibility(VisibilityTarget::Node(n)) => {
                write!(f, "toggle-visibility({n})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn zero_index_means_everything() {
        assert_eq!(Command::yank_row(0), Command::YankTable);
        assert_eq!(Command::yank_row(2), Command::YankRow(2));
        assert_eq!(
            Command::toggle_visibility(0),
            Command::ToggleVisibility(VisibilityTarget::All)
        );
        assert_eq!(
            Command::toggle_visibility(4),
            Command::ToggleVisibility(VisibilityTarget::Node(4))
        );
    }

    #[test_case("toggle-unit", Some(Command::ToggleUnit))]
    #[test_case(" cycle-precision ", Some(Command::CyclePrecision))]
    #[test_case("toggle-feet", Some(Command::ToggleFeet))]
    #[test_case("tool:measure", Some(Command::tool("measure", "measure")))]
    #[test_case("tool:", None)]
    #[test_case("launch-rockets", None)]
    fn parses_binding_actions(text: &str, expected: Option<Command>) {
        assert_eq!(Command::parse_binding_action(text), expected);
    }

    #[test_case("grid-plane:x", Some(Command::ToggleGridPlane(Axis::X)))]
    #[test_case("grid-plane:z", Some(Command::ToggleGridPlane(Axis::Z)))]
    #[test_case("grid-plane:xy", None)]
    #[test_case("grid-plane:w", None)]
    #[test_case("option:edges", Some(Command::view_option("edges", "edges")))]
    #[test_case("option:", None)]
    #[test_case("edges", None)]
    fn parses_view_actions(text: &str, expected: Option<Command>) {
        assert_eq!(Command::parse_view_action(text), expected);
    }

    #[test]
    fn display_names_follow_command_grammar() {
        assert_eq!(Command::YankRowAxis(3, Axis::X).to_string(), "yank-row-axis(3, x)");
        assert_eq!(Command::YankRow(2).to_string(), "yank-row(2)");
        assert_eq!(
            Command::toggle_visibility(0).to_string(),
            "toggle-visibility(all)"
        );
        assert_eq!(Command::SetCameraView(3).to_string(), "set-camera-view(3)");
    }

    #[test]
    fn yank_family_is_recognized() {
        assert!(Command::YankPrimary.is_yank());
        assert!(Command::YankRowAxis(1, Axis::Y).is_yank());
        assert!(!Command::ToggleUnit.is_yank());
    }
}
