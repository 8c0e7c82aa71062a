//! Interfaces the host viewer exposes to keylayer.
//!
//! keylayer never touches the host's scene. It reads and writes cell text,
//! invokes opaque actions by identifier, toggles scene-tree visibility and
//! talks to a handful of UI surfaces. Each of those is a trait here so the
//! interpreter and the cell synchronizer can run against any host,
//! including the in-memory one in [`memory`].

pub mod memory;
pub mod panel;

use std::fmt;
use std::future::Future;

pub use memory::{Fixture, FixtureRow, MemoryClipboard, MemoryHost};
pub use panel::{PanelCell, PanelRow, RowValue};

/// Identity of one displayed cell. Stable for as long as the host keeps
/// the underlying element alive; never a copy of its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef(pub u64);

/// Identity of one row in the measurement panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowRef(pub u64);

/// Vector component selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Self::X, Self::Y, Self::Z];

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'x' => Some(Self::X),
            'y' => Some(Self::Y),
            'z' => Some(Self::Z),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::X => 'x',
            Self::Y => 'y',
            Self::Z => 'z',
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// The three component cells of a vector-valued row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorCells {
    pub x: CellRef,
    pub y: CellRef,
    pub z: CellRef,
}

impl VectorCells {
    pub fn get(&self, axis: Axis) -> CellRef {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn cells(&self) -> [CellRef; 3] {
        [self.x, self.y, self.z]
    }
}

/// Result of invoking a host action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    /// Whether the action identifier resolved to something invokable.
    pub found: bool,
    /// Post-invocation toggle state, when the host exposes one.
    pub active_after: Option<bool>,
}

impl Invocation {
    pub const fn not_found() -> Self {
        Self {
            found: false,
            active_after: None,
        }
    }

    pub const fn invoked(active_after: Option<bool>) -> Self {
        Self {
            found: true,
            active_after,
        }
    }
}

/// Opaque host actions (tool toggles, camera views, view options).
pub trait ActionHost {
    fn invoke(&mut self, action_id: &str) -> Invocation;
}

/// Read access to the measurement panel.
pub trait PanelHost {
    /// Currently visible rows, in display order.
    fn visible_rows(&self) -> Vec<RowRef>;
    fn row_label(&self, row: RowRef) -> String;
    fn row_has_vector_value(&self, row: RowRef) -> bool;
    fn row_scalar_cell(&self, row: RowRef) -> Option<CellRef>;
    fn row_vector_cells(&self, row: RowRef) -> Option<VectorCells>;
}

/// Text access to individual cells.
pub trait CellText {
    /// Current displayed text, or `None` if the cell no longer exists.
    fn read_text(&self, cell: CellRef) -> Option<String>;
    /// Replace the displayed text. Returns `false` if the cell is gone.
    fn write_text(&mut self, cell: CellRef, text: &str) -> bool;
}

/// Visibility toggles over the host's scene tree.
pub trait SceneTree {
    /// Number of top-level nodes currently available.
    fn node_count(&self) -> usize;
    /// Toggle the 1-based node `index`; returns its visibility afterwards.
    fn toggle_node(&mut self, index: usize) -> Option<bool>;
    /// Toggle every node; returns the resulting visibility when uniform.
    fn toggle_all(&mut self) -> Option<bool>;
}

/// Toast-style notification surface. Fire-and-forget.
pub trait Notifier {
    fn notify(&mut self, message: &str, positive: bool);
}

/// One entry of a which-key prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOption {
    pub keys: String,
    pub label: String,
}

impl PromptOption {
    pub fn new(keys: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            keys: keys.into(),
            label: label.into(),
        }
    }
}

/// Transient overlay listing the keys valid in a partial sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub title: String,
    pub options: Vec<PromptOption>,
}

/// Renders which-key prompts. The core only decides when and what.
pub trait PromptSurface {
    fn show_prompt(&mut self, prompt: &Prompt);
    fn hide_prompt(&mut self);
}

/// Everything the controller needs from the host apart from the clipboard.
pub trait Host: ActionHost + PanelHost + CellText + SceneTree + Notifier + PromptSurface {}

impl<T> Host for T where
    T: ActionHost + PanelHost + CellText + SceneTree + Notifier + PromptSurface
{
}

/// Clipboard write failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard is not available")]
    Unavailable,
    #[error("clipboard write rejected: {0}")]
    Rejected(String),
}

/// Asynchronous clipboard collaborator.
///
/// Writes run on the event loop as spawned tasks, so implementations must
/// be shareable and their futures `Send`.
pub trait Clipboard: Send + Sync + 'static {
    fn write_text(&self, text: String) -> impl Future<Output = Result<(), ClipboardError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn axis_round_trips_through_char() {
        for axis in Axis::ALL {
            assert_eq!(Axis::from_char(axis.as_char()), Some(axis));
        }
        assert_eq!(Axis::from_char('w'), None);
    }

    #[test]
    fn vector_cells_select_by_axis() {
        let cells = VectorCells {
            x: CellRef(1),
            y: CellRef(2),
            z: CellRef(3),
        };
        assert_eq!(cells.get(Axis::Y), CellRef(2));
        assert_eq!(cells.cells(), [CellRef(1), CellRef(2), CellRef(3)]);
    }
}
