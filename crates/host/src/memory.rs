//! In-memory host.
//!
//! Backs the `keylayer` demo binary (loaded from a JSON fixture) and the
//! test suites across the workspace. Writes made through [`CellText`] are
//! counted; writes made through [`MemoryHost::overwrite`] model the host
//! changing a cell behind keylayer's back and are not.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::panel::RowValue;
use crate::{
    ActionHost, CellRef, CellText, Clipboard, ClipboardError, Invocation, Notifier, PanelHost,
    Prompt, PromptSurface, RowRef, SceneTree, VectorCells,
};

/// One panel row in a fixture file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct FixtureRow {
    pub label: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub vector: Option<[String; 3]>,
}

/// Initial host state for the demo binary.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct Fixture {
    pub rows: Vec<FixtureRow>,
    /// Toggle actions (start inactive).
    pub toggles: Vec<String>,
    /// Stateless actions such as camera views.
    pub commands: Vec<String>,
    /// Number of scene-tree nodes (all start visible).
    pub nodes: usize,
}

struct MemoryRow {
    row: RowRef,
    label: String,
    value: RowValue,
}

/// A host whose panel, actions and scene tree live in plain collections.
#[derive(Default)]
pub struct MemoryHost {
    rows: Vec<MemoryRow>,
    cells: FxHashMap<CellRef, String>,
    actions: FxHashMap<String, Option<bool>>,
    nodes: Vec<bool>,
    next_id: u64,
    writes: usize,
    invoked: Vec<String>,
    notifications: Vec<(String, bool)>,
    prompt: Option<Prompt>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: &Fixture) -> Self {
        let mut host = Self::new();
        for row in &fixture.rows {
            match (&row.vector, &row.value) {
                (Some([x, y, z]), _) => {
                    host.push_vector_row(&row.label, [x.as_str(), y.as_str(), z.as_str()]);
                }
                (None, Some(value)) => {
                    host.push_scalar_row(&row.label, value);
                }
                (None, None) => {
                    host.push_header_row(&row.label);
                }
            }
        }
        for id in &fixture.toggles {
            host.add_toggle(id, false);
        }
        for id in &fixture.commands {
            host.add_command(id);
        }
        host.set_node_count(fixture.nodes);
        host
    }

    fn next_ref(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn new_cell(&mut self, text: &str) -> CellRef {
        let cell = CellRef(self.next_ref());
        self.cells.insert(cell, text.to_string());
        cell
    }

    pub fn push_scalar_row(&mut self, label: &str, text: &str) -> CellRef {
        let row = RowRef(self.next_ref());
        let cell = self.new_cell(text);
        self.rows.push(MemoryRow {
            row,
            label: label.to_string(),
            value: RowValue::Scalar(cell),
        });
        cell
    }

    pub fn push_vector_row(&mut self, label: &str, texts: [&str; 3]) -> [CellRef; 3] {
        let row = RowRef(self.next_ref());
        let [x, y, z] = texts.map(|text| self.new_cell(text));
        self.rows.push(MemoryRow {
            row,
            label: label.to_string(),
            value: RowValue::Vector(VectorCells { x, y, z }),
        });
        [x, y, z]
    }

    pub fn push_header_row(&mut self, label: &str) -> RowRef {
        let row = RowRef(self.next_ref());
        self.rows.push(MemoryRow {
            row,
            label: label.to_string(),
            value: RowValue::Empty,
        });
        row
    }

    /// Drop the row at display position `index` together with its cells.
    pub fn remove_row(&mut self, index: usize) {
        if index >= self.rows.len() {
            return;
        }
        let removed = self.rows.remove(index);
        let cells = match removed.value {
            RowValue::Scalar(cell) => vec![cell],
            RowValue::Vector(cells) => cells.cells().to_vec(),
            RowValue::Empty => Vec::new(),
        };
        for cell in cells {
            self.cells.remove(&cell);
        }
    }

    pub fn clear_rows(&mut self) {
        self.rows.clear();
        self.cells.clear();
    }

    pub fn add_toggle(&mut self, action_id: &str, active: bool) {
        self.actions.insert(action_id.to_string(), Some(active));
    }

    pub fn add_command(&mut self, action_id: &str) {
        self.actions.insert(action_id.to_string(), None);
    }

    pub fn set_node_count(&mut self, count: usize) {
        self.nodes = vec![true; count];
    }

    /// Change a cell the way the host itself would, outside keylayer.
    pub fn overwrite(&mut self, cell: CellRef, text: &str) {
        if let Some(slot) = self.cells.get_mut(&cell) {
            *slot = text.to_string();
        }
    }

    pub fn text(&self, cell: CellRef) -> Option<&str> {
        self.cells.get(&cell).map(String::as_str)
    }

    /// Number of writes made through [`CellText::write_text`].
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn invoked(&self) -> &[String] {
        &self.invoked
    }

    pub fn toggle_state(&self, action_id: &str) -> Option<bool> {
        self.actions.get(action_id).copied().flatten()
    }

    pub fn node_visible(&self, index: usize) -> Option<bool> {
        index
            .checked_sub(1)
            .and_then(|i| self.nodes.get(i))
            .copied()
    }

    pub fn notifications(&self) -> &[(String, bool)] {
        &self.notifications
    }

    pub fn last_notification(&self) -> Option<&(String, bool)> {
        self.notifications.last()
    }

    pub fn take_notifications(&mut self) -> Vec<(String, bool)> {
        std::mem::take(&mut self.notifications)
    }

    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }
}

impl ActionHost for MemoryHost {
    fn invoke(&mut self, action_id: &str) -> Invocation {
        let Some(state) = self.actions.get_mut(action_id) else {
            return Invocation::not_found();
        };
        if let Some(active) = state.as_mut() {
            *active = !*active;
        }
        let after = *state;
        self.invoked.push(action_id.to_string());
        Invocation::invoked(after)
    }
}

impl PanelHost for MemoryHost {
    fn visible_rows(&self) -> Vec<RowRef> {
        self.rows.iter().map(|row| row.row).collect()
    }

    fn row_label(&self, row: RowRef) -> String {
        self.rows
            .iter()
            .find(|r| r.row == row)
            .map(|r| r.label.clone())
            .unwrap_or_default()
    }

    fn row_has_vector_value(&self, row: RowRef) -> bool {
        self.rows
            .iter()
            .any(|r| r.row == row && matches!(r.value, RowValue::Vector(_)))
    }

    fn row_scalar_cell(&self, row: RowRef) -> Option<CellRef> {
        self.rows.iter().find(|r| r.row == row).and_then(|r| match r.value {
            RowValue::Scalar(cell) => Some(cell),
            _ => None,
        })
    }

    fn row_vector_cells(&self, row: RowRef) -> Option<VectorCells> {
        self.rows.iter().find(|r| r.row == row).and_then(|r| match r.value {
            RowValue::Vector(cells) => Some(cells),
            _ => None,
        })
    }
}

impl CellText for MemoryHost {
    fn read_text(&self, cell: CellRef) -> Option<String> {
        self.cells.get(&cell).cloned()
    }

    fn write_text(&mut self, cell: CellRef, text: &str) -> bool {
        match self.cells.get_mut(&cell) {
            Some(slot) => {
                *slot = text.to_string();
                self.writes += 1;
                true
            }
            None => false,
        }
    }
}

impl SceneTree for MemoryHost {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn toggle_node(&mut self, index: usize) -> Option<bool> {
        let node = self.nodes.get_mut(index.checked_sub(1)?)?;
        *node = !*node;
        Some(*node)
    }

    fn toggle_all(&mut self) -> Option<bool> {
        if self.nodes.is_empty() {
            return None;
        }
        let show = !self.nodes.iter().any(|visible| *visible);
        self.nodes.iter_mut().for_each(|visible| *visible = show);
        Some(show)
    }
}

impl Notifier for MemoryHost {
    fn notify(&mut self, message: &str, positive: bool) {
        tracing::debug!(positive, "notify: {}", message);
        self.notifications.push((message.to_string(), positive));
    }
}

impl PromptSurface for MemoryHost {
    fn show_prompt(&mut self, prompt: &Prompt) {
        self.prompt = Some(prompt.clone());
    }

    fn hide_prompt(&mut self) {
        self.prompt = None;
    }
}

#[derive(Default)]
struct ClipboardState {
    history: Vec<String>,
    failing: bool,
}

/// Clipboard that records every successful write.
#[derive(Clone, Default)]
pub struct MemoryClipboard {
    state: Arc<Mutex<ClipboardState>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail with [`ClipboardError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    pub fn contents(&self) -> Option<String> {
        self.state.lock().history.last().cloned()
    }

    pub fn history(&self) -> Vec<String> {
        self.state.lock().history.clone()
    }

    fn store(state: &Mutex<ClipboardState>, text: String) -> Result<(), ClipboardError> {
        let mut state = state.lock();
        if state.failing {
            return Err(ClipboardError::Unavailable);
        }
        state.history.push(text);
        Ok(())
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: String) -> impl Future<Output = Result<(), ClipboardError>> + Send {
        let state = Arc::clone(&self.state);
        async move { Self::store(&state, text) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn writes_are_counted_but_overwrites_are_not() {
        let mut host = MemoryHost::new();
        let cell = host.push_scalar_row("Length", "1.0");
        assert!(host.write_text(cell, "2.0"));
        host.overwrite(cell, "3.0");
        assert_eq!(host.write_count(), 1);
        assert_eq!(host.text(cell), Some("3.0"));
    }

    #[test]
    fn write_to_removed_cell_fails() {
        let mut host = MemoryHost::new();
        let cell = host.push_scalar_row("Length", "1.0");
        host.remove_row(0);
        assert!(!host.write_text(cell, "2.0"));
        assert_eq!(host.read_text(cell), None);
    }

    #[test]
    fn toggle_actions_report_state() {
        let mut host = MemoryHost::new();
        host.add_toggle("measure", false);
        host.add_command("view-top");
        assert_eq!(host.invoke("measure"), Invocation::invoked(Some(true)));
        assert_eq!(host.invoke("measure"), Invocation::invoked(Some(false)));
        assert_eq!(host.invoke("view-top"), Invocation::invoked(None));
        assert_eq!(host.invoke("missing"), Invocation::not_found());
        assert_eq!(host.invoked(), ["measure", "measure", "view-top"]);
    }

    #[test]
    fn scene_tree_toggles_are_one_based() {
        let mut host = MemoryHost::new();
        host.set_node_count(2);
        assert_eq!(host.toggle_node(0), None);
        assert_eq!(host.toggle_node(3), None);
        assert_eq!(host.toggle_node(2), Some(false));
        assert_eq!(host.toggle_all(), Some(false));
        assert_eq!(host.toggle_all(), Some(true));
        assert_eq!(host.node_visible(1), Some(true));
    }

    #[test]
    fn fixture_builds_panel() {
        let fixture: Fixture = serde_json::from_str(
            r#"{
                "rows": [
                    { "label": "Selection" },
                    { "label": "Length", "value": "25.4" },
                    { "label": "Center", "vector": ["1", "2", "3"] }
                ],
                "toggles": ["measure"],
                "commands": ["view-front"],
                "nodes": 4
            }"#,
        )
        .unwrap();
        let host = MemoryHost::from_fixture(&fixture);
        assert_eq!(host.visible_rows().len(), 3);
        assert_eq!(host.node_count(), 4);
        assert_eq!(host.toggle_state("measure"), Some(false));
        let rows = host.visible_rows();
        assert!(host.row_has_vector_value(rows[2]));
        assert_eq!(host.row_label(rows[1]), "Length");
    }

    #[test]
    fn clipboard_records_and_fails_on_demand() {
        let clipboard = MemoryClipboard::new();
        tokio_test::block_on(clipboard.write_text("12.700".into())).unwrap();
        assert_eq!(clipboard.contents().as_deref(), Some("12.700"));

        clipboard.set_failing(true);
        let result = tokio_test::block_on(clipboard.write_text("lost".into()));
        assert_eq!(result, Err(ClipboardError::Unavailable));
        assert_eq!(clipboard.history(), vec!["12.700".to_string()]);
    }
}
