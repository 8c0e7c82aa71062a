//! Terminal front end for the in-memory host.
//!
//! Notifications, prompts and clipboard writes are printed to stdout; the
//! panel, actions and scene tree are a [`MemoryHost`].

use std::future::Future;
use std::io::Write;

use host::{
    ActionHost, CellRef, CellText, Clipboard, ClipboardError, Invocation, MemoryHost, Notifier,
    PanelHost, Prompt, PromptSurface, RowRef, SceneTree, VectorCells,
};

pub struct ConsoleHost {
    inner: MemoryHost,
}

impl ConsoleHost {
    pub fn new(inner: MemoryHost) -> Self {
        Self { inner }
    }

    /// Print every panel row as `label: text`.
    pub fn print_panel(&self) {
        for row in self.inner.visible_rows() {
            let label = self.inner.row_label(row);
            let texts: Vec<String> = match (
                self.inner.row_scalar_cell(row),
                self.inner.row_vector_cells(row),
            ) {
                (Some(cell), _) => self.inner.read_text(cell).into_iter().collect(),
                (None, Some(cells)) => cells
                    .cells()
                    .iter()
                    .filter_map(|cell| self.inner.read_text(*cell))
                    .collect(),
                (None, None) => Vec::new(),
            };
            println!("  {label}: {}", texts.join("  "));
        }
    }
}

impl ActionHost for ConsoleHost {
    fn invoke(&mut self, action_id: &str) -> Invocation {
        self.inner.invoke(action_id)
    }
}

impl PanelHost for ConsoleHost {
    fn visible_rows(&self) -> Vec<RowRef> {
        self.inner.visible_rows()
    }

    fn row_label(&self, row: RowRef) -> String {
        self.inner.row_label(row)
    }

    fn row_has_vector_value(&self, row: RowRef) -> bool {
        self.inner.row_has_vector_value(row)
    }

    fn row_scalar_cell(&self, row: RowRef) -> Option<CellRef> {
        self.inner.row_scalar_cell(row)
    }

    fn row_vector_cells(&self, row: RowRef) -> Option<VectorCells> {
        self.inner.row_vector_cells(row)
    }
}

impl CellText for ConsoleHost {
    fn read_text(&self, cell: CellRef) -> Option<String> {
        self.inner.read_text(cell)
    }

    fn write_text(&mut self, cell: CellRef, text: &str) -> bool {
        self.inner.write_text(cell, text)
    }
}

impl SceneTree for ConsoleHost {
    fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    fn toggle_node(&mut self, index: usize) -> Option<bool> {
        self.inner.toggle_node(index)
    }

    fn toggle_all(&mut self) -> Option<bool> {
        self.inner.toggle_all()
    }
}

impl Notifier for ConsoleHost {
    fn notify(&mut self, message: &str, positive: bool) {
        let mark = if positive { "ok" } else { "!!" };
        println!("[{mark}] {message}");
        self.inner.notify(message, positive);
    }
}

impl PromptSurface for ConsoleHost {
    fn show_prompt(&mut self, prompt: &Prompt) {
        let options: Vec<String> = prompt
            .options
            .iter()
            .map(|option| format!("{} {}", option.keys, option.label))
            .collect();
        println!("[{}] {}", prompt.title, options.join(" | "));
        self.inner.show_prompt(prompt);
    }

    fn hide_prompt(&mut self) {
        self.inner.hide_prompt();
    }
}

/// Clipboard that prints what it receives.
#[derive(Debug, Default)]
pub struct StdoutClipboard;

impl Clipboard for StdoutClipboard {
    fn write_text(&self, text: String) -> impl Future<Output = Result<(), ClipboardError>> + Send {
        async move {
            let mut out = std::io::stdout().lock();
            writeln!(out, "--- clipboard ---\n{text}\n-----------------")
                .map_err(|e| ClipboardError::Rejected(e.to_string()))
        }
    }
}
