//! Point-in-time view of the measurement panel.
//!
//! Both the reconcile pass and the yank commands walk the panel the same
//! way, so the row/cell discovery lives here once.

use crate::{CellRef, PanelHost, RowRef, VectorCells};

/// The value cells of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowValue {
    Scalar(CellRef),
    Vector(VectorCells),
    /// Row exists but exposes no value cell (section headers and the like).
    Empty,
}

/// One panel row as seen during a single pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelRow {
    pub row: RowRef,
    pub label: String,
    pub value: RowValue,
    /// Angle rows are never unit-converted.
    pub angle: bool,
}

/// A cell plus the row flag the synchronizer needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelCell {
    pub cell: CellRef,
    pub angle: bool,
}

impl PanelRow {
    pub fn cells(&self) -> Vec<CellRef> {
        match self.value {
            RowValue::Scalar(cell) => vec![cell],
            RowValue::Vector(cells) => cells.cells().to_vec(),
            RowValue::Empty => Vec::new(),
        }
    }
}

/// Whether a row label names an angular measurement.
pub fn is_angle_label(label: &str) -> bool {
    label.to_lowercase().contains("angle")
}

/// Read every visible row from the host, in display order.
pub fn snapshot(host: &impl PanelHost) -> Vec<PanelRow> {
    host.visible_rows()
        .into_iter()
        .map(|row| {
            let label = host.row_label(row);
            let value = if host.row_has_vector_value(row) {
                host.row_vector_cells(row).map(RowValue::Vector)
            } else {
                host.row_scalar_cell(row).map(RowValue::Scalar)
            };
            PanelRow {
                row,
                angle: is_angle_label(&label),
                label,
                value: value.unwrap_or(RowValue::Empty),
            }
        })
        .collect()
}

/// Flatten a snapshot into the cells it displays.
pub fn cells(rows: &[PanelRow]) -> Vec<PanelCell> {
    rows.iter()
        .flat_map(|row| {
            row.cells().into_iter().map(move |cell| PanelCell {
                cell,
                angle: row.angle,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryHost;
    use pretty_assertions::assert_eq;

    #[test]
    fn snapshot_reads_rows_in_order() {
        let mut host = MemoryHost::new();
        let length = host.push_scalar_row("Length", "12.7");
        let [x, y, z] = host.push_vector_row("Center", ["1", "2", "3"]);
        host.push_scalar_row("Angle", "45°");

        let rows = snapshot(&host);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].label, "Length");
        assert_eq!(rows[0].value, RowValue::Scalar(length));
        assert_eq!(rows[1].value, RowValue::Vector(VectorCells { x, y, z }));
        assert!(rows[2].angle);
        assert!(!rows[0].angle);
    }

    #[test]
    fn cells_carry_angle_flag() {
        let mut host = MemoryHost::new();
        host.push_vector_row("Delta", ["1", "2", "3"]);
        let angle = host.push_scalar_row("Dihedral angle", "90°");

        let flattened = cells(&snapshot(&host));
        assert_eq!(flattened.len(), 4);
        assert_eq!(
            flattened.last(),
            Some(&PanelCell {
                cell: angle,
                angle: true
            })
        );
        assert!(flattened[..3].iter().all(|c| !c.angle));
    }

    #[test]
    fn row_without_cells_is_empty() {
        let mut host = MemoryHost::new();
        host.push_header_row("Selection");
        let rows = snapshot(&host);
        assert_eq!(rows[0].value, RowValue::Empty);
        assert!(rows[0].cells().is_empty());
    }

    #[test]
    fn angle_label_detection_is_case_insensitive() {
        assert!(is_angle_label("ANGLE"));
        assert!(is_angle_label("Angle between faces"));
        assert!(!is_angle_label("Distance"));
    }
}
