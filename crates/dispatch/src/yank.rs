//! Text produced by the yank command family.

use cell_cache::{CellReading, ValueCache};
use host::{Axis, CellRef, CellText, PanelRow, RowValue};
use tracing::debug;
use units::UnitPolicy;

use crate::DispatchError;

fn cell_text(
    cache: &ValueCache,
    host: &impl CellText,
    policy: &UnitPolicy,
    cell: CellRef,
) -> Result<String, DispatchError> {
    match cache.reading(host, cell) {
        Some(CellReading::Canonical(mm)) => Ok(units::format(mm, policy)),
        Some(CellReading::Displayed(text)) => Ok(text),
        None => Err(DispatchError::NotReady("Panel cell".to_string())),
    }
}

/// Values of one row; vector components are tab separated.
pub fn row_text(
    cache: &ValueCache,
    host: &impl CellText,
    policy: &UnitPolicy,
    rows: &[PanelRow],
    index: usize,
) -> Result<String, DispatchError> {
    let row = nth_row(rows, index)?;
    value_text(cache, host, policy, row)?.ok_or(DispatchError::NotConvertible(index))
}

pub fn axis_text(
    cache: &ValueCache,
    host: &impl CellText,
    policy: &UnitPolicy,
    rows: &[PanelRow],
    index: usize,
    axis: Axis,
) -> Result<String, DispatchError> {
    match nth_row(rows, index)?.value {
        RowValue::Vector(cells) => cell_text(cache, host, policy, cells.get(axis)),
        _ => Err(DispatchError::NoVectorValue(index)),
    }
}

/// First row that shows a value. Rows whose cells went away are skipped.
pub fn primary_text(
    cache: &ValueCache,
    host: &impl CellText,
    policy: &UnitPolicy,
    rows: &[PanelRow],
) -> Result<String, DispatchError> {
    for row in rows {
        match value_text(cache, host, policy, row) {
            Ok(Some(text)) => return Ok(text),
            Ok(None) => {}
            Err(e) => debug!(label = %row.label, "skipping row for primary value: {e}"),
        }
    }
    Err(DispatchError::NoRows)
}

/// One `label<TAB>values` line per row.
pub fn table_text(
    cache: &ValueCache,
    host: &impl CellText,
    policy: &UnitPolicy,
    rows: &[PanelRow],
) -> Result<String, DispatchError> {
    if rows.is_empty() {
        return Err(DispatchError::NoRows);
    }
    let mut lines = Vec::with_capacity(rows.len());
    for row in rows {
        match value_text(cache, host, policy, row)? {
            Some(values) => lines.push(format!("{}\t{}", row.label, values)),
            None => lines.push(row.label.clone()),
        }
    }
    Ok(lines.join("\n"))
}

fn nth_row(rows: &[PanelRow], index: usize) -> Result<&PanelRow, DispatchError> {
    index
        .checked_sub(1)
        .and_then(|i| rows.get(i))
        .ok_or_else(|| DispatchError::out_of_range("Row", index, rows.len()))
}

fn value_text(
    cache: &ValueCache,
    host: &impl CellText,
    policy: &UnitPolicy,
    row: &PanelRow,
) -> Result<Option<String>, DispatchError> {
    match row.value {
        RowValue::Scalar(cell) => cell_text(cache, host, policy, cell).map(Some),
        RowValue::Vector(cells) => {
            let parts = cells
                .cells()
                .into_iter()
                .map(|cell| cell_text(cache, host, policy, cell))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(parts.join("\t")))
        }
        RowValue::Empty => Ok(None),
    }
}
