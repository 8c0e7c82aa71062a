//! Canonical-value cache for host-rendered length cells.
//!
//! The host owns the measurement panel and may rewrite any cell at any
//! time. While inch mode is active keylayer rewrites those same cells, so
//! the cache remembers, per cell, the millimeter value it started from and
//! the exact text it last wrote. A cell whose text no longer matches what
//! we wrote was changed upstream and is re-captured from scratch.
//!
//! Entries are keyed by [`CellRef`]; cells that leave the panel are
//! dropped by [`ValueCache::sweep`] or explicitly via [`ValueCache::forget`].

use host::{CellRef, CellText, PanelCell};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};
use units::UnitPolicy;

#[derive(Debug, Clone, PartialEq)]
struct CachedCell {
    canonical_mm: f64,
    last_rendered: String,
}

/// What a single [`ValueCache::reconcile`] pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Length cells examined (angle cells excluded).
    pub visited: usize,
    /// Cells whose canonical value was read from displayed text this pass.
    pub captured: usize,
    /// Cached cells found changed by the host.
    pub foreign: usize,
    /// Cells whose text we replaced.
    pub written: usize,
    /// Angle, missing or non-numeric cells left alone.
    pub skipped: usize,
}

/// The best available value of a cell for copying.
#[derive(Debug, Clone, PartialEq)]
pub enum CellReading {
    /// Cached millimeter value, still matching what is displayed.
    Canonical(f64),
    /// Text as displayed (uncached, angle, or changed by the host).
    Displayed(String),
}

/// Per-cell canonical values with foreign-write detection.
#[derive(Debug, Default)]
pub struct ValueCache {
    entries: FxHashMap<CellRef, CachedCell>,
}

impl ValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn canonical(&self, cell: CellRef) -> Option<f64> {
        self.entries.get(&cell).map(|entry| entry.canonical_mm)
    }

    pub fn last_rendered(&self, cell: CellRef) -> Option<&str> {
        self.entries
            .get(&cell)
            .map(|entry| entry.last_rendered.as_str())
    }

    /// Bring every length cell in `cells` to its presentation under `policy`.
    ///
    /// A cell is written only when the presentation differs from what is
    /// on screen. Unconditional writes would wake the host's own change
    /// observers, which rewrite the cell, which we would rewrite again.
    pub fn reconcile(
        &mut self,
        host: &mut impl CellText,
        cells: &[PanelCell],
        policy: &UnitPolicy,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for &PanelCell { cell, angle } in cells {
            if angle {
                report.skipped += 1;
                continue;
            }
            report.visited += 1;

            let Some(displayed) = host.read_text(cell) else {
                self.entries.remove(&cell);
                report.skipped += 1;
                continue;
            };

            if self
                .entries
                .get(&cell)
                .is_some_and(|entry| entry.last_rendered != displayed)
            {
                debug!(?cell, %displayed, "cell changed by host, recapturing");
                self.entries.remove(&cell);
                report.foreign += 1;
            }

            let canonical_mm = match self.entries.get(&cell) {
                Some(entry) => entry.canonical_mm,
                None => match units::parse_millimeters(&displayed) {
                    Some(value) => {
                        report.captured += 1;
                        value
                    }
                    None => {
                        trace!(?cell, %displayed, "not a convertible value");
                        report.skipped += 1;
                        continue;
                    }
                },
            };

            let rendered = units::format(canonical_mm, policy);
            if rendered != displayed {
                if !host.write_text(cell, &rendered) {
                    self.entries.remove(&cell);
                    report.skipped += 1;
                    continue;
                }
                report.written += 1;
            }

            self.entries.insert(
                cell,
                CachedCell {
                    canonical_mm,
                    last_rendered: rendered,
                },
            );
        }

        if report.written > 0 || report.foreign > 0 {
            debug!(?report, %policy, "reconciled panel");
        }
        report
    }

    /// Return every cached cell to plain millimeters and empty the cache.
    ///
    /// Cells the host has changed since our last write keep the host's
    /// text. Returns the number of cells written.
    pub fn restore(&mut self, host: &mut impl CellText) -> usize {
        let mut restored = 0;
        for (cell, entry) in std::mem::take(&mut self.entries) {
            let Some(displayed) = host.read_text(cell) else {
                continue;
            };
            if displayed != entry.last_rendered {
                continue;
            }
            let native = units::format_millimeters(entry.canonical_mm);
            if native != displayed && host.write_text(cell, &native) {
                restored += 1;
            }
        }
        debug!(restored, "restored cells to millimeters");
        restored
    }

    /// Removal hook for a cell the host has destroyed.
    pub fn forget(&mut self, cell: CellRef) -> bool {
        self.entries.remove(&cell).is_some()
    }

    /// Drop entries for cells not present in `live`. Returns how many went.
    pub fn sweep(&mut self, live: &[PanelCell]) -> usize {
        let live: FxHashSet<CellRef> = live.iter().map(|c| c.cell).collect();
        let before = self.entries.len();
        self.entries.retain(|cell, _| live.contains(cell));
        let dropped = before - self.entries.len();
        if dropped > 0 {
            trace!(dropped, "swept vanished cells");
        }
        dropped
    }

    /// Canonical value if the cell still shows what we last wrote,
    /// otherwise its displayed text.
    pub fn reading(&self, host: &impl CellText, cell: CellRef) -> Option<CellReading> {
        let displayed = host.read_text(cell)?;
        match self.entries.get(&cell) {
            Some(entry) if entry.last_rendered == displayed => {
                Some(CellReading::Canonical(entry.canonical_mm))
            }
            _ => Some(CellReading::Displayed(displayed.trim().to_string())),
        }
    }
}
