use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{Cell, TimeMatrix, ViewWindow, WorkTypeId};

/// Render payload for the visible part of the grid.
///
/// A pure projection of `(matrix, window)`: computing it mutates nothing and
/// discarding it loses nothing. Totals reflect what the user currently sees
/// (local `hours`, dirty or not), not what is saved.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GridProjection {
    /// Window-restricted cells, keyed date → work-type.
    pub cells: BTreeMap<NaiveDate, BTreeMap<WorkTypeId, Cell>>,
    /// Per-date hour totals across all columns.
    pub day_totals: BTreeMap<NaiveDate, f64>,
    /// Per-column hour totals across the window's dates.
    pub column_totals: BTreeMap<WorkTypeId, f64>,
    /// Sum over the whole window.
    pub grand_total: f64,
}

impl TimeMatrix {
    /// Compute the visible subset of the grid and its totals for `window`.
    pub fn project(&self, window: &ViewWindow) -> GridProjection {
        let mut projection = GridProjection::default();
        for column in self.columns() {
            projection.column_totals.insert(column.work_type.id, 0.0);
        }

        for (date, work_type_id, cell) in self.iter() {
            if !window.contains(date) {
                continue;
            }
            projection
                .cells
                .entry(date)
                .or_default()
                .insert(work_type_id, *cell);
            *projection.day_totals.entry(date).or_insert(0.0) += cell.hours;
            *projection
                .column_totals
                .entry(work_type_id)
                .or_insert(0.0) += cell.hours;
            projection.grand_total += cell.hours;
        }
        projection
    }
}
