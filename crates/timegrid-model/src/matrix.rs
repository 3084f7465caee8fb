use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cell::{normalize_hours, DAY_HOUR_CEILING};
use crate::{Cell, OperatorId, TimeRecord, WorkType, WorkTypeId};

/// A work-type column of the grid plus its editing defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub work_type: WorkType,
    /// Operator pre-assigned to freshly entered cells in this column.
    pub default_assignee: Option<OperatorId>,
}

/// Rejected edit: the day's summed hours would exceed [`DAY_HOUR_CEILING`].
///
/// Carries the figures needed for a precise user-facing message, e.g.
/// "current total 20.5h, attempted 5h".
#[derive(Clone, Debug, PartialEq, Error)]
#[error(
    "day {date}: current total {day_total}h, attempted {attempted}h exceeds the {}h ceiling",
    DAY_HOUR_CEILING
)]
pub struct CeilingExceeded {
    pub date: NaiveDate,
    /// Effective day total before the edit, the edited column included.
    pub day_total: f64,
    /// The proposed new value for the edited column.
    pub attempted: f64,
}

/// Errors raised when (re)seeding the matrix.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SeedError {
    #[error("year {0} is outside the supported calendar range")]
    InvalidYear(i32),
}

/// Counts describing what a [`TimeMatrix::seed`] pass did with its input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Records overlaid onto the dense domain.
    pub applied: usize,
    /// Records referencing an unsupported work-type, skipped.
    pub unknown_work_type: usize,
    /// Records dated outside the seeded year, skipped.
    pub out_of_year: usize,
    /// Dirty local cells that survived the re-seed.
    pub preserved_edits: usize,
}

/// Dense year × work-type store of [`Cell`]s.
///
/// The matrix spans the entire calendar year regardless of the visible
/// window, so unsaved edits survive view-mode switches. Every (date, column)
/// pair inside the seeded domain has an entry, which keeps day totals free of
/// missing-key reasoning.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeMatrix {
    year: Option<i32>,
    columns: Vec<Column>,
    cells: BTreeMap<NaiveDate, BTreeMap<WorkTypeId, Cell>>,
}

impl TimeMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// The seeded calendar year, if any.
    pub fn year(&self) -> Option<i32> {
        self.year
    }

    /// Supported columns, in display order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, work_type_id: WorkTypeId) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| column.work_type.id == work_type_id)
    }

    /// Rebuild the dense year × work-type domain from an authoritative
    /// snapshot.
    ///
    /// Cells matched by an input record are fully replaced by the server's
    /// values; dirty cells nothing overwrites are carried forward, so a
    /// re-seed after a partially failed save cannot drop unsaved work.
    /// Records referencing an unsupported work-type or a date outside `year`
    /// are skipped and counted, never stored.
    pub fn seed(
        &mut self,
        records: &[TimeRecord],
        work_types: &[WorkType],
        year: i32,
        default_assignee: Option<OperatorId>,
    ) -> Result<SeedReport, SeedError> {
        let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(SeedError::InvalidYear(year))?;

        let columns: Vec<Column> = work_types
            .iter()
            .cloned()
            .map(|work_type| Column {
                work_type,
                default_assignee,
            })
            .collect();

        let previous = std::mem::take(&mut self.cells);
        let mut cells: BTreeMap<NaiveDate, BTreeMap<WorkTypeId, Cell>> = BTreeMap::new();
        for date in first.iter_days().take_while(|date| date.year() == year) {
            let mut row = BTreeMap::new();
            for column in &columns {
                let id = column.work_type.id;
                let carried = previous
                    .get(&date)
                    .and_then(|previous_row| previous_row.get(&id))
                    .copied()
                    .filter(|cell| cell.is_dirty());
                row.insert(id, carried.unwrap_or_else(|| Cell::empty(column.default_assignee)));
            }
            cells.insert(date, row);
        }

        let mut report = SeedReport::default();
        for record in records {
            let Some(row) = cells.get_mut(&record.date) else {
                report.out_of_year += 1;
                continue;
            };
            let Some(slot) = row.get_mut(&record.work_type_id) else {
                report.unknown_work_type += 1;
                continue;
            };
            *slot = Cell::from_record(record);
            report.applied += 1;
        }

        // Overlaid cells are clean by construction, so what is dirty now is
        // exactly the carried-forward local edits.
        report.preserved_edits = cells
            .values()
            .flat_map(|row| row.values())
            .filter(|cell| cell.is_dirty())
            .count();

        self.year = Some(year);
        self.columns = columns;
        self.cells = cells;
        Ok(report)
    }

    /// Cell at `(date, work_type_id)`.
    ///
    /// Total: outside the seeded domain this returns the column-default empty
    /// cell instead of failing, so view code never handles misses.
    pub fn get(&self, date: NaiveDate, work_type_id: WorkTypeId) -> Cell {
        self.cells
            .get(&date)
            .and_then(|row| row.get(&work_type_id))
            .copied()
            .unwrap_or_else(|| Cell::empty(self.column_default(work_type_id)))
    }

    /// Apply a user edit to one cell, ceiling-checked.
    ///
    /// Either the full `(hours, assignee)` pair commits or the matrix is left
    /// untouched and the violation is returned for user-facing display. The
    /// check runs on every edit, not only at save time.
    pub fn edit(
        &mut self,
        date: NaiveDate,
        work_type_id: WorkTypeId,
        hours: f64,
        assignee: Option<OperatorId>,
    ) -> Result<(), CeilingExceeded> {
        let proposed = normalize_hours(hours);
        let others: f64 = self
            .cells
            .get(&date)
            .map(|row| {
                row.iter()
                    .filter(|(id, _)| **id != work_type_id)
                    .map(|(_, cell)| cell.effective_hours())
                    .sum()
            })
            .unwrap_or(0.0);

        if others + proposed > DAY_HOUR_CEILING {
            let current = self.get(date, work_type_id);
            return Err(CeilingExceeded {
                date,
                day_total: others + current.effective_hours(),
                attempted: proposed,
            });
        }

        let column_default = self.column_default(work_type_id);
        let row = self.cells.entry(date).or_default();
        let cell = row
            .entry(work_type_id)
            .or_insert_with(|| Cell::empty(column_default));
        cell.apply_edit(proposed, assignee, column_default);
        Ok(())
    }

    /// Add a column for a newly supported work-type, defaulting a fresh cell
    /// for every seeded date. No-op when the column already exists.
    pub fn add_work_type(&mut self, work_type: WorkType, default_assignee: Option<OperatorId>) {
        if self.column(work_type.id).is_some() {
            return;
        }
        let id = work_type.id;
        for row in self.cells.values_mut() {
            row.entry(id).or_insert_with(|| Cell::empty(default_assignee));
        }
        self.columns.push(Column {
            work_type,
            default_assignee,
        });
    }

    /// Effective hour total for a date across all columns.
    pub fn day_total(&self, date: NaiveDate) -> f64 {
        self.cells
            .get(&date)
            .map(|row| row.values().map(|cell| cell.effective_hours()).sum())
            .unwrap_or(0.0)
    }

    /// Iterate every (date, work-type, cell) triple in the seeded domain.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, WorkTypeId, &Cell)> + '_ {
        self.cells.iter().flat_map(|(date, row)| {
            row.iter().map(move |(id, cell)| (*date, *id, cell))
        })
    }

    /// Iterate only cells that differ from the server snapshot.
    pub fn dirty_cells(&self) -> impl Iterator<Item = (NaiveDate, WorkTypeId, &Cell)> + '_ {
        self.iter().filter(|(_, _, cell)| cell.is_dirty())
    }

    /// True when any cell holds an unsaved change.
    pub fn has_pending_changes(&self) -> bool {
        self.dirty_cells().next().is_some()
    }

    fn column_default(&self, work_type_id: WorkTypeId) -> Option<OperatorId> {
        self.column(work_type_id)
            .and_then(|column| column.default_assignee)
    }
}
