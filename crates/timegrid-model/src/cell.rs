use serde::{Deserialize, Serialize};

use crate::record::TimeRecord;
use crate::OperatorId;

/// Hard ceiling on the summed hours of one calendar day, all columns included.
pub const DAY_HOUR_CEILING: f64 = 24.0;

/// A single (date, work-type) work-hour entry.
///
/// `hours == 0.0` means "empty". The `original_*` fields snapshot the values
/// as last known to the server; they exist only for diffing and are never
/// shown to the user.
///
/// `Cell` is `Copy`: reads hand out values, not references, so the matrix can
/// replace its contents wholesale on a re-seed without dangling borrows.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Current local value.
    #[serde(default)]
    pub hours: f64,

    /// Operator credited with the hours; mandatory whenever `hours > 0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<OperatorId>,

    /// Backing server record, if one exists. The cell is "persisted" exactly
    /// when this is `Some`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<crate::RecordId>,

    /// Server-side hours at the last fetch.
    #[serde(default)]
    pub original_hours: f64,

    /// Server-side assignee at the last fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_assignee: Option<OperatorId>,
}

impl Default for Cell {
    fn default() -> Self {
        Self::empty(None)
    }
}

impl Cell {
    /// A fresh, unpersisted cell carrying the column's default assignee.
    pub fn empty(default_assignee: Option<OperatorId>) -> Self {
        Self {
            hours: 0.0,
            assignee: default_assignee,
            record_id: None,
            original_hours: 0.0,
            original_assignee: None,
        }
    }

    /// A cell seeded from an authoritative server record.
    pub fn from_record(record: &TimeRecord) -> Self {
        Self {
            hours: record.hours,
            assignee: record.assignee,
            record_id: Some(record.id),
            original_hours: record.hours,
            original_assignee: record.assignee,
        }
    }

    /// Whether a server record backs this cell.
    pub fn is_persisted(self) -> bool {
        self.record_id.is_some()
    }

    /// True when the cell differs from the last known server state.
    ///
    /// A brand-new cell with `hours > 0` is always dirty (its snapshot is
    /// zero). Assignee changes only count for persisted cells.
    pub fn is_dirty(self) -> bool {
        self.hours != self.original_hours
            || (self.is_persisted() && self.assignee != self.original_assignee)
    }

    /// Hours counted toward day totals in ceiling checks: the in-memory
    /// value for dirty cells, the authoritative server value otherwise.
    pub fn effective_hours(self) -> f64 {
        if self.is_dirty() {
            self.hours
        } else {
            self.original_hours
        }
    }

    /// Apply a user edit in place.
    ///
    /// `assignee == None` keeps the current assignee; a previously empty cell
    /// with no assignee of its own falls back to `column_default`.
    pub fn apply_edit(
        &mut self,
        hours: f64,
        assignee: Option<OperatorId>,
        column_default: Option<OperatorId>,
    ) {
        let was_empty = self.hours == 0.0 && !self.is_dirty();
        self.hours = normalize_hours(hours);
        match assignee {
            Some(id) => self.assignee = Some(id),
            None if was_empty && self.assignee.is_none() => self.assignee = column_default,
            None => {}
        }
    }
}

/// Parse raw grid input into an hour count.
///
/// Blank or unparsable input normalizes to `0.0` (an empty cell); fractional
/// values pass through verbatim. A comma decimal separator is accepted
/// alongside the dot.
pub fn parse_hours(input: &str) -> f64 {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.replace(',', ".").parse::<f64>() {
        Ok(value) => normalize_hours(value),
        Err(_) => 0.0,
    }
}

/// Clamp a raw numeric value to a storable hour count.
///
/// Non-finite and negative values collapse to `0.0`.
pub(crate) fn normalize_hours(hours: f64) -> f64 {
    if hours.is_finite() && hours > 0.0 {
        hours
    } else {
        0.0
    }
}
