use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::{Cell, DeletionLedger, OperatorId, RecordId, TimeMatrix, WorkTypeId};

/// What the diff pass decided to do with one cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellIntent {
    /// In sync with the server; nothing to do.
    Keep,
    Create,
    Update,
    Delete,
}

impl CellIntent {
    /// Derive a cell's intent purely from its state and the ledger.
    ///
    /// A persisted cell cleared back to zero is a deletion even when the
    /// caller never touched the ledger; the explicit ledger mark covers the
    /// remaining cases (e.g. a record whose cell state was since replaced).
    pub fn of(cell: &Cell, ledger: &DeletionLedger) -> CellIntent {
        match cell.record_id {
            None if cell.hours > 0.0 => CellIntent::Create,
            None => CellIntent::Keep,
            Some(record_id) => {
                if cell.hours > 0.0 {
                    if cell.is_dirty() {
                        CellIntent::Update
                    } else {
                        CellIntent::Keep
                    }
                } else if cell.original_hours > 0.0 || ledger.contains(record_id) {
                    CellIntent::Delete
                } else {
                    CellIntent::Keep
                }
            }
        }
    }
}

/// Grid coordinate of a cell, for validation and failure reporting.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CellSlot {
    pub date: NaiveDate,
    pub work_type_id: WorkTypeId,
}

/// Save blocked before any network call: dirty cells with hours but no
/// assignee. Lists every offender at once rather than failing on the first.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{} cell(s) have hours but no assignee", .missing.len())]
pub struct MissingAssignees {
    pub missing: Vec<CellSlot>,
}

/// One persistence call the save engine will issue.
///
/// `Update` carries its grid slot alongside the record id so an operation
/// failure can be reported by cell, not only by server identifier.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SaveOperation {
    Create {
        date: NaiveDate,
        work_type_id: WorkTypeId,
        hours: f64,
        assignee: OperatorId,
    },
    Update {
        record_id: RecordId,
        date: NaiveDate,
        work_type_id: WorkTypeId,
        hours: f64,
        assignee: OperatorId,
    },
    Delete {
        record_id: RecordId,
    },
}

impl SaveOperation {
    /// Short human-oriented identification of the operation's target.
    pub fn describe(&self) -> String {
        match self {
            SaveOperation::Create {
                date, work_type_id, ..
            } => format!("create {date}/{work_type_id}"),
            SaveOperation::Update {
                date, work_type_id, ..
            } => format!("update {date}/{work_type_id}"),
            SaveOperation::Delete { record_id } => format!("delete record {record_id}"),
        }
    }
}

/// Ordered batch of operations needed to converge the server with the matrix.
///
/// Deletions come first so a replacement entry for the same slot cannot
/// collide with the stale record it displaces.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SavePlan {
    deletes: Vec<SaveOperation>,
    upserts: Vec<SaveOperation>,
    missing_assignees: Vec<CellSlot>,
}

impl SavePlan {
    /// Scan the full matrix domain plus the ledger and classify every entry.
    ///
    /// The scan covers the whole seeded year, never just a visible window:
    /// unsaved edits made in a previously visited window still count. Ledger
    /// marks are de-duplicated against implicit clear-to-zero deletions; a
    /// mark whose record the user has since re-filled is superseded by that
    /// cell's `Update` (the later intent wins).
    pub fn classify(matrix: &TimeMatrix, ledger: &DeletionLedger) -> SavePlan {
        let mut plan = SavePlan::default();
        let mut deleted: BTreeSet<RecordId> = BTreeSet::new();
        let mut updated: BTreeSet<RecordId> = BTreeSet::new();

        for (date, work_type_id, cell) in matrix.iter() {
            match CellIntent::of(cell, ledger) {
                CellIntent::Keep => {}
                CellIntent::Create | CellIntent::Update => {
                    let Some(assignee) = cell.assignee else {
                        plan.missing_assignees.push(CellSlot { date, work_type_id });
                        continue;
                    };
                    match cell.record_id {
                        None => plan.upserts.push(SaveOperation::Create {
                            date,
                            work_type_id,
                            hours: cell.hours,
                            assignee,
                        }),
                        Some(record_id) => {
                            updated.insert(record_id);
                            plan.upserts.push(SaveOperation::Update {
                                record_id,
                                date,
                                work_type_id,
                                hours: cell.hours,
                                assignee,
                            });
                        }
                    }
                }
                CellIntent::Delete => {
                    if let Some(record_id) = cell.record_id {
                        if deleted.insert(record_id) {
                            plan.deletes.push(SaveOperation::Delete { record_id });
                        }
                    }
                }
            }
        }

        for record_id in ledger.snapshot() {
            if updated.contains(&record_id) || !deleted.insert(record_id) {
                continue;
            }
            plan.deletes.push(SaveOperation::Delete { record_id });
        }

        plan
    }

    /// Deletions, in execution order.
    pub fn deletes(&self) -> &[SaveOperation] {
        &self.deletes
    }

    /// Creates and updates, executed after every deletion.
    pub fn upserts(&self) -> &[SaveOperation] {
        &self.upserts
    }

    /// All operations in execution order: deletes, then creates/updates.
    pub fn operations(&self) -> impl Iterator<Item = &SaveOperation> + '_ {
        self.deletes.iter().chain(self.upserts.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.upserts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.deletes.len() + self.upserts.len()
    }

    /// Reject the whole plan when any create/update lacks its mandatory
    /// assignee. Nothing may execute out of an invalid plan.
    pub fn validate(&self) -> Result<(), MissingAssignees> {
        if self.missing_assignees.is_empty() {
            Ok(())
        } else {
            Err(MissingAssignees {
                missing: self.missing_assignees.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use crate::{TimeRecord, WorkType};

    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn seeded(records: &[TimeRecord], columns: usize) -> (TimeMatrix, Vec<WorkType>) {
        let wts: Vec<WorkType> = (0..columns)
            .map(|i| WorkType::new(Uuid::new_v4(), format!("wt-{i}")))
            .collect();
        let mut matrix = TimeMatrix::new();
        matrix.seed(records, &wts, 2025, None).unwrap();
        (matrix, wts)
    }

    fn record(work_type_id: WorkTypeId, date: NaiveDate, hours: f64) -> TimeRecord {
        TimeRecord {
            id: Uuid::new_v4(),
            date,
            work_type_id,
            hours,
            assignee: Some(Uuid::new_v4()),
        }
    }

    #[test]
    fn clean_matrix_yields_an_empty_plan() {
        let seeded_record = record(Uuid::new_v4(), date(2, 2), 4.0);
        let (matrix, _) = seeded(&[seeded_record.clone()], 1);
        // The record refers to an unknown column and is skipped, so the
        // matrix is entirely clean.
        let plan = SavePlan::classify(&matrix, &DeletionLedger::new());
        assert!(plan.is_empty());
        assert_eq!(plan.len(), 0);
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn new_hours_classify_as_create() {
        let (mut matrix, wts) = seeded(&[], 1);
        let operator = Uuid::new_v4();
        matrix.edit(date(4, 2), wts[0].id, 6.0, Some(operator)).unwrap();

        let plan = SavePlan::classify(&matrix, &DeletionLedger::new());
        assert_eq!(
            plan.upserts(),
            &[SaveOperation::Create {
                date: date(4, 2),
                work_type_id: wts[0].id,
                hours: 6.0,
                assignee: operator,
            }]
        );
        assert!(plan.deletes().is_empty());
    }

    #[test]
    fn assignee_only_change_classifies_as_update() {
        let wt = Uuid::new_v4();
        let seeded_record = record(wt, date(2, 2), 5.0);
        let (mut matrix, wts) = {
            let wts = vec![WorkType::new(wt, "wt-0")];
            let mut matrix = TimeMatrix::new();
            matrix.seed(&[seeded_record.clone()], &wts, 2025, None).unwrap();
            (matrix, wts)
        };

        let new_operator = Uuid::new_v4();
        matrix
            .edit(date(2, 2), wts[0].id, 5.0, Some(new_operator))
            .unwrap();

        let plan = SavePlan::classify(&matrix, &DeletionLedger::new());
        assert_eq!(
            plan.upserts(),
            &[SaveOperation::Update {
                record_id: seeded_record.id,
                date: date(2, 2),
                work_type_id: wt,
                hours: 5.0,
                assignee: new_operator,
            }]
        );
    }

    #[test]
    fn clearing_a_persisted_cell_is_a_delete_with_or_without_the_ledger() {
        let wt = Uuid::new_v4();
        let seeded_record = record(wt, date(2, 2), 4.0);
        let wts = vec![WorkType::new(wt, "wt-0")];

        // Implicit: the caller only zeroed the cell.
        let mut implicit = TimeMatrix::new();
        implicit.seed(&[seeded_record.clone()], &wts, 2025, None).unwrap();
        implicit.edit(date(2, 2), wt, 0.0, None).unwrap();
        let implicit_plan = SavePlan::classify(&implicit, &DeletionLedger::new());

        // Explicit: the caller also marked the ledger.
        let mut ledger = DeletionLedger::new();
        ledger.mark(seeded_record.id);
        let explicit_plan = SavePlan::classify(&implicit, &ledger);

        let expected = vec![SaveOperation::Delete {
            record_id: seeded_record.id,
        }];
        assert_eq!(implicit_plan.deletes(), &expected[..]);
        assert_eq!(explicit_plan.deletes(), &expected[..]);
        assert_eq!(explicit_plan.len(), 1, "no duplicate delete");
    }

    #[test]
    fn ledger_mark_for_a_refilled_cell_is_superseded_by_the_update() {
        let wt = Uuid::new_v4();
        let seeded_record = record(wt, date(2, 2), 4.0);
        let wts = vec![WorkType::new(wt, "wt-0")];
        let mut matrix = TimeMatrix::new();
        matrix.seed(&[seeded_record.clone()], &wts, 2025, None).unwrap();

        let mut ledger = DeletionLedger::new();
        matrix.edit(date(2, 2), wt, 0.0, None).unwrap();
        ledger.mark(seeded_record.id);
        // The user changes their mind and re-enters hours.
        matrix.edit(date(2, 2), wt, 6.0, None).unwrap();

        let plan = SavePlan::classify(&matrix, &ledger);
        assert!(plan.deletes().is_empty());
        assert_eq!(plan.upserts().len(), 1);
        assert!(matches!(
            plan.upserts()[0],
            SaveOperation::Update { record_id, hours, .. }
                if record_id == seeded_record.id && hours == 6.0
        ));
    }

    #[test]
    fn ledger_marks_without_matrix_counterparts_still_delete() {
        let (matrix, _) = seeded(&[], 1);
        let orphan = Uuid::new_v4();
        let mut ledger = DeletionLedger::new();
        ledger.mark(orphan);

        let plan = SavePlan::classify(&matrix, &ledger);
        assert_eq!(plan.deletes(), &[SaveOperation::Delete { record_id: orphan }]);
    }

    #[test]
    fn missing_assignees_invalidate_the_whole_plan() {
        let (mut matrix, wts) = seeded(&[], 2);
        matrix
            .edit(date(4, 2), wts[0].id, 6.0, Some(Uuid::new_v4()))
            .unwrap();
        matrix.edit(date(4, 3), wts[1].id, 2.0, None).unwrap();

        let plan = SavePlan::classify(&matrix, &DeletionLedger::new());
        let err = plan.validate().unwrap_err();
        assert_eq!(
            err.missing,
            vec![CellSlot {
                date: date(4, 3),
                work_type_id: wts[1].id,
            }]
        );
        // The valid edit still classified; execution is what's blocked.
        assert_eq!(plan.upserts().len(), 1);
    }

    #[test]
    fn operations_run_deletes_first() {
        let wt = Uuid::new_v4();
        let seeded_record = record(wt, date(2, 2), 4.0);
        let wts = vec![WorkType::new(wt, "wt-0")];
        let mut matrix = TimeMatrix::new();
        matrix.seed(&[seeded_record.clone()], &wts, 2025, None).unwrap();

        matrix.edit(date(2, 2), wt, 0.0, None).unwrap();
        matrix.edit(date(2, 3), wt, 3.0, Some(Uuid::new_v4())).unwrap();

        let plan = SavePlan::classify(&matrix, &DeletionLedger::new());
        let kinds: Vec<_> = plan.operations().map(SaveOperation::describe).collect();
        assert_eq!(kinds.len(), 2);
        assert!(kinds[0].starts_with("delete"));
        assert!(kinds[1].starts_with("create"));
    }

    #[test]
    fn save_operations_serialize_with_an_op_tag() {
        let op = SaveOperation::Create {
            date: date(4, 2),
            work_type_id: Uuid::new_v4(),
            hours: 1.5,
            assignee: Uuid::new_v4(),
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["op"], "create");
        assert_eq!(json["date"], "2025-04-02");
        assert_eq!(json["hours"], 1.5);
    }

    #[test]
    fn intents_cover_the_cell_state_space() {
        let ledger = DeletionLedger::new();

        let empty = Cell::empty(None);
        assert_eq!(CellIntent::of(&empty, &ledger), CellIntent::Keep);

        let mut fresh = Cell::empty(None);
        fresh.apply_edit(2.0, Some(Uuid::new_v4()), None);
        assert_eq!(CellIntent::of(&fresh, &ledger), CellIntent::Create);

        let persisted = Cell::from_record(&record(Uuid::new_v4(), date(1, 1), 4.0));
        assert_eq!(CellIntent::of(&persisted, &ledger), CellIntent::Keep);

        let mut edited = persisted;
        edited.apply_edit(5.0, None, None);
        assert_eq!(CellIntent::of(&edited, &ledger), CellIntent::Update);

        let mut cleared = persisted;
        cleared.apply_edit(0.0, None, None);
        assert_eq!(CellIntent::of(&cleared, &ledger), CellIntent::Delete);
    }
}
