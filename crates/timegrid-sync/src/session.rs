use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use timegrid_model::{
    CeilingExceeded, Cell, DeletionLedger, EquipmentId, GridProjection, MissingAssignees,
    OperatorId, SavePlan, SeedError, TimeMatrix, ViewWindow, WorkType, WorkTypeId,
};

use crate::save::{execute_plan, SaveOutcome};
use crate::store::{StoreError, TimesheetStore};

/// Errors that block a load or save cycle.
///
/// Individual operation failures inside an executed batch are data
/// ([`SaveReport::failures`](crate::SaveReport)), not errors; this type
/// covers the conditions under which a cycle cannot proceed at all.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Pre-flight validation failed; no operation was executed.
    #[error(transparent)]
    Validation(#[from] MissingAssignees),
    /// The matrix rejected the snapshot it was asked to seed from.
    #[error(transparent)]
    Seed(#[from] SeedError),
    /// A fetch (initial seed or post-save refresh) failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One editing session over one equipment unit's yearly grid.
///
/// The session is the sole owner of the matrix and the deletion ledger. All
/// reads hand out values through [`get`](Self::get) / [`project`](Self::project),
/// so a post-save refresh can replace the matrix contents wholesale without
/// dangling references; mutation and saving take `&mut self`, which rules out
/// edits racing a save already in flight.
pub struct EditSession {
    store: Arc<dyn TimesheetStore>,
    equipment_id: EquipmentId,
    year: i32,
    default_assignee: Option<OperatorId>,
    matrix: TimeMatrix,
    ledger: DeletionLedger,
}

impl EditSession {
    /// Create an unloaded session; call [`load`](Self::load) before editing.
    pub fn new(
        store: Arc<dyn TimesheetStore>,
        equipment_id: EquipmentId,
        year: i32,
        default_assignee: Option<OperatorId>,
    ) -> Self {
        Self {
            store,
            equipment_id,
            year,
            default_assignee,
            matrix: TimeMatrix::new(),
            ledger: DeletionLedger::new(),
        }
    }

    pub fn equipment_id(&self) -> EquipmentId {
        self.equipment_id
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn matrix(&self) -> &TimeMatrix {
        &self.matrix
    }

    pub fn ledger(&self) -> &DeletionLedger {
        &self.ledger
    }

    /// Fetch the column domain and the full-year snapshot, then seed the
    /// matrix.
    ///
    /// Re-loading merges rather than replaces: dirty cells without an
    /// authoritative counterpart survive, cells with one take the server's
    /// values.
    pub async fn load(&mut self) -> Result<(), SessionError> {
        let work_types = self.store.fetch_work_types(self.equipment_id).await?;
        self.reseed(&work_types).await
    }

    /// Ceiling-checked edit of one cell.
    pub fn edit(
        &mut self,
        date: NaiveDate,
        work_type_id: WorkTypeId,
        hours: f64,
        assignee: Option<OperatorId>,
    ) -> Result<(), CeilingExceeded> {
        self.matrix.edit(date, work_type_id, hours, assignee)
    }

    /// Clear a cell and, when a server record backs it, remember that the
    /// record itself must go.
    ///
    /// Zeroing a persisted cell through [`edit`](Self::edit) alone is caught
    /// at diff time too; this helper makes the intent explicit at the call
    /// site and covers records the diff scan can no longer see.
    pub fn clear_cell(
        &mut self,
        date: NaiveDate,
        work_type_id: WorkTypeId,
    ) -> Result<(), CeilingExceeded> {
        let record_id = self.matrix.get(date, work_type_id).record_id;
        self.matrix.edit(date, work_type_id, 0.0, None)?;
        if let Some(record_id) = record_id {
            self.ledger.mark(record_id);
        }
        Ok(())
    }

    /// Extend the column domain mid-session (work-types can be attached to an
    /// equipment type after the grid is already populated).
    pub fn add_work_type(&mut self, work_type: WorkType, default_assignee: Option<OperatorId>) {
        self.matrix.add_work_type(work_type, default_assignee);
    }

    pub fn get(&self, date: NaiveDate, work_type_id: WorkTypeId) -> Cell {
        self.matrix.get(date, work_type_id)
    }

    pub fn project(&self, window: &ViewWindow) -> GridProjection {
        self.matrix.project(window)
    }

    /// True when any cell edit or deletion mark is not yet saved.
    pub fn has_pending_changes(&self) -> bool {
        self.matrix.has_pending_changes() || !self.ledger.is_empty()
    }

    /// Converge the server with local edits: classify, validate, execute.
    ///
    /// Operations run strictly one at a time, all deletions before the first
    /// create/update. A single failure does not abort the rest of the batch.
    /// If anything succeeded, the session refreshes from the server: the
    /// ledger's job is done and the matrix re-converges on the authoritative
    /// snapshot. Failed creates have no record and therefore survive the
    /// re-seed as dirty cells; failed updates and deletes reappear with the
    /// server's values and are carried in the returned report. If every
    /// operation failed, nothing is cleared or refreshed and the user can
    /// retry as-is.
    pub async fn save(&mut self) -> Result<SaveOutcome, SessionError> {
        let plan = SavePlan::classify(&self.matrix, &self.ledger);
        plan.validate()?;
        if plan.is_empty() {
            tracing::info!("nothing to save");
            return Ok(SaveOutcome::NothingToSave);
        }

        tracing::info!(
            deletes = plan.deletes().len(),
            upserts = plan.upserts().len(),
            "executing save batch"
        );
        let report = execute_plan(self.store.as_ref(), self.equipment_id, &plan).await;

        if report.applied.is_empty() {
            return Ok(SaveOutcome::Completed(report));
        }

        let work_types = self.store.fetch_work_types(self.equipment_id).await?;
        self.reseed(&work_types).await?;
        self.ledger.clear();
        Ok(SaveOutcome::Completed(report))
    }

    async fn reseed(&mut self, work_types: &[WorkType]) -> Result<(), SessionError> {
        let records = self.store.fetch_year(self.equipment_id, self.year).await?;
        let report =
            self.matrix
                .seed(&records, work_types, self.year, self.default_assignee)?;
        tracing::info!(
            year = self.year,
            applied = report.applied,
            skipped = report.unknown_work_type + report.out_of_year,
            preserved = report.preserved_edits,
            "matrix seeded"
        );
        Ok(())
    }
}
