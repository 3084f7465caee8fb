use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use timegrid_model::{EquipmentId, OperatorId, RecordId, TimeRecord, WorkType, WorkTypeId};

/// Errors surfaced by a persistence backend.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The targeted record no longer exists on the server.
    #[error("record not found: {0}")]
    NotFound(RecordId),
    /// Transport or server-side failure, already rendered to text.
    #[error("store error: {0}")]
    Backend(String),
}

/// The system of record the grid reconciles against.
///
/// Implementations wrap whatever persistence transport the application uses;
/// the engine relies on exactly these five calls and nothing else about the
/// wire. The save engine treats a `delete_record` answered with
/// [`StoreError::NotFound`] as success (the record being gone is the desired
/// end state), so implementations need not special-case it.
#[async_trait]
pub trait TimesheetStore: Send + Sync {
    /// All records of `equipment_id` dated within the calendar year.
    async fn fetch_year(
        &self,
        equipment_id: EquipmentId,
        year: i32,
    ) -> Result<Vec<TimeRecord>, StoreError>;

    /// Work-types the equipment currently supports (the grid's column domain).
    async fn fetch_work_types(
        &self,
        equipment_id: EquipmentId,
    ) -> Result<Vec<WorkType>, StoreError>;

    /// Create a record, returning its server-side id.
    async fn create_record(
        &self,
        equipment_id: EquipmentId,
        date: NaiveDate,
        work_type_id: WorkTypeId,
        hours: f64,
        assignee: OperatorId,
    ) -> Result<RecordId, StoreError>;

    /// Update an existing record. A vanished record must surface as
    /// [`StoreError::NotFound`] rather than an opaque failure.
    async fn update_record(
        &self,
        record_id: RecordId,
        hours: f64,
        assignee: OperatorId,
    ) -> Result<(), StoreError>;

    /// Delete a record.
    async fn delete_record(&self, record_id: RecordId) -> Result<(), StoreError>;
}
