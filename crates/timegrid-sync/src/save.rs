use serde::Serialize;

use timegrid_model::{EquipmentId, SaveOperation, SavePlan};

use crate::store::{StoreError, TimesheetStore};

/// A single operation that failed against the store.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OperationFailure {
    pub operation: SaveOperation,
    /// Rendered store error.
    pub error: String,
}

/// Per-operation outcomes of an executed batch.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SaveReport {
    /// Operations the server acknowledged, in execution order.
    pub applied: Vec<SaveOperation>,
    /// Operations that failed; the rest of the batch still ran.
    pub failures: Vec<OperationFailure>,
}

impl SaveReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of a save request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum SaveOutcome {
    /// Classification found no work; the store was never contacted.
    NothingToSave,
    /// The batch executed; per-operation outcomes inside.
    Completed(SaveReport),
}

/// Execute a plan against the store: strictly sequential, every deletion
/// before the first create/update, each call awaited before the next begins.
///
/// An individual failure does not abort the queue; outcomes are collected so
/// the caller can report and retry per cell.
pub(crate) async fn execute_plan(
    store: &dyn TimesheetStore,
    equipment_id: EquipmentId,
    plan: &SavePlan,
) -> SaveReport {
    let mut report = SaveReport::default();
    for operation in plan.operations() {
        match run_operation(store, equipment_id, operation).await {
            Ok(()) => report.applied.push(operation.clone()),
            Err(err) => {
                tracing::warn!(
                    operation = %operation.describe(),
                    error = %err,
                    "save operation failed"
                );
                report.failures.push(OperationFailure {
                    operation: operation.clone(),
                    error: err.to_string(),
                });
            }
        }
    }
    report
}

async fn run_operation(
    store: &dyn TimesheetStore,
    equipment_id: EquipmentId,
    operation: &SaveOperation,
) -> Result<(), StoreError> {
    match operation {
        SaveOperation::Delete { record_id } => match store.delete_record(*record_id).await {
            // The record being gone already is the desired end state.
            Ok(()) | Err(StoreError::NotFound(_)) => Ok(()),
            Err(err) => Err(err),
        },
        SaveOperation::Create {
            date,
            work_type_id,
            hours,
            assignee,
        } => store
            .create_record(equipment_id, *date, *work_type_id, *hours, *assignee)
            .await
            .map(|_record_id| ()),
        SaveOperation::Update {
            record_id,
            hours,
            assignee,
            ..
        } => store.update_record(*record_id, *hours, *assignee).await,
    }
}
