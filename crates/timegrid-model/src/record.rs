use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{OperatorId, RecordId, WorkTypeId};

/// One authoritative work-hour record as returned by the persistence layer.
///
/// This is the validated shape at the seed boundary; whatever loosely-typed
/// payload the transport produces is coerced into it before it can reach the
/// matrix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeRecord {
    pub id: RecordId,
    pub date: NaiveDate,
    pub work_type_id: WorkTypeId,
    pub hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<OperatorId>,
}

/// A labor/activity category an equipment unit can log hours against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkType {
    pub id: WorkTypeId,
    pub name: String,
}

impl WorkType {
    pub fn new(id: WorkTypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
