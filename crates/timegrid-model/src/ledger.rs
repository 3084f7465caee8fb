use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::RecordId;

/// Record identifiers whose backing rows must be deleted on the next save.
///
/// Clearing a cell's value and forgetting its server record are two distinct
/// facts: the matrix alone cannot tell "user wants 0 hours" apart from "user
/// wants the record gone". The ledger keeps the second fact alive
/// independently of whatever the cell's in-memory state becomes afterwards.
/// It is append-only between saves and cleared only once a save cycle has
/// refreshed from the server.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionLedger {
    ids: BTreeSet<RecordId>,
}

impl DeletionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a record for deletion. Re-marking a present id is a no-op.
    pub fn mark(&mut self, record_id: RecordId) {
        self.ids.insert(record_id);
    }

    pub fn contains(&self, record_id: RecordId) -> bool {
        self.ids.contains(&record_id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// The marked ids, in stable order.
    pub fn snapshot(&self) -> Vec<RecordId> {
        self.ids.iter().copied().collect()
    }

    /// Drop every mark.
    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn marking_is_idempotent() {
        let mut ledger = DeletionLedger::new();
        let id = Uuid::new_v4();
        ledger.mark(id);
        ledger.mark(id);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.contains(id));
    }

    #[test]
    fn clear_empties_the_ledger() {
        let mut ledger = DeletionLedger::new();
        ledger.mark(Uuid::new_v4());
        ledger.mark(Uuid::new_v4());
        assert_eq!(ledger.snapshot().len(), 2);

        ledger.clear();
        assert!(ledger.is_empty());
    }
}
