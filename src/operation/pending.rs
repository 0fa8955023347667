//! Concurrent table of pending operations keyed by message id.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::MessageId;
use super::handle::AsyncOperation;

/// Pending operations for one connection.
///
/// Shared by the submitting threads, the reader context and the timer tasks.
/// Lookups clone the `Arc` out of the map so no shard lock is held while the
/// caller talks to the connection.
#[derive(Debug, Default)]
pub(crate) struct PendingOperations {
    operations: DashMap<MessageId, Arc<AsyncOperation>>,
}

impl PendingOperations {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert `operation` unless its id is already pending.
    ///
    /// Returns `false` when the id is taken.
    pub(crate) fn insert_if_absent(&self, operation: Arc<AsyncOperation>) -> bool {
        match self.operations.entry(operation.message_id()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(operation);
                true
            }
        }
    }

    pub(crate) fn get(&self, message_id: MessageId) -> Option<Arc<AsyncOperation>> {
        self.operations
            .get(&message_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Remove the entry for `message_id` only if it still refers to `operation`.
    pub(crate) fn remove_if_same(&self, message_id: MessageId, operation: &Arc<AsyncOperation>) -> bool {
        self.operations
            .remove_if(&message_id, |_, current| Arc::ptr_eq(current, operation))
            .is_some()
    }

    /// Remove and return every pending operation.
    pub(crate) fn drain(&self) -> Vec<Arc<AsyncOperation>> {
        let ids: Vec<MessageId> = self.operations.iter().map(|entry| *entry.key()).collect();
        ids.into_iter()
            .filter_map(|id| self.operations.remove(&id).map(|(_, op)| op))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.operations.len()
    }

    pub(crate) fn contains(&self, message_id: MessageId) -> bool {
        self.operations.contains_key(&message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationKind;
    use std::time::Instant;

    fn operation(id: i32) -> Arc<AsyncOperation> {
        Arc::new(AsyncOperation::new(
            MessageId::new(id),
            OperationKind::Add,
            Instant::now(),
        ))
    }

    #[test]
    fn new_table_is_empty() {
        let table = PendingOperations::new();
        assert_eq!(table.len(), 0);
        assert!(table.get(MessageId::new(1)).is_none());
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let table = PendingOperations::new();
        assert!(table.insert_if_absent(operation(1)));
        assert!(!table.insert_if_absent(operation(1)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn remove_if_same_ignores_other_operation_with_same_id() {
        let table = PendingOperations::new();
        let first = operation(1);
        let impostor = operation(1);
        assert!(table.insert_if_absent(Arc::clone(&first)));

        assert!(!table.remove_if_same(MessageId::new(1), &impostor));
        assert!(table.contains(MessageId::new(1)));

        assert!(table.remove_if_same(MessageId::new(1), &first));
        assert!(!table.contains(MessageId::new(1)));
    }

    #[test]
    fn drain_removes_everything() {
        let table = PendingOperations::new();
        for id in 1..=3 {
            assert!(table.insert_if_absent(operation(id)));
        }

        let mut drained: Vec<i32> = table
            .drain()
            .iter()
            .map(|op| op.message_id().as_i32())
            .collect();
        drained.sort_unstable();

        assert_eq!(drained, vec![1, 2, 3]);
        assert_eq!(table.len(), 0);
    }
}
