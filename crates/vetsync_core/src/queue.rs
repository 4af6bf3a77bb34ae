//! FIFO operation queue over the durable store.

use crate::model::LocalEntity;
use crate::operation::PendingOperation;
use crate::store::DurableStore;
use crate::types::{OperationId, OperationStatus, SyncState};
use chrono::Utc;
use tracing::debug;
use vetsync_sync_protocol::UserId;

/// Per-user FIFO view over the operations in a [`DurableStore`].
///
/// Every method is one store mutation, so an entity's `sync_state` and its
/// operation always change together.
#[derive(Clone, Copy)]
pub struct OperationQueue<'s> {
    store: &'s DurableStore,
}

impl<'s> OperationQueue<'s> {
    pub(crate) fn new(store: &'s DurableStore) -> Self {
        Self { store }
    }

    /// Appends an operation.
    pub fn enqueue(&self, user: &UserId, op: PendingOperation) {
        debug!(user = %user, op = %op.id, entity = %op.entity_id(), "enqueue");
        self.store.append_operation(user, op);
    }

    /// Stores a new entity together with the operation that creates it.
    ///
    /// Returns the queue length afterwards.
    pub fn record_creation<E: LocalEntity>(
        &self,
        user: &UserId,
        entity: E,
        op: PendingOperation,
    ) -> usize {
        debug!(user = %user, op = %op.id, entity = %op.entity_id(), "record local creation");
        self.store.mutate(user, |scope| {
            scope.upsert(entity);
            scope.operations.push(op);
            scope.operations.len()
        })
    }

    /// All operations, oldest first. Equal timestamps keep insertion order.
    pub fn peek_all(&self, user: &UserId) -> Vec<PendingOperation> {
        let mut ops = self.store.list_operations(user);
        ops.sort_by_key(|op| op.created_at);
        ops
    }

    /// Operations the next sync run will attempt, oldest first.
    pub fn pending(&self, user: &UserId) -> Vec<PendingOperation> {
        let mut ops = self.peek_all(user);
        ops.retain(PendingOperation::is_pending);
        ops
    }

    /// Removes an operation without touching its entity.
    pub fn remove(&self, user: &UserId, id: OperationId) -> bool {
        self.store.remove_operation(user, id)
    }

    /// Marks the operation's entity synced and removes the operation.
    ///
    /// Returns false if the operation was no longer queued.
    pub fn confirm(&self, user: &UserId, id: OperationId) -> bool {
        self.store.mutate(user, |scope| {
            let Some(pos) = scope.operations.iter().position(|op| op.id == id) else {
                return false;
            };
            let op = scope.operations.remove(pos);
            scope.transition(op.entity_id(), SyncState::Synced);
            true
        })
    }

    /// Marks the operation and its entity failed and records the message.
    ///
    /// Returns the new attempt count, or `None` if the operation was no
    /// longer queued.
    pub fn record_rejection(&self, user: &UserId, id: OperationId, message: &str) -> Option<u32> {
        let now = Utc::now();
        self.store.mutate(user, |scope| {
            let op = scope.operations.iter_mut().find(|op| op.id == id)?;
            op.mark_failed(message, now);
            let (entity, attempts) = (op.entity_id(), op.attempt_count);
            scope.transition(entity, SyncState::Failed);
            Some(attempts)
        })
    }

    /// Returns every failed operation and its entity to `pending`.
    ///
    /// Attempt counts and last errors are cleared. Synced entities are never
    /// touched. Returns how many operations were reset.
    pub fn mark_all_for_retry(&self, user: &UserId) -> usize {
        let now = Utc::now();
        let reset = self.store.mutate(user, |scope| {
            let mut entities = Vec::new();
            for op in scope
                .operations
                .iter_mut()
                .filter(|op| op.status == OperationStatus::Failed)
            {
                op.reset_for_retry(now);
                entities.push(op.entity_id());
            }
            for entity in &entities {
                scope.transition(*entity, SyncState::Pending);
            }
            entities.len()
        });
        debug!(user = %user, reset, "marked failed operations for retry");
        reset
    }

    /// Number of queued operations, failed ones included.
    pub fn len(&self, user: &UserId) -> usize {
        self.store.read(user, |scope| scope.operations.len())
    }

    /// Returns true if nothing is queued for the user.
    pub fn is_empty(&self, user: &UserId) -> bool {
        self.len(user) == 0
    }

    /// Number of operations waiting for a manual retry.
    pub fn failed_count(&self, user: &UserId) -> usize {
        self.store
            .read(user, |scope| scope.count_operations(OperationStatus::Failed))
    }
}
