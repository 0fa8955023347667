//! Per-operation state and the caller-facing handle.
//!
//! # Resolution
//!
//! An operation starts `PENDING`. Resolution is a compare-and-swap on `state`
//! from `PENDING` to `RESOLVED`; only the party that wins the swap may write
//! the result slot. Response delivery and the timeout timer both go through
//! `claim()`, so whichever arrives second sees the swap fail and does nothing.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::{LdapResult, MessageId, OperationKind, OperationResult};
use crate::error::{AwaitError, LockResultExt};

const PENDING: u8 = 0;
const RESOLVED: u8 = 1;

/// Shared record of one outstanding operation.
///
/// Held by the pending-operation table, the timer task, and every
/// [`OperationHandle`] for the operation.
#[derive(Debug)]
pub(crate) struct AsyncOperation {
    message_id: MessageId,
    kind: OperationKind,
    created_at: Instant,
    state: AtomicU8,
    slot: watch::Sender<Option<OperationResult>>,
    entries: AtomicU32,
    references: AtomicU32,
    /// Cancels the armed timeout task, if any.
    timer: Mutex<Option<CancellationToken>>,
}

impl AsyncOperation {
    pub(crate) fn new(message_id: MessageId, kind: OperationKind, created_at: Instant) -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            message_id,
            kind,
            created_at,
            state: AtomicU8::new(PENDING),
            slot,
            entries: AtomicU32::new(0),
            references: AtomicU32::new(0),
            timer: Mutex::new(None),
        }
    }

    pub(crate) fn message_id(&self) -> MessageId {
        self.message_id
    }

    pub(crate) fn created_at(&self) -> Instant {
        self.created_at
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.state.load(Ordering::Acquire) == PENDING
    }

    /// Atomically move from `PENDING` to `RESOLVED`.
    ///
    /// Returns `true` for exactly one caller over the lifetime of the
    /// operation. That caller must follow up with [`publish`](Self::publish).
    pub(crate) fn claim(&self) -> bool {
        self.state
            .compare_exchange(PENDING, RESOLVED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Write the terminal result. Only the winner of `claim()` calls this.
    pub(crate) fn publish(&self, result: OperationResult) {
        self.cancel_timer();
        self.slot.send_replace(Some(result));
    }

    /// Build the terminal result for this operation from a protocol result.
    ///
    /// Streaming kinds carry the progress counters observed so far.
    pub(crate) fn build_result(&self, result: LdapResult) -> OperationResult {
        let (entries_returned, references_returned) = if self.kind.is_streaming() {
            (
                self.entries.load(Ordering::Acquire),
                self.references.load(Ordering::Acquire),
            )
        } else {
            (0, 0)
        };
        OperationResult {
            message_id: self.message_id,
            kind: self.kind,
            result,
            entries_returned,
            references_returned,
            elapsed: self.created_at.elapsed(),
        }
    }

    /// Remember the token that cancels this operation's timeout task.
    ///
    /// If the operation already resolved, the task is cancelled right away.
    pub(crate) fn arm_timer(&self, token: CancellationToken) {
        let mut timer = self.timer.lock().recover_poison("AsyncOperation::arm_timer()");
        if self.is_pending() {
            *timer = Some(token);
        } else {
            token.cancel();
        }
    }

    fn cancel_timer(&self) {
        let token = self
            .timer
            .lock()
            .recover_poison("AsyncOperation::cancel_timer()")
            .take();
        if let Some(token) = token {
            token.cancel();
        }
    }

    pub(crate) fn record_entry(&self) -> u32 {
        self.entries.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn record_reference(&self) -> u32 {
        self.references.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn subscribe(&self) -> watch::Receiver<Option<OperationResult>> {
        self.slot.subscribe()
    }
}

/// Caller-side handle to an asynchronous operation.
///
/// Cloning is cheap; all clones observe the same result.
#[derive(Debug, Clone)]
pub struct OperationHandle {
    operation: std::sync::Arc<AsyncOperation>,
    receiver: watch::Receiver<Option<OperationResult>>,
}

impl OperationHandle {
    pub(crate) fn new(operation: std::sync::Arc<AsyncOperation>) -> Self {
        let receiver = operation.subscribe();
        Self {
            operation,
            receiver,
        }
    }

    pub fn message_id(&self) -> MessageId {
        self.operation.message_id
    }

    pub fn kind(&self) -> OperationKind {
        self.operation.kind
    }

    /// Time since the operation was submitted (monotonic).
    pub fn elapsed(&self) -> Duration {
        self.operation.created_at.elapsed()
    }

    /// Whether the terminal result is available.
    pub fn is_resolved(&self) -> bool {
        self.receiver.borrow().is_some()
    }

    /// The terminal result, if the operation has resolved.
    pub fn result(&self) -> Option<OperationResult> {
        self.receiver.borrow().clone()
    }

    /// Record one search entry received for this operation.
    ///
    /// Returns the number of entries recorded so far.
    pub fn record_entry(&self) -> u32 {
        self.operation.record_entry()
    }

    /// Record one search reference received for this operation.
    pub fn record_reference(&self) -> u32 {
        self.operation.record_reference()
    }

    pub fn entries_returned(&self) -> u32 {
        self.operation.entries.load(Ordering::Acquire)
    }

    pub fn references_returned(&self) -> u32 {
        self.operation.references.load(Ordering::Acquire)
    }

    /// Wait for the terminal result.
    ///
    /// With `caller_timeout` set, gives up after that long without affecting
    /// the operation itself; the engine's own timer still decides its outcome.
    pub async fn await_result(
        &self,
        caller_timeout: Option<Duration>,
    ) -> Result<OperationResult, AwaitError> {
        let message_id = self.message_id().as_i32();
        let mut receiver = self.receiver.clone();
        let wait = async move {
            let result = receiver
                .wait_for(Option::is_some)
                .await
                .map(|result| (*result).clone());
            result
        };

        let outcome = match caller_timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| AwaitError::Elapsed { message_id })?,
            None => wait.await,
        };

        outcome
            .ok()
            .flatten()
            .ok_or(AwaitError::Abandoned { message_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::ResultCode;
    use std::sync::Arc;

    fn operation(kind: OperationKind) -> Arc<AsyncOperation> {
        Arc::new(AsyncOperation::new(MessageId::new(7), kind, Instant::now()))
    }

    #[test]
    fn claim_succeeds_exactly_once() {
        let op = operation(OperationKind::Add);
        assert!(op.is_pending());
        assert!(op.claim());
        assert!(!op.claim());
        assert!(!op.is_pending());
    }

    #[test]
    fn handle_sees_published_result() {
        let op = operation(OperationKind::Delete);
        let handle = OperationHandle::new(Arc::clone(&op));
        assert!(!handle.is_resolved());
        assert!(handle.result().is_none());

        assert!(op.claim());
        op.publish(op.build_result(LdapResult::success()));

        assert!(handle.is_resolved());
        let result = handle.result().expect("result should be set");
        assert_eq!(result.message_id, MessageId::new(7));
        assert_eq!(result.result_code(), ResultCode::SUCCESS);
    }

    #[test]
    fn non_streaming_results_report_zero_counts() {
        let op = operation(OperationKind::Modify);
        op.record_entry();
        let result = op.build_result(LdapResult::success());
        assert_eq!(result.entries_returned, 0);
        assert_eq!(result.references_returned, 0);
    }

    #[test]
    fn search_results_carry_progress_counts() {
        let op = operation(OperationKind::Search);
        let handle = OperationHandle::new(Arc::clone(&op));
        handle.record_entry();
        handle.record_entry();
        handle.record_reference();

        let result = op.build_result(LdapResult::success());
        assert_eq!(result.entries_returned, 2);
        assert_eq!(result.references_returned, 1);
    }

    #[test]
    fn publishing_cancels_armed_timer() {
        let op = operation(OperationKind::Compare);
        let token = CancellationToken::new();
        op.arm_timer(token.clone());
        assert!(!token.is_cancelled());

        assert!(op.claim());
        op.publish(op.build_result(LdapResult::new(ResultCode::COMPARE_TRUE)));
        assert!(token.is_cancelled());
    }

    #[test]
    fn arming_after_resolution_cancels_immediately() {
        let op = operation(OperationKind::Add);
        assert!(op.claim());
        op.publish(op.build_result(LdapResult::success()));

        let token = CancellationToken::new();
        op.arm_timer(token.clone());
        assert!(token.is_cancelled());
    }

    #[test]
    fn await_result_is_pending_until_published() {
        let op = operation(OperationKind::Add);
        let handle = OperationHandle::new(Arc::clone(&op));

        let mut wait = tokio_test::task::spawn(handle.await_result(None));
        tokio_test::assert_pending!(wait.poll());

        assert!(op.claim());
        op.publish(op.build_result(LdapResult::success()));
        assert!(wait.is_woken());

        let result = tokio_test::assert_ready_ok!(wait.poll());
        assert_eq!(result.kind, OperationKind::Add);
    }

    #[tokio::test]
    async fn await_result_returns_once_published() {
        let op = operation(OperationKind::Add);
        let handle = OperationHandle::new(Arc::clone(&op));

        let publisher = Arc::clone(&op);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert!(publisher.claim());
            publisher.publish(publisher.build_result(LdapResult::success()));
        });

        let result = handle.await_result(None).await.expect("should resolve");
        assert_eq!(result.kind, OperationKind::Add);
    }

    #[tokio::test]
    async fn await_result_with_caller_timeout_elapses() {
        let op = operation(OperationKind::Add);
        let handle = OperationHandle::new(Arc::clone(&op));

        let err = handle
            .await_result(Some(Duration::from_millis(20)))
            .await
            .unwrap_err();
        assert_eq!(err, AwaitError::Elapsed { message_id: 7 });
        assert!(op.is_pending(), "caller timeout must not resolve the operation");
    }
}
