//! Asynchronous operation engine.
//!
//! # Flow
//!
//! 1. `submit` allocates a message id, registers a `PENDING` operation, writes
//!    the request through the [`Connection`], and arms a timeout task.
//! 2. The reader context calls `deliver` when the correlated response arrives.
//! 3. The timeout task calls `on_timeout` when the deadline passes first.
//!
//! Both 2 and 3 go through the operation's compare-and-swap guard; the loser
//! returns `false` and touches nothing. Timeout cleanup (deregistration and
//! the optional abandon) is best-effort and never changes the result.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use super::handle::AsyncOperation;
use super::pending::PendingOperations;
use super::{
    Connection, LdapResult, MessageId, MessageIdAllocator, OperationHandle, OperationKind,
    ResultCode,
};
use crate::error::{ResourceError, SubmitError};

/// Longest timeout that arms a timer; longer ones behave like no timeout.
const MAX_ARMED_TIMEOUT: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// Why an operation is being resolved without a server response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expiry {
    Timeout,
    Canceled,
}

impl Expiry {
    fn result_code(self) -> ResultCode {
        match self {
            Expiry::Timeout => ResultCode::TIMEOUT,
            Expiry::Canceled => ResultCode::USER_CANCELED,
        }
    }

    fn message(self, elapsed: Duration, abandon: bool) -> String {
        let what = match self {
            Expiry::Timeout => "encountered a client-side timeout",
            Expiry::Canceled => "was canceled",
        };
        let followup = if abandon {
            "and will be abandoned"
        } else {
            "without being abandoned"
        };
        format!(
            "The asynchronous operation {} after {} ms {}",
            what,
            elapsed.as_millis(),
            followup
        )
    }
}

/// Correlates asynchronous requests with their responses on one connection.
///
/// Cloning is cheap and clones share all state.
pub struct AsyncEngine<C: Connection> {
    inner: Arc<EngineInner<C>>,
}

struct EngineInner<C: Connection> {
    connection: Arc<C>,
    pending: PendingOperations,
    ids: MessageIdAllocator,
    /// Runtime the timeout tasks are spawned on.
    runtime: Handle,
}

impl<C: Connection> Clone for AsyncEngine<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connection> std::fmt::Debug for AsyncEngine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncEngine")
            .field("pending", &self.inner.pending.len())
            .finish_non_exhaustive()
    }
}

impl<C: Connection> AsyncEngine<C> {
    /// Create an engine whose timeout tasks run on `runtime`.
    pub fn new(connection: Arc<C>, runtime: Handle) -> Self {
        Self::with_allocator(connection, runtime, MessageIdAllocator::new())
    }

    /// Create an engine with a custom id allocator.
    pub fn with_allocator(connection: Arc<C>, runtime: Handle, ids: MessageIdAllocator) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                connection,
                pending: PendingOperations::new(),
                ids,
                runtime,
            }),
        }
    }

    pub fn connection(&self) -> &Arc<C> {
        &self.inner.connection
    }

    /// Number of operations still waiting for resolution.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    pub fn is_pending(&self, message_id: MessageId) -> bool {
        self.inner.pending.contains(message_id)
    }

    /// Submit an encoded request.
    ///
    /// `timeout` is measured from this call on the monotonic clock; `None`, a
    /// zero duration, or one longer than thirty years arms no timer. Returns as
    /// soon as the request has been handed to the connection.
    ///
    /// # Errors
    /// - [`SubmitError::Resource`] when no message id is free.
    /// - [`SubmitError::Transport`] when the connection rejects the write; the
    ///   operation is unregistered before returning.
    pub fn submit(
        &self,
        kind: OperationKind,
        request: &[u8],
        timeout: Option<Duration>,
    ) -> Result<OperationHandle, SubmitError> {
        let created_at = Instant::now();
        let deadline = timer_deadline(created_at, timeout);
        let operation = self.inner.register(kind, created_at)?;
        let message_id = operation.message_id();

        if let Err(e) = self.inner.connection.transmit(message_id, request) {
            self.inner.pending.remove_if_same(message_id, &operation);
            debug!(
                target: "dirwire::async",
                "Transmit of {} request {} failed: {}",
                kind,
                message_id,
                e
            );
            return Err(e.into());
        }

        if let Some(deadline) = deadline {
            self.inner.arm_timer(&operation, deadline);
        }

        Ok(OperationHandle::new(operation))
    }

    /// Submit using the connection's configured response timeout for `kind`.
    pub fn submit_with_default_timeout(
        &self,
        kind: OperationKind,
        request: &[u8],
    ) -> Result<OperationHandle, SubmitError> {
        let timeout = self.inner.connection.options().response_timeout_for(kind);
        self.submit(kind, request, timeout)
    }

    /// Deliver the final response for `message_id`.
    ///
    /// Returns `false` when the operation is unknown or already resolved; the
    /// response is then discarded.
    pub fn deliver(&self, message_id: MessageId, result: LdapResult) -> bool {
        self.inner.deliver(message_id, result)
    }

    /// Count a search entry received for `message_id`.
    pub fn entry_returned(&self, message_id: MessageId) -> bool {
        match self.inner.pending.get(message_id) {
            Some(operation) => {
                operation.record_entry();
                true
            }
            None => false,
        }
    }

    /// Count a search reference received for `message_id`.
    pub fn reference_returned(&self, message_id: MessageId) -> bool {
        match self.inner.pending.get(message_id) {
            Some(operation) => {
                operation.record_reference();
                true
            }
            None => false,
        }
    }

    /// Resolve `message_id` with a timeout result, as the timer would.
    pub fn on_timeout(&self, message_id: MessageId) -> bool {
        self.inner.expire(message_id, Expiry::Timeout)
    }

    /// Cancel `message_id`, resolving it with `USER_CANCELED`.
    ///
    /// Cleanup follows the timeout path.
    pub fn cancel(&self, message_id: MessageId) -> bool {
        self.inner.expire(message_id, Expiry::Canceled)
    }

    /// Resolve every pending operation with `result_code`.
    ///
    /// Used when the connection is lost and no response can arrive anymore.
    /// Returns how many operations this call resolved.
    pub fn fail_all(&self, result_code: ResultCode, message: &str) -> usize {
        self.inner.fail_all(result_code, message)
    }
}

/// Deadline for a timer armed at `created_at`, or `None` for no timer.
fn timer_deadline(created_at: Instant, timeout: Option<Duration>) -> Option<Instant> {
    let timeout = timeout.filter(|t| !t.is_zero())?;
    let deadline = if timeout <= MAX_ARMED_TIMEOUT {
        created_at.checked_add(timeout)
    } else {
        None
    };
    if deadline.is_none() {
        debug!(
            target: "dirwire::async",
            "Timeout of {:?} is out of range, arming no timer",
            timeout
        );
    }
    deadline
}

impl<C: Connection> EngineInner<C> {
    fn fail_all(&self, result_code: ResultCode, message: &str) -> usize {
        let mut resolved = 0;
        for operation in self.pending.drain() {
            if operation.claim() {
                let result = LdapResult::new(result_code).with_diagnostic(message);
                operation.publish(operation.build_result(result));
                resolved += 1;
            }
        }
        if resolved > 0 {
            warn!(
                target: "dirwire::async",
                "Failed {} pending operations: {}",
                resolved,
                message
            );
        }
        resolved
    }

    /// Allocate an id and insert a `PENDING` operation under it.
    fn register(
        &self,
        kind: OperationKind,
        created_at: Instant,
    ) -> Result<Arc<AsyncOperation>, ResourceError> {
        let probes = self.connection.options().max_message_id_probes.max(1);
        for _ in 0..probes {
            let message_id = self.ids.next_id();
            let operation = Arc::new(AsyncOperation::new(message_id, kind, created_at));
            if self.pending.insert_if_absent(Arc::clone(&operation)) {
                return Ok(operation);
            }
            debug!(
                target: "dirwire::async",
                "Message id {} still pending after wraparound, probing next",
                message_id
            );
        }
        Err(ResourceError::MessageIdsExhausted { probes })
    }

    fn arm_timer(self: &Arc<Self>, operation: &Arc<AsyncOperation>, deadline: Instant) {
        let token = CancellationToken::new();
        operation.arm_timer(token.clone());

        let deadline = tokio::time::Instant::from_std(deadline);
        let message_id = operation.message_id();
        let inner = Arc::clone(self);
        self.runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    // Cleanup talks to the connection synchronously.
                    let expired = tokio::task::spawn_blocking(move || {
                        inner.expire(message_id, Expiry::Timeout)
                    })
                    .await;
                    if let Err(e) = expired {
                        warn!(
                            target: "dirwire::async",
                            "Timeout task for message {} failed: {}",
                            message_id,
                            e
                        );
                    }
                }
            }
        });
    }

    fn deliver(&self, message_id: MessageId, result: LdapResult) -> bool {
        let Some(operation) = self.pending.get(message_id) else {
            debug!(
                target: "dirwire::async",
                "Response for unknown message id {}, dropping",
                message_id
            );
            return false;
        };
        if !operation.claim() {
            return false;
        }
        self.pending.remove_if_same(message_id, &operation);
        operation.publish(operation.build_result(result));
        true
    }

    fn expire(&self, message_id: MessageId, expiry: Expiry) -> bool {
        let Some(operation) = self.pending.get(message_id) else {
            return false;
        };
        if !operation.claim() {
            return false;
        }
        self.pending.remove_if_same(message_id, &operation);

        let abandon = self.connection.options().abandon_on_timeout;
        let elapsed = operation.created_at().elapsed();

        if let Err(e) = self.connection.deregister_pending_response(message_id) {
            debug!(
                target: "dirwire::async",
                "Ignoring deregistration failure for message {}: {}",
                message_id,
                e
            );
        }
        if abandon {
            if let Err(e) = self.connection.abandon(message_id) {
                warn!(
                    target: "dirwire::async",
                    "Abandon of message {} failed: {}",
                    message_id,
                    e
                );
            }
        }

        let result =
            LdapResult::new(expiry.result_code()).with_diagnostic(expiry.message(elapsed, abandon));
        operation.publish(operation.build_result(result));
        debug!(
            target: "dirwire::async",
            "Message {} resolved by {:?} after {:?}",
            message_id,
            expiry,
            elapsed
        );
        true
    }
}

impl<C: Connection> Drop for EngineInner<C> {
    /// Nothing can deliver to the remaining operations anymore, so resolve
    /// them rather than leave their handles waiting.
    fn drop(&mut self) {
        self.fail_all(
            ResultCode::LOCAL_ERROR,
            "The asynchronous engine was dropped before the operation completed",
        );
    }
}
