//! The capability surface the async engine needs from a connection.
//!
//! Socket I/O, TLS and message framing live behind this trait. The engine only
//! ever hands a connection an already-encoded request and a message id.

use super::MessageId;
use crate::config::ConnectionOptions;
use crate::error::{ProtocolError, TransportError};

/// Connection operations consumed by [`AsyncEngine`](super::AsyncEngine).
///
/// Methods are synchronous and may be called from the reader context, timer
/// tasks, or the submitting thread concurrently, so implementations must be
/// internally synchronized.
pub trait Connection: Send + Sync + 'static {
    /// Frame and write `request` under `message_id`.
    fn transmit(&self, message_id: MessageId, request: &[u8]) -> Result<(), TransportError>;

    /// Stop routing responses for `message_id` to the engine.
    ///
    /// Best-effort: the engine logs and ignores failures.
    fn deregister_pending_response(&self, message_id: MessageId) -> Result<(), TransportError>;

    /// Ask the server to stop processing `message_id`.
    fn abandon(&self, message_id: MessageId) -> Result<(), ProtocolError>;

    /// Connection-wide options, including the abandon-on-timeout policy.
    fn options(&self) -> &ConnectionOptions;
}
