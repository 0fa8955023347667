//! Asynchronous operation tracking.
//!
//! [`AsyncEngine`] owns the pending-operation table for one connection and
//! resolves every submitted operation exactly once, either with the server's
//! response or with a client-side timeout.

mod connection;
mod engine;
mod handle;
mod kind;
mod message_id;
mod pending;
mod result;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use connection::Connection;
pub use engine::AsyncEngine;
pub use handle::OperationHandle;
pub use kind::OperationKind;
pub use message_id::{MessageId, MessageIdAllocator};
pub use result::{LdapResult, OperationResult, ResultCode};
