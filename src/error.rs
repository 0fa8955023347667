//! Error types for dirwire.
//!
//! Each subsystem fails with its own error type so callers can tell a malformed
//! payload from a dead socket from an unhealthy pooled connection.

use std::sync::PoisonError;
use thiserror::Error;

use crate::operation::ResultCode;

/// Malformed or ambiguous binary input. Always fatal to the decode call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodingError {
    /// No bytes were available where an element was expected.
    #[error("cannot decode an element from an empty buffer")]
    Empty,

    /// The declared length runs past the end of the available bytes.
    #[error("element declares {declared} value bytes but only {available} are available")]
    Truncated { declared: usize, available: usize },

    /// Multi-byte (high tag number) tags are not used by the protocol.
    #[error("unsupported multi-byte tag form in tag byte {tag:#04x}")]
    MultiByteTag { tag: u8 },

    /// Indefinite-length encoding is forbidden.
    #[error("indefinite length encoding is not allowed")]
    IndefiniteLength,

    /// Long-form length uses more bytes than the decoder accepts.
    #[error("length is encoded with {count} bytes, at most 4 are allowed")]
    LengthTooLong { count: u8 },

    /// Bytes remain after an element that was expected to fill the buffer.
    #[error("{count} unexpected trailing bytes after element")]
    TrailingBytes { count: usize },

    /// An element carried a different tag than the one the caller expects.
    #[error("expected tag {expected:#04x} but found {actual:#04x}")]
    UnexpectedTag { expected: u8, actual: u8 },

    /// A primitive payload could not be interpreted as the requested type.
    #[error("invalid {kind} value: {reason}")]
    InvalidValue { kind: &'static str, reason: String },

    /// A control value did not have the shape its identifier requires.
    #[error("cannot decode {control}: {reason}")]
    Control { control: String, reason: String },
}

impl DecodingError {
    /// Create an invalid primitive value error.
    pub fn invalid_value(kind: &'static str, reason: impl Into<String>) -> Self {
        DecodingError::InvalidValue {
            kind,
            reason: reason.into(),
        }
    }

    /// Create a control decoding error.
    pub fn control(control: impl Into<String>, reason: impl Into<String>) -> Self {
        DecodingError::Control {
            control: control.into(),
            reason: reason.into(),
        }
    }
}

/// Write/send failure reported by the connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying socket failed.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection is closed and accepts no more writes.
    #[error("connection is closed")]
    Closed,

    /// The connection refused the write for another reason.
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// A protocol-level failure carrying a result code.
///
/// Used for abandon failures and as the operation exception handed to
/// health checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (result code {result_code})")]
pub struct ProtocolError {
    pub result_code: ResultCode,
    pub message: String,
}

impl ProtocolError {
    pub fn new(result_code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            result_code,
            message: message.into(),
        }
    }
}

/// A health check decided that a pooled connection must not be used.
#[derive(Debug, Clone, Error)]
#[error("connection invalid according to {check}: {message}")]
pub struct ConnectionInvalidError {
    /// Name of the check that rejected the connection.
    pub check: String,
    /// Human-readable diagnostic.
    pub message: String,
    /// The operation failure that triggered the check, if any.
    #[source]
    pub cause: Option<ProtocolError>,
}

impl ConnectionInvalidError {
    pub fn new(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// Attach the protocol error that caused the rejection.
    pub fn with_cause(mut self, cause: ProtocolError) -> Self {
        self.cause = Some(cause);
        self
    }
}

/// A finite resource needed by the engine ran out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// Every probed message id is still held by a pending operation.
    #[error("no free message id after probing {probes} candidates")]
    MessageIdsExhausted { probes: u32 },
}

/// Failure of `AsyncEngine::submit`.
///
/// No pending state is left behind when this is returned.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Failure while a caller waits on an operation handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AwaitError {
    /// The caller-side wait elapsed before the operation resolved.
    #[error("operation {message_id} did not resolve within the caller timeout")]
    Elapsed { message_id: i32 },

    /// The result slot closed without a value.
    ///
    /// A dropped engine resolves what it still tracks with `LOCAL_ERROR`, so
    /// this only surfaces when an operation was released unresolved.
    #[error("operation {message_id} was released without a result")]
    Abandoned { message_id: i32 },
}

/// Failure to load connection options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read options file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse options: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid options: {0}")]
    Invalid(String),
}

/// Helper trait to recover from poisoned `std::sync` locks.
pub trait LockResultExt<T> {
    /// Take the guard out of a poisoned lock, logging which operation recovered.
    fn recover_poison(self, context: &str) -> T;
}

impl<T> LockResultExt<T> for Result<T, PoisonError<T>> {
    fn recover_poison(self, context: &str) -> T {
        match self {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!(
                    target: "dirwire::lock_recovery",
                    "Recovered from poisoned lock in {}",
                    context
                );
                poisoned.into_inner()
            }
        }
    }
}
