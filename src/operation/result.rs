//! Result codes and operation results.

use std::fmt;
use std::time::Duration;

use super::{MessageId, OperationKind};
use crate::control::Control;

/// Protocol result code.
///
/// Open set: servers may return codes this crate has no name for, so this is a
/// newtype with named constants rather than an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultCode(i32);

impl ResultCode {
    pub const SUCCESS: ResultCode = ResultCode(0);
    pub const OPERATIONS_ERROR: ResultCode = ResultCode(1);
    pub const PROTOCOL_ERROR: ResultCode = ResultCode(2);
    pub const TIME_LIMIT_EXCEEDED: ResultCode = ResultCode(3);
    pub const SIZE_LIMIT_EXCEEDED: ResultCode = ResultCode(4);
    pub const COMPARE_FALSE: ResultCode = ResultCode(5);
    pub const COMPARE_TRUE: ResultCode = ResultCode(6);
    pub const INVALID_CREDENTIALS: ResultCode = ResultCode(49);
    pub const BUSY: ResultCode = ResultCode(51);
    pub const UNAVAILABLE: ResultCode = ResultCode(52);
    pub const UNWILLING_TO_PERFORM: ResultCode = ResultCode(53);
    pub const OTHER: ResultCode = ResultCode(80);

    // Client-side codes.
    pub const SERVER_DOWN: ResultCode = ResultCode(81);
    pub const LOCAL_ERROR: ResultCode = ResultCode(82);
    pub const ENCODING_ERROR: ResultCode = ResultCode(83);
    pub const DECODING_ERROR: ResultCode = ResultCode(84);
    pub const TIMEOUT: ResultCode = ResultCode(85);
    pub const USER_CANCELED: ResultCode = ResultCode(88);
    pub const CONNECT_ERROR: ResultCode = ResultCode(91);
    pub const NO_MEMORY: ResultCode = ResultCode(90);

    #[inline]
    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    #[inline]
    pub fn as_i32(self) -> i32 {
        self.0
    }

    /// Symbolic name, or `None` for codes without a constant.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::SUCCESS => "success",
            Self::OPERATIONS_ERROR => "operations error",
            Self::PROTOCOL_ERROR => "protocol error",
            Self::TIME_LIMIT_EXCEEDED => "time limit exceeded",
            Self::SIZE_LIMIT_EXCEEDED => "size limit exceeded",
            Self::COMPARE_FALSE => "compare false",
            Self::COMPARE_TRUE => "compare true",
            Self::INVALID_CREDENTIALS => "invalid credentials",
            Self::BUSY => "busy",
            Self::UNAVAILABLE => "unavailable",
            Self::UNWILLING_TO_PERFORM => "unwilling to perform",
            Self::OTHER => "other",
            Self::SERVER_DOWN => "server down",
            Self::LOCAL_ERROR => "local error",
            Self::ENCODING_ERROR => "encoding error",
            Self::DECODING_ERROR => "decoding error",
            Self::TIMEOUT => "timeout",
            Self::USER_CANCELED => "user canceled",
            Self::NO_MEMORY => "no memory",
            Self::CONNECT_ERROR => "connect error",
            _ => return None,
        };
        Some(name)
    }

    /// Whether a connection that produced this code can still be trusted.
    ///
    /// Codes that mean the stream is desynchronized or the peer is gone make
    /// the connection unusable; ordinary operation failures do not.
    pub fn is_connection_usable(self) -> bool {
        !matches!(
            self,
            Self::OPERATIONS_ERROR
                | Self::PROTOCOL_ERROR
                | Self::BUSY
                | Self::UNAVAILABLE
                | Self::OTHER
                | Self::SERVER_DOWN
                | Self::LOCAL_ERROR
                | Self::ENCODING_ERROR
                | Self::DECODING_ERROR
                | Self::NO_MEMORY
                | Self::CONNECT_ERROR
        )
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", self.0, name),
            None => write!(f, "{}", self.0),
        }
    }
}

/// The generic result carried by every response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapResult {
    pub result_code: ResultCode,
    pub matched_dn: Option<String>,
    pub diagnostic_message: Option<String>,
    pub referral_urls: Vec<String>,
    pub controls: Vec<Control>,
}

impl LdapResult {
    pub fn new(result_code: ResultCode) -> Self {
        Self {
            result_code,
            matched_dn: None,
            diagnostic_message: None,
            referral_urls: Vec::new(),
            controls: Vec::new(),
        }
    }

    pub fn success() -> Self {
        Self::new(ResultCode::SUCCESS)
    }

    pub fn with_diagnostic(mut self, message: impl Into<String>) -> Self {
        self.diagnostic_message = Some(message.into());
        self
    }

    pub fn with_controls(mut self, controls: Vec<Control>) -> Self {
        self.controls = controls;
        self
    }

    /// Find a response control by oid.
    pub fn control(&self, oid: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.oid() == oid)
    }
}

/// Terminal outcome of an asynchronous operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    pub message_id: MessageId,
    pub kind: OperationKind,
    pub result: LdapResult,
    /// Entries returned before the final result; always 0 for non-search kinds.
    pub entries_returned: u32,
    /// References returned before the final result; always 0 for non-search kinds.
    pub references_returned: u32,
    /// Time between submission and resolution.
    pub elapsed: Duration,
}

impl OperationResult {
    pub fn result_code(&self) -> ResultCode {
        self.result.result_code
    }

    pub fn is_timeout(&self) -> bool {
        self.result.result_code == ResultCode::TIMEOUT
    }
}
