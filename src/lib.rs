//! Client runtime core for a TLV-encoded directory access protocol.
//!
//! - [`asn1`]: the tag-length-value codec.
//! - [`control`]: request/response controls and their decode registry.
//! - [`operation`]: the asynchronous engine that resolves each request once.
//! - [`health`]: pooled-connection health checks.

pub mod asn1;
pub mod config;
pub mod control;
pub mod error;
pub mod health;
pub mod operation;

pub use config::ConnectionOptions;
pub use control::{Control, ControlRegistry, DecodeableControl, DecodedControl};
pub use error::{
    AwaitError, ConfigError, ConnectionInvalidError, DecodingError, ProtocolError, ResourceError,
    SubmitError, TransportError,
};
pub use health::{HealthCheck, HealthCheckChain, PooledConnection};
pub use operation::{
    AsyncEngine, Connection, LdapResult, MessageId, OperationHandle, OperationKind,
    OperationResult, ResultCode,
};
