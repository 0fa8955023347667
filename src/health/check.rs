//! Health check hooks and the pooled connection surface they inspect.

use std::fmt;
use std::time::Instant;

use crate::error::{ConnectionInvalidError, ProtocolError};
use crate::operation::LdapResult;

/// What a health check may ask of a pooled connection.
pub trait PooledConnection: Send + Sync {
    fn is_connected(&self) -> bool;

    /// When the connection was established (monotonic).
    fn established_at(&self) -> Instant;

    /// Name used in diagnostics.
    fn connection_name(&self) -> &str;
}

/// Validates a pooled connection at one of six lifecycle transitions.
///
/// Every hook passes by default, so a check only overrides the transitions it
/// cares about. Checks are shared across threads; any mutable state they keep
/// must be synchronized internally.
pub trait HealthCheck: Send + Sync + fmt::Debug {
    /// Name reported in [`ConnectionInvalidError::check`].
    fn name(&self) -> &str;

    /// Right after the connection is established, before it enters the pool.
    fn after_new_connection(
        &self,
        _connection: &dyn PooledConnection,
    ) -> Result<(), ConnectionInvalidError> {
        Ok(())
    }

    /// After a bind on the connection completed with `bind_result`.
    fn after_authentication(
        &self,
        _connection: &dyn PooledConnection,
        _bind_result: &LdapResult,
    ) -> Result<(), ConnectionInvalidError> {
        Ok(())
    }

    /// Before the pool hands the connection to a caller.
    fn before_checkout(
        &self,
        _connection: &dyn PooledConnection,
    ) -> Result<(), ConnectionInvalidError> {
        Ok(())
    }

    /// Before the connection goes back into the pool.
    fn before_release(
        &self,
        _connection: &dyn PooledConnection,
    ) -> Result<(), ConnectionInvalidError> {
        Ok(())
    }

    /// Periodic background validation, or before an idle connection is
    /// reused.
    fn continued_use(
        &self,
        _connection: &dyn PooledConnection,
    ) -> Result<(), ConnectionInvalidError> {
        Ok(())
    }

    /// After an operation on the connection failed with `error`.
    fn after_operation_exception(
        &self,
        _connection: &dyn PooledConnection,
        _error: &ProtocolError,
    ) -> Result<(), ConnectionInvalidError> {
        Ok(())
    }
}
