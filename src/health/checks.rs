//! Built-in health checks.

use std::time::Duration;

use super::{HealthCheck, PooledConnection};
use crate::error::{ConfigError, ConnectionInvalidError, ProtocolError};
use crate::operation::LdapResult;

/// Fails every hook once the connection reports it is no longer connected.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectedCheck;

impl ConnectedCheck {
    const NAME: &'static str = "ConnectedCheck";

    fn check(connection: &dyn PooledConnection) -> Result<(), ConnectionInvalidError> {
        if connection.is_connected() {
            Ok(())
        } else {
            Err(ConnectionInvalidError::new(
                Self::NAME,
                format!("{} is not connected", connection.connection_name()),
            ))
        }
    }
}

impl HealthCheck for ConnectedCheck {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn after_new_connection(
        &self,
        connection: &dyn PooledConnection,
    ) -> Result<(), ConnectionInvalidError> {
        Self::check(connection)
    }

    fn after_authentication(
        &self,
        connection: &dyn PooledConnection,
        _bind_result: &LdapResult,
    ) -> Result<(), ConnectionInvalidError> {
        Self::check(connection)
    }

    fn before_checkout(
        &self,
        connection: &dyn PooledConnection,
    ) -> Result<(), ConnectionInvalidError> {
        Self::check(connection)
    }

    fn before_release(
        &self,
        connection: &dyn PooledConnection,
    ) -> Result<(), ConnectionInvalidError> {
        Self::check(connection)
    }

    fn continued_use(
        &self,
        connection: &dyn PooledConnection,
    ) -> Result<(), ConnectionInvalidError> {
        Self::check(connection)
    }

    fn after_operation_exception(
        &self,
        connection: &dyn PooledConnection,
        error: &ProtocolError,
    ) -> Result<(), ConnectionInvalidError> {
        Self::check(connection).map_err(|e| e.with_cause(error.clone()))
    }
}

/// Retires connections older than a maximum age at checkout and during
/// continued-use validation.
#[derive(Debug, Clone, Copy)]
pub struct MaxConnectionAgeCheck {
    max_age: Duration,
}

impl MaxConnectionAgeCheck {
    const NAME: &'static str = "MaxConnectionAgeCheck";

    /// # Errors
    /// Returns [`ConfigError::Invalid`] for a zero `max_age`.
    pub fn new(max_age: Duration) -> Result<Self, ConfigError> {
        if max_age.is_zero() {
            return Err(ConfigError::Invalid(
                "maximum connection age must be greater than 0".to_string(),
            ));
        }
        Ok(Self { max_age })
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    fn check(&self, connection: &dyn PooledConnection) -> Result<(), ConnectionInvalidError> {
        let age = connection.established_at().elapsed();
        if age <= self.max_age {
            return Ok(());
        }
        Err(ConnectionInvalidError::new(
            Self::NAME,
            format!(
                "{} was established {} ms ago, maximum age is {} ms",
                connection.connection_name(),
                age.as_millis(),
                self.max_age.as_millis()
            ),
        ))
    }
}

impl HealthCheck for MaxConnectionAgeCheck {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn before_checkout(
        &self,
        connection: &dyn PooledConnection,
    ) -> Result<(), ConnectionInvalidError> {
        self.check(connection)
    }

    fn continued_use(
        &self,
        connection: &dyn PooledConnection,
    ) -> Result<(), ConnectionInvalidError> {
        self.check(connection)
    }
}

/// After a failed operation, rejects the connection when the result code
/// means it can no longer be trusted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultCodeCheck;

impl HealthCheck for ResultCodeCheck {
    fn name(&self) -> &str {
        "ResultCodeCheck"
    }

    fn after_operation_exception(
        &self,
        connection: &dyn PooledConnection,
        error: &ProtocolError,
    ) -> Result<(), ConnectionInvalidError> {
        if error.result_code.is_connection_usable() {
            return Ok(());
        }
        Err(ConnectionInvalidError::new(
            self.name(),
            format!(
                "operation on {} failed with result code {}",
                connection.connection_name(),
                error.result_code
            ),
        )
        .with_cause(error.clone()))
    }
}
