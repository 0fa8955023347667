//! Ordered, fail-fast composition of health checks.

use std::sync::Arc;

use log::debug;

use super::{HealthCheck, PooledConnection};
use crate::error::{ConnectionInvalidError, ProtocolError};
use crate::operation::LdapResult;

/// Runs its checks in construction order and stops at the first failure.
///
/// The list is fixed at construction, so a shared chain is traversed without
/// locking. An empty chain passes every hook.
#[derive(Debug, Clone, Default)]
pub struct HealthCheckChain {
    checks: Vec<Arc<dyn HealthCheck>>,
}

impl HealthCheckChain {
    pub fn new(checks: Vec<Arc<dyn HealthCheck>>) -> Self {
        Self { checks }
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn checks(&self) -> &[Arc<dyn HealthCheck>] {
        &self.checks
    }

    /// Apply `hook` to each check in order, returning the first error.
    fn run<F>(
        &self,
        hook_name: &str,
        connection: &dyn PooledConnection,
        mut hook: F,
    ) -> Result<(), ConnectionInvalidError>
    where
        F: FnMut(&dyn HealthCheck) -> Result<(), ConnectionInvalidError>,
    {
        for check in &self.checks {
            if let Err(e) = hook(check.as_ref()) {
                debug!(
                    target: "dirwire::health",
                    "{} rejected {} in {}: {}",
                    check.name(),
                    connection.connection_name(),
                    hook_name,
                    e.message
                );
                return Err(e);
            }
        }
        Ok(())
    }
}

impl FromIterator<Arc<dyn HealthCheck>> for HealthCheckChain {
    fn from_iter<I: IntoIterator<Item = Arc<dyn HealthCheck>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl HealthCheck for HealthCheckChain {
    fn name(&self) -> &str {
        "HealthCheckChain"
    }

    fn after_new_connection(
        &self,
        connection: &dyn PooledConnection,
    ) -> Result<(), ConnectionInvalidError> {
        self.run("after_new_connection", connection, |check| {
            check.after_new_connection(connection)
        })
    }

    fn after_authentication(
        &self,
        connection: &dyn PooledConnection,
        bind_result: &LdapResult,
    ) -> Result<(), ConnectionInvalidError> {
        self.run("after_authentication", connection, |check| {
            check.after_authentication(connection, bind_result)
        })
    }

    fn before_checkout(
        &self,
        connection: &dyn PooledConnection,
    ) -> Result<(), ConnectionInvalidError> {
        self.run("before_checkout", connection, |check| {
            check.before_checkout(connection)
        })
    }

    fn before_release(
        &self,
        connection: &dyn PooledConnection,
    ) -> Result<(), ConnectionInvalidError> {
        self.run("before_release", connection, |check| {
            check.before_release(connection)
        })
    }

    fn continued_use(
        &self,
        connection: &dyn PooledConnection,
    ) -> Result<(), ConnectionInvalidError> {
        self.run("continued_use", connection, |check| {
            check.continued_use(connection)
        })
    }

    fn after_operation_exception(
        &self,
        connection: &dyn PooledConnection,
        error: &ProtocolError,
    ) -> Result<(), ConnectionInvalidError> {
        self.run("after_operation_exception", connection, |check| {
            check.after_operation_exception(connection, error)
        })
    }
}
