//! Pooled-connection health checks.
//!
//! A connection pool calls the six [`HealthCheck`] hooks at the matching
//! lifecycle transitions and discards the connection when one returns a
//! [`ConnectionInvalidError`](crate::error::ConnectionInvalidError). Several
//! checks compose into a [`HealthCheckChain`].

mod chain;
mod check;
mod checks;

pub use chain::HealthCheckChain;
pub use check::{HealthCheck, PooledConnection};
pub use checks::{ConnectedCheck, MaxConnectionAgeCheck, ResultCodeCheck};
