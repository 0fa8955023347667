//! Connection-wide options consulted by the async engine.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::operation::OperationKind;

/// Default response timeout: five minutes.
const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 300_000;
/// Default number of ids probed after wraparound before giving up.
const DEFAULT_MAX_MESSAGE_ID_PROBES: u32 = 1024;

/// Options shared by every operation on one connection.
///
/// # Example (TOML)
///
/// ```toml
/// abandon_on_timeout = true
/// response_timeout_ms = 30000
///
/// [response_timeouts_ms]
/// search = 120000
/// compare = 0          # no timeout for compares
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionOptions {
    /// Send an abandon request when an operation times out.
    pub abandon_on_timeout: bool,
    /// Response timeout for kinds without an override; `0` disables it.
    pub response_timeout_ms: u64,
    /// Per-kind response timeouts keyed by kind name (`add`, `search`, ...);
    /// `0` disables the timeout for that kind.
    pub response_timeouts_ms: HashMap<String, u64>,
    /// Ids to probe when the allocated id is still pending after wraparound.
    pub max_message_id_probes: u32,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            abandon_on_timeout: false,
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
            response_timeouts_ms: HashMap::new(),
            max_message_id_probes: DEFAULT_MAX_MESSAGE_ID_PROBES,
        }
    }
}

impl ConnectionOptions {
    /// Parse and validate options from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let options: Self = toml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_message_id_probes == 0 {
            return Err(ConfigError::Invalid(
                "max_message_id_probes must be greater than 0".to_string(),
            ));
        }
        for key in self.response_timeouts_ms.keys() {
            if !OperationKind::ALL.iter().any(|kind| kind.as_str() == key) {
                return Err(ConfigError::Invalid(format!(
                    "unknown operation kind in response_timeouts_ms: {key}"
                )));
            }
        }
        Ok(())
    }

    pub fn with_abandon_on_timeout(mut self, abandon: bool) -> Self {
        self.abandon_on_timeout = abandon;
        self
    }

    /// Set the timeout for one operation kind; `None` disables it.
    pub fn with_response_timeout(mut self, kind: OperationKind, timeout: Option<Duration>) -> Self {
        let millis = timeout.map_or(0, |t| t.as_millis().min(u64::MAX as u128) as u64);
        self.response_timeouts_ms
            .insert(kind.as_str().to_string(), millis);
        self
    }

    /// Response timeout to arm for `kind`, or `None` for no timer.
    pub fn response_timeout_for(&self, kind: OperationKind) -> Option<Duration> {
        let millis = self
            .response_timeouts_ms
            .get(kind.as_str())
            .copied()
            .unwrap_or(self.response_timeout_ms);
        (millis > 0).then(|| Duration::from_millis(millis))
    }
}
