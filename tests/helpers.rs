//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Instant;

use dirwire::error::{ProtocolError, TransportError};
use dirwire::{Connection, ConnectionOptions, MessageId, PooledConnection};

/// Route `log` output to the test harness. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Connection that records what the engine asked of it.
#[derive(Debug, Default)]
pub struct RecordingConnection {
    options: ConnectionOptions,
    transmitted: Mutex<Vec<MessageId>>,
    deregistered: Mutex<Vec<MessageId>>,
    abandoned: Mutex<Vec<MessageId>>,
}

impl RecordingConnection {
    pub fn new(options: ConnectionOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn transmitted(&self) -> Vec<MessageId> {
        self.transmitted.lock().unwrap().clone()
    }

    pub fn deregistered(&self) -> Vec<MessageId> {
        self.deregistered.lock().unwrap().clone()
    }

    pub fn abandoned(&self) -> Vec<MessageId> {
        self.abandoned.lock().unwrap().clone()
    }
}

impl Connection for RecordingConnection {
    fn transmit(&self, message_id: MessageId, _request: &[u8]) -> Result<(), TransportError> {
        self.transmitted.lock().unwrap().push(message_id);
        Ok(())
    }

    fn deregister_pending_response(&self, message_id: MessageId) -> Result<(), TransportError> {
        self.deregistered.lock().unwrap().push(message_id);
        Ok(())
    }

    fn abandon(&self, message_id: MessageId) -> Result<(), ProtocolError> {
        self.abandoned.lock().unwrap().push(message_id);
        Ok(())
    }

    fn options(&self) -> &ConnectionOptions {
        &self.options
    }
}

/// Pooled connection with a fixed state.
pub struct FixedConnection {
    pub connected: bool,
    pub established_at: Instant,
}

impl FixedConnection {
    pub fn healthy() -> Self {
        Self {
            connected: true,
            established_at: Instant::now(),
        }
    }
}

impl PooledConnection for FixedConnection {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn established_at(&self) -> Instant {
        self.established_at
    }

    fn connection_name(&self) -> &str {
        "directory.example.com:389"
    }
}
