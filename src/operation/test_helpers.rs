//! In-memory connection used by unit tests.

use std::sync::Mutex;

use super::{Connection, MessageId};
use crate::config::ConnectionOptions;
use crate::error::{ProtocolError, TransportError};
use crate::operation::ResultCode;

#[derive(Debug, Default)]
pub(crate) struct StubConnection {
    options: ConnectionOptions,
    fail_transmit: bool,
    fail_deregister: bool,
    fail_abandon: bool,
    transmitted: Mutex<Vec<(MessageId, Vec<u8>)>>,
    deregistered: Mutex<Vec<MessageId>>,
    abandoned: Mutex<Vec<MessageId>>,
}

impl StubConnection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_options(options: ConnectionOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub(crate) fn failing_transmit(mut self) -> Self {
        self.fail_transmit = true;
        self
    }

    pub(crate) fn failing_deregister(mut self) -> Self {
        self.fail_deregister = true;
        self
    }

    pub(crate) fn failing_abandon(mut self) -> Self {
        self.fail_abandon = true;
        self
    }

    pub(crate) fn transmitted(&self) -> Vec<(MessageId, Vec<u8>)> {
        self.transmitted.lock().unwrap().clone()
    }

    pub(crate) fn deregistered(&self) -> Vec<MessageId> {
        self.deregistered.lock().unwrap().clone()
    }

    pub(crate) fn abandoned(&self) -> Vec<MessageId> {
        self.abandoned.lock().unwrap().clone()
    }
}

impl Connection for StubConnection {
    fn transmit(&self, message_id: MessageId, request: &[u8]) -> Result<(), TransportError> {
        if self.fail_transmit {
            return Err(TransportError::Closed);
        }
        self.transmitted
            .lock()
            .unwrap()
            .push((message_id, request.to_vec()));
        Ok(())
    }

    fn deregister_pending_response(&self, message_id: MessageId) -> Result<(), TransportError> {
        self.deregistered.lock().unwrap().push(message_id);
        if self.fail_deregister {
            return Err(TransportError::Rejected("not registered".to_string()));
        }
        Ok(())
    }

    fn abandon(&self, message_id: MessageId) -> Result<(), ProtocolError> {
        self.abandoned.lock().unwrap().push(message_id);
        if self.fail_abandon {
            return Err(ProtocolError::new(ResultCode::SERVER_DOWN, "socket closed"));
        }
        Ok(())
    }

    fn options(&self) -> &ConnectionOptions {
        &self.options
    }
}
