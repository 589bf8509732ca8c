//! Per-connection intake: deadline, read, validate.

use std::collections::BTreeSet;
use std::os::unix::net::UnixStream;
use std::time::Duration;

use crate::message::{Message, MessageType};

use super::connection::Connection;
use super::events::{DropReason, ServerEvents};
use super::handoff::Request;

/// Payload of the error frame sent for unrecognised message types.
pub const INVALID_MESSAGE: &str = "invalid message";

/// The closed set of request types a server hands off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedTypes {
    kinds: BTreeSet<u16>,
}

impl AcceptedTypes {
    /// Queries and re-authentication requests.
    #[must_use]
    pub fn broad() -> Self {
        Self::from_kinds([MessageType::QUERY, MessageType::RELOGIN])
    }

    /// Queries only.
    #[must_use]
    pub fn query_only() -> Self {
        Self::from_kinds([MessageType::QUERY])
    }

    /// An explicit set of accepted types.
    #[must_use]
    pub fn from_kinds(kinds: impl IntoIterator<Item = MessageType>) -> Self {
        Self {
            kinds: kinds.into_iter().map(MessageType::raw).collect(),
        }
    }

    /// Returns true when `kind` is accepted.
    #[must_use]
    pub fn contains(&self, kind: MessageType) -> bool {
        self.kinds.contains(&kind.raw())
    }
}

impl Default for AcceptedTypes {
    fn default() -> Self {
        Self::broad()
    }
}

/// Runs intake on a freshly accepted stream.
///
/// Returns the request to hand off, or `None` when the connection was closed
/// because of a local fault or an unrecognised message type. Rejected
/// requests receive one error frame and are never forwarded.
pub(crate) fn receive(
    stream: UnixStream,
    timeout: Duration,
    accepted: &AcceptedTypes,
    events: &dyn ServerEvents,
) -> Option<Request> {
    let mut connection = match Connection::with_deadline(stream, timeout) {
        Ok(connection) => connection,
        Err(error) => {
            events.connection_dropped(DropReason::Deadline(&error));
            return None;
        }
    };

    let message = match connection.read_message() {
        Ok(message) => message,
        Err(error) => {
            events.connection_dropped(DropReason::Read(&error));
            connection.close();
            return None;
        }
    };

    if !accepted.contains(message.kind()) {
        let reply = connection.reply(&Message::error(INVALID_MESSAGE));
        events.message_rejected(message.kind(), reply.as_ref().err());
        connection.close();
        return None;
    }

    Some(Request::new(message, connection))
}
