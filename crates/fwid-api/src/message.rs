//! Typed messages exchanged between the agent and its clients.

use std::fmt;

/// Discriminant carried in every frame header.
///
/// The known set is closed, but any raw value can be represented so that
/// frames with unrecognised types can still be read and rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageType(u16);

impl MessageType {
    /// Error reply carrying a human-readable payload.
    pub const ERROR: Self = Self(1);
    /// Client request for the agent status.
    pub const QUERY: Self = Self(2);
    /// Agent reply to [`Self::QUERY`].
    pub const QUERY_RESULT: Self = Self(3);
    /// Client request to re-run authentication.
    pub const RELOGIN: Self = Self(4);
    /// Generic acknowledgement.
    pub const OK: Self = Self(5);

    /// Wraps a raw wire value.
    #[must_use]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Returns the raw wire value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    const fn name(self) -> Option<&'static str> {
        match self.0 {
            1 => Some("error"),
            2 => Some("query"),
            3 => Some("query_result"),
            4 => Some("relogin"),
            5 => Some("ok"),
            _ => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => formatter.write_str(name),
            None => write!(formatter, "unknown({})", self.0),
        }
    }
}

/// A single framed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    kind: MessageType,
    payload: Vec<u8>,
}

impl Message {
    /// Builds a message from its parts.
    #[must_use]
    pub fn new(kind: MessageType, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Error reply with the given payload.
    #[must_use]
    pub fn error(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(MessageType::ERROR, payload)
    }

    /// Empty status query.
    #[must_use]
    pub fn query() -> Self {
        Self::new(MessageType::QUERY, Vec::new())
    }

    /// Status reply.
    #[must_use]
    pub fn query_result(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(MessageType::QUERY_RESULT, payload)
    }

    /// Empty re-authentication request.
    #[must_use]
    pub fn relogin() -> Self {
        Self::new(MessageType::RELOGIN, Vec::new())
    }

    /// Empty acknowledgement.
    #[must_use]
    pub fn ok() -> Self {
        Self::new(MessageType::OK, Vec::new())
    }

    /// Message discriminant.
    #[must_use]
    pub const fn kind(&self) -> MessageType {
        self.kind
    }

    /// Raw payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consumes the message and returns its payload.
    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}
