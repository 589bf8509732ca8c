//! Blocking client for short-lived processes talking to the agent.

use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::net::UnixStream;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use socket2::{Domain, SockAddr, Socket, Type};
use thiserror::Error;

use fwid_config::{DEFAULT_REQUEST_TIMEOUT, SocketPathError, user_socket_file};

use crate::codec::{self, CodecError};
use crate::message::{Message, MessageType};

/// Upper bound on establishing the socket connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors surfaced while talking to the agent.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The socket could not be reached.
    #[error("failed to connect to agent at {path}: {source}")]
    Connect {
        /// Socket path that was tried.
        path: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Framing or IO failed mid-exchange.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The agent answered with an error frame.
    #[error("agent rejected the request: {0}")]
    Rejected(String),
    /// The agent answered with an unexpected message type.
    #[error("expected {expected} reply, got {actual}")]
    UnexpectedReply {
        /// Reply type the request calls for.
        expected: MessageType,
        /// Reply type actually received.
        actual: MessageType,
    },
}

impl ClientError {
    /// Returns true when the failure means no agent is listening.
    #[must_use]
    pub fn is_agent_not_running(&self) -> bool {
        match self {
            Self::Connect { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
            ),
            _ => false,
        }
    }
}

/// Sends single requests to the agent socket.
#[derive(Debug, Clone)]
pub struct Client {
    socket_path: Utf8PathBuf,
    timeout: Duration,
}

impl Client {
    /// Targets the agent listening on `socket_path`.
    #[must_use]
    pub fn new(socket_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Targets the invoking user's default agent socket.
    ///
    /// # Errors
    ///
    /// Returns [`SocketPathError`] when the user cannot be resolved.
    pub fn for_current_user() -> Result<Self, SocketPathError> {
        user_socket_file().map(Self::new)
    }

    /// Bounds each read and write of an exchange.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Socket path this client talks to.
    #[must_use]
    pub fn socket_path(&self) -> &Utf8Path {
        &self.socket_path
    }

    /// Sends `message` and returns the agent's reply, whatever its type.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when connecting or the exchange fails.
    pub fn send(&self, message: &Message) -> Result<Message, ClientError> {
        let mut stream = self.connect()?;
        stream.set_read_timeout(Some(self.timeout)).map_err(CodecError::from)?;
        stream.set_write_timeout(Some(self.timeout)).map_err(CodecError::from)?;
        codec::write_message(&mut stream, message)?;
        Ok(codec::read_message(&mut stream)?)
    }

    /// Queries the agent status and returns the raw status document.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure or a non-status reply.
    pub fn status(&self) -> Result<Vec<u8>, ClientError> {
        let reply = self.send(&Message::query())?;
        expect_reply(reply, MessageType::QUERY_RESULT).map(Message::into_payload)
    }

    /// Asks the agent to re-run authentication.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure or when the agent does
    /// not acknowledge the request.
    pub fn relogin(&self) -> Result<(), ClientError> {
        let reply = self.send(&Message::relogin())?;
        expect_reply(reply, MessageType::OK).map(drop)
    }

    fn connect(&self) -> Result<UnixStream, ClientError> {
        connect_unix(&self.socket_path).map_err(|source| ClientError::Connect {
            path: self.socket_path.to_string(),
            source,
        })
    }
}

fn connect_unix(path: &Utf8Path) -> io::Result<UnixStream> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path.as_std_path())?;
    socket.connect_timeout(&address, CONNECT_TIMEOUT)?;
    Ok(UnixStream::from(OwnedFd::from(socket)))
}

fn expect_reply(reply: Message, expected: MessageType) -> Result<Message, ClientError> {
    if reply.kind() == expected {
        return Ok(reply);
    }
    if reply.kind() == MessageType::ERROR {
        return Err(ClientError::Rejected(
            String::from_utf8_lossy(reply.payload()).into_owned(),
        ));
    }
    Err(ClientError::UnexpectedReply {
        expected,
        actual: reply.kind(),
    })
}

#[cfg(test)]
mod tests {
    use std::os::unix::net::UnixListener;
    use std::thread;

    use rstest::rstest;

    use super::*;
    use crate::server::test_utils::SocketDir;

    fn serve_once(dir: &SocketDir, reply: Message) -> thread::JoinHandle<Message> {
        let listener = UnixListener::bind(dir.path()).expect("bind listener");
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let request = codec::read_message(&mut stream).expect("read request");
            codec::write_message(&mut stream, &reply).expect("write reply");
            request
        })
    }

    #[rstest]
    fn status_returns_payload() {
        let dir = SocketDir::new();
        let server = serve_once(&dir, Message::query_result("{}"));

        let payload = Client::new(dir.path()).status().expect("status");

        assert_eq!(payload, b"{}");
        assert_eq!(server.join().expect("server thread"), Message::query());
    }

    #[rstest]
    fn error_reply_becomes_rejection() {
        let dir = SocketDir::new();
        let server = serve_once(&dir, Message::error("invalid message"));

        let error = Client::new(dir.path()).relogin().expect_err("relogin rejected");

        assert!(matches!(error, ClientError::Rejected(ref text) if text == "invalid message"));
        server.join().expect("server thread");
    }

    #[rstest]
    fn unexpected_reply_type_is_reported() {
        let dir = SocketDir::new();
        let server = serve_once(&dir, Message::ok());

        let error = Client::new(dir.path()).status().expect_err("wrong reply");

        assert!(matches!(
            error,
            ClientError::UnexpectedReply {
                expected: MessageType::QUERY_RESULT,
                actual: MessageType::OK,
            }
        ));
        server.join().expect("server thread");
    }

    #[rstest]
    fn missing_socket_means_agent_not_running() {
        let dir = SocketDir::new();
        let error = Client::new(dir.path()).status().expect_err("no agent");
        assert!(error.is_agent_not_running());
    }
}
