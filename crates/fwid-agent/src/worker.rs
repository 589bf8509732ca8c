//! Request consumer answering status queries and re-login requests.

use std::io;
use std::thread::{self, JoinHandle};

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

use fwid_api::{INVALID_MESSAGE, Message, MessageType, Requests};

const WORKER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::worker");
const WORKER_THREAD_NAME: &str = "fwid-worker";

/// Status document returned for `QUERY` requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatus {
    /// Agent version.
    pub version: String,
    /// Start time of the agent, RFC 3339 in UTC.
    pub started_at: String,
    /// Number of re-login requests handled since start.
    pub relogin_requests: u64,
    /// Socket the agent listens on.
    pub socket: String,
}

/// Errors raised while building a status reply.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The start timestamp could not be formatted.
    #[error("failed to format start time: {0}")]
    Timestamp(#[from] time::error::Format),
    /// The status document could not be serialised.
    #[error("failed to serialise status: {0}")]
    Serialise(#[from] serde_json::Error),
}

/// Consumes requests handed off by the connection server.
#[derive(Debug)]
pub struct Worker {
    socket: Utf8PathBuf,
    started_at: OffsetDateTime,
    relogin_requests: u64,
}

impl Worker {
    /// Creates a worker reporting `socket` in its status.
    #[must_use]
    pub fn new(socket: Utf8PathBuf) -> Self {
        Self {
            socket,
            started_at: OffsetDateTime::now_utc(),
            relogin_requests: 0,
        }
    }

    /// Current status snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Timestamp`] when the start time cannot be
    /// rendered.
    pub fn status(&self) -> Result<AgentStatus, WorkerError> {
        Ok(AgentStatus {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            started_at: self.started_at.format(&Rfc3339)?,
            relogin_requests: self.relogin_requests,
            socket: self.socket.to_string(),
        })
    }

    /// Builds the reply for one request.
    #[must_use]
    pub fn handle(&mut self, message: &Message) -> Message {
        match message.kind() {
            MessageType::QUERY => self.status_reply(),
            MessageType::RELOGIN => {
                self.relogin_requests += 1;
                info!(
                    target: WORKER_TARGET,
                    relogin_requests = self.relogin_requests,
                    "re-login requested"
                );
                Message::ok()
            }
            kind => {
                warn!(
                    target: WORKER_TARGET,
                    message_type = %kind,
                    "no handler for message type"
                );
                Message::error(INVALID_MESSAGE)
            }
        }
    }

    /// Answers requests until the server closes the channel and returns how
    /// many were handled.
    #[must_use]
    pub fn run(mut self, requests: &Requests) -> u64 {
        let mut handled = 0;
        for request in requests.iter() {
            let (message, mut connection) = request.into_parts();
            let reply = self.handle(&message);
            if let Err(error) = connection.reply(&reply) {
                warn!(
                    target: WORKER_TARGET,
                    %error,
                    message_type = %message.kind(),
                    "failed to send reply"
                );
            }
            connection.close();
            handled += 1;
        }
        handled
    }

    /// Runs the worker on its own thread.
    ///
    /// # Errors
    ///
    /// Returns the IO error raised when the thread cannot be spawned.
    pub fn spawn(self, requests: Requests) -> io::Result<JoinHandle<u64>> {
        thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_owned())
            .spawn(move || self.run(&requests))
    }

    fn status_reply(&self) -> Message {
        let encoded = self
            .status()
            .and_then(|status| serde_json::to_vec(&status).map_err(WorkerError::from));
        match encoded {
            Ok(document) => Message::query_result(document),
            Err(error) => {
                warn!(target: WORKER_TARGET, %error, "failed to build status");
                Message::error(error.to_string())
            }
        }
    }
}
