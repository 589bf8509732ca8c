//! Error types for server lifecycle operations.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by [`super::Server::start`] and [`super::Server::stop`].
///
/// Every variant is fatal for the caller: the server cannot serve, or cannot
/// prove that it shut down cleanly.
#[derive(Debug, Error)]
pub enum ServerError {
    /// `start` was called while the accept loop is running.
    #[error("server is already running on {path}")]
    AlreadyStarted {
        /// Socket path of the running server.
        path: String,
    },
    /// The request timeout is zero or too large to form a deadline.
    #[error("request timeout {timeout:?} cannot be used as a connection deadline")]
    InvalidTimeout {
        /// Rejected timeout.
        timeout: Duration,
    },
    /// `start` was called after `stop`; the handoff channel is closed.
    #[error("server on {path} has been stopped and cannot be restarted")]
    Stopped {
        /// Socket path of the stopped server.
        path: String,
    },
    /// Binding the listening socket failed.
    #[error("failed to bind unix listener at {path}: {source}")]
    Bind {
        /// Socket path that could not be bound.
        path: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Switching the listener to non-blocking mode failed.
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The accept thread could not be spawned.
    #[error("failed to spawn accept loop: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The accept thread panicked, so listener cleanup cannot be confirmed.
    #[error("accept loop thread panicked")]
    ThreadPanic,
}
