//! The agent's connection server.
//!
//! A [`Server`] binds a Unix socket, accepts clients on a background thread,
//! and runs intake for each connection synchronously on that thread: arm a
//! deadline, read one frame, validate its type. Validated requests are
//! published on a zero-capacity channel read through [`Requests`], so a
//! stalled consumer stalls acceptance and requests are delivered in accept
//! order.
//!
//! ```no_run
//! use fwid_api::{Message, Server};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = Server::new("/tmp/fw-id-agent-1000");
//! server.start()?;
//! let requests = server.requests();
//! let consumer = std::thread::spawn(move || {
//!     for request in requests.iter() {
//!         let (_message, mut connection) = request.into_parts();
//!         let _ = connection.reply(&Message::ok());
//!     }
//! });
//! server.stop()?;
//! consumer.join().ok();
//! # Ok(())
//! # }
//! ```

mod accept;
mod connection;
mod errors;
mod events;
mod handoff;
mod intake;
#[cfg(test)]
pub(crate) mod test_utils;

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::net::UnixListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use fwid_config::DEFAULT_REQUEST_TIMEOUT;

pub use self::connection::Connection;
pub use self::errors::ServerError;
pub use self::events::{DropReason, ServerEvents, StructuredServerEvents};
pub use self::handoff::{Request, Requests};
pub use self::intake::{AcceptedTypes, INVALID_MESSAGE};

use self::accept::{AcceptLoop, remove_socket_file};
use self::connection::deadline_after;

pub(crate) const SERVER_TARGET: &str = "fwid_api::server";

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const SOCKET_MODE: u32 = 0o700;
const ACCEPT_THREAD_NAME: &str = "fwid-accept";

/// Tunables for a [`Server`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    /// Absolute deadline for each client exchange, set once at accept time.
    pub request_timeout: Duration,
    /// Request types that are handed off; anything else is rejected.
    pub accepted: AcceptedTypes,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            accepted: AcceptedTypes::default(),
        }
    }
}

impl ServerOptions {
    /// Replaces the per-connection deadline.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Replaces the accepted request types.
    #[must_use]
    pub fn with_accepted(mut self, accepted: AcceptedTypes) -> Self {
        self.accepted = accepted;
        self
    }
}

/// Unix socket server handing validated requests to a consumer.
pub struct Server {
    socket_path: Utf8PathBuf,
    options: ServerOptions,
    events: Arc<dyn ServerEvents>,
    stopping: Arc<AtomicBool>,
    sender: Option<SyncSender<Request>>,
    requests: Requests,
    accept_loop: Option<JoinHandle<()>>,
}

impl Server {
    /// Creates a server for `socket_path` with default options.
    #[must_use]
    pub fn new(socket_path: impl Into<Utf8PathBuf>) -> Self {
        Self::with_options(socket_path, ServerOptions::default())
    }

    /// Creates a server for `socket_path` with explicit options.
    #[must_use]
    pub fn with_options(socket_path: impl Into<Utf8PathBuf>, options: ServerOptions) -> Self {
        let (sender, requests) = handoff::channel();
        Self {
            socket_path: socket_path.into(),
            options,
            events: Arc::new(StructuredServerEvents),
            stopping: Arc::new(AtomicBool::new(false)),
            sender: Some(sender),
            requests,
            accept_loop: None,
        }
    }

    /// Routes lifecycle and connection events to `events`.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn ServerEvents>) -> Self {
        self.events = events;
        self
    }

    /// Path of the listening socket.
    #[must_use]
    pub fn socket_path(&self) -> &Utf8Path {
        &self.socket_path
    }

    /// Read side of the handoff channel.
    ///
    /// Consumers must keep reading until it yields `None`; the accept loop
    /// cannot make progress while a request waits to be received.
    #[must_use]
    pub fn requests(&self) -> Requests {
        self.requests.clone()
    }

    /// Returns true while the accept loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.accept_loop
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Binds the socket and launches the accept loop.
    ///
    /// A leftover socket file is removed first. Restricting the socket to
    /// its owner is attempted but a failure is only reported, not fatal.
    /// Returns as soon as the accept thread is running.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the server is already running or was
    /// stopped, when the request timeout cannot form a deadline, or when the
    /// listener cannot be bound or launched.
    pub fn start(&mut self) -> Result<(), ServerError> {
        if self.accept_loop.is_some() {
            return Err(ServerError::AlreadyStarted {
                path: self.socket_path.to_string(),
            });
        }
        if self.sender.is_none() {
            return Err(ServerError::Stopped {
                path: self.socket_path.to_string(),
            });
        }
        if deadline_after(self.options.request_timeout).is_err() {
            return Err(ServerError::InvalidTimeout {
                timeout: self.options.request_timeout,
            });
        }

        self.remove_stale_socket();
        let listener = UnixListener::bind(self.socket_path.as_std_path()).map_err(|source| {
            ServerError::Bind {
                path: self.socket_path.to_string(),
                source,
            }
        })?;
        restrict_permissions(&self.socket_path, self.events.as_ref());
        if let Err(source) = listener.set_nonblocking(true) {
            drop(listener);
            remove_socket_file(&self.socket_path);
            return Err(ServerError::NonBlocking { source });
        }

        let Some(sender) = self.sender.take() else {
            return Err(ServerError::Stopped {
                path: self.socket_path.to_string(),
            });
        };
        let accept_loop = AcceptLoop {
            listener: Box::new(listener),
            path: self.socket_path.clone(),
            stopping: Arc::clone(&self.stopping),
            sender,
            options: self.options.clone(),
            events: Arc::clone(&self.events),
        };
        let handle = thread::Builder::new()
            .name(ACCEPT_THREAD_NAME.to_owned())
            .spawn(move || accept_loop.run())
            .map_err(|source| {
                remove_socket_file(&self.socket_path);
                ServerError::Spawn { source }
            })?;
        self.accept_loop = Some(handle);
        Ok(())
    }

    /// Stops accepting and waits for the accept loop to exit.
    ///
    /// Requests still waiting in the handoff are received and dropped, which
    /// closes their connections. When this returns the handoff channel is
    /// closed, the listener is released, and no further requests will be
    /// delivered. Calling `stop` again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::ThreadPanic`] when the accept loop panicked.
    pub fn stop(&mut self) -> Result<(), ServerError> {
        self.stopping.store(true, Ordering::SeqCst);
        // Never started: closing the sender is all that is needed to end
        // consumers' read loops.
        drop(self.sender.take());
        let Some(handle) = self.accept_loop.take() else {
            return Ok(());
        };

        while let Some(request) = self.requests.recv() {
            debug!(
                target: SERVER_TARGET,
                message_type = %request.message().kind(),
                "discarding request received during shutdown"
            );
        }
        handle.join().map_err(|_| ServerError::ThreadPanic)
    }

    fn remove_stale_socket(&self) {
        match fs::remove_file(self.socket_path.as_std_path()) {
            Ok(()) => self.events.stale_socket_removed(&self.socket_path),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => debug!(
                target: SERVER_TARGET,
                %error,
                socket = %self.socket_path,
                "could not remove existing socket file"
            ),
        }
    }
}

// Failure is reported and otherwise ignored; the socket stays usable.
fn restrict_permissions(path: &Utf8Path, events: &dyn ServerEvents) {
    let permissions = fs::Permissions::from_mode(SOCKET_MODE);
    if let Err(error) = fs::set_permissions(path.as_std_path(), permissions) {
        events.permissions_failed(path, &error);
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stopping.store(true, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Server")
            .field("socket_path", &self.socket_path)
            .field("options", &self.options)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
