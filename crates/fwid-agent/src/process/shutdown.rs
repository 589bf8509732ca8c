//! Termination signals that end an agent session.
//!
//! [`SystemShutdownSignal::install`] registers handlers for every signal in
//! [`SHUTDOWN_SIGNALS`] before the socket is bound. A signal that arrives
//! while the server is still starting is queued and ends the session as soon
//! as the agent begins waiting, so the socket file is always unlinked.

use std::fmt;
use std::io;
use std::os::raw::c_int;
use std::sync::{Mutex, PoisonError};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::{debug, info};

use super::PROCESS_TARGET;

/// Signals that stop the agent.
pub const SHUTDOWN_SIGNALS: [c_int; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Source of the event that ends an agent session.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until the agent should stop serving.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the source can no longer deliver.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Failures of a [`ShutdownSignal`].
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Registering the termination signal handlers failed.
    #[error("failed to register termination signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Termination signals registered with the process.
///
/// Dropping the value unregisters the handlers.
pub struct SystemShutdownSignal {
    signals: Mutex<Signals>,
}

impl SystemShutdownSignal {
    /// Registers handlers for [`SHUTDOWN_SIGNALS`].
    ///
    /// From this point on those signals no longer terminate the process;
    /// they are queued until [`ShutdownSignal::wait`] consumes one.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError::Install`] when a handler cannot be
    /// registered.
    pub fn install() -> Result<Self, ShutdownError> {
        let signals =
            Signals::new(SHUTDOWN_SIGNALS).map_err(|source| ShutdownError::Install { source })?;
        debug!(target: PROCESS_TARGET, "termination signal handlers registered");
        Ok(Self {
            signals: Mutex::new(signals),
        })
    }
}

impl fmt::Debug for SystemShutdownSignal {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SystemShutdownSignal")
            .field("signals", &SHUTDOWN_SIGNALS)
            .finish()
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals = self.signals.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(signal) = signals.forever().next() {
            info!(target: PROCESS_TARGET, signal, "termination signal received");
        }
        Ok(())
    }
}
