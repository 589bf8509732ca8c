//! Defines the unified error surface for agent launch and supervision.

use std::io;

use thiserror::Error;

use fwid_api::ServerError;
use fwid_config::{ConfigError, SocketPathError};

use crate::telemetry::TelemetryError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising the agent process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration failed to load or holds out-of-range values.
    #[error("invalid configuration: {source}")]
    Config {
        /// Underlying configuration error.
        #[source]
        source: ConfigError,
    },
    /// Telemetry could not be installed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The per-user socket path could not be determined.
    #[error("failed to resolve agent socket: {source}")]
    SocketPath {
        /// Underlying lookup error.
        #[source]
        source: SocketPathError,
    },
    /// The connection server failed to start or stop.
    #[error("agent socket server failed: {source}")]
    Server {
        /// Underlying server error.
        #[source]
        source: ServerError,
    },
    /// The worker thread could not be spawned.
    #[error("failed to spawn request worker: {source}")]
    WorkerSpawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The worker thread panicked.
    #[error("request worker panicked")]
    WorkerPanic,
    /// Waiting for shutdown failed.
    #[error("failed to await shutdown signal: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
}

impl From<ConfigError> for LaunchError {
    fn from(source: ConfigError) -> Self {
        Self::Config { source }
    }
}

impl From<TelemetryError> for LaunchError {
    fn from(source: TelemetryError) -> Self {
        Self::Telemetry { source }
    }
}

impl From<SocketPathError> for LaunchError {
    fn from(source: SocketPathError) -> Self {
        Self::SocketPath { source }
    }
}

impl From<ServerError> for LaunchError {
    fn from(source: ServerError) -> Self {
        Self::Server { source }
    }
}

impl From<ShutdownError> for LaunchError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}
