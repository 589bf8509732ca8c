//! Error types for the CLI runtime.

use std::io;

use thiserror::Error;

use fwid_api::ClientError;
use fwid_config::SocketPathError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to resolve agent socket: {0}")]
    SocketPath(#[from] SocketPathError),
    #[error("fw-id agent is not running (socket {path})")]
    AgentNotRunning { path: String },
    #[error(transparent)]
    Client(ClientError),
    #[error("failed to write output: {0}")]
    Output(io::Error),
}

impl AppError {
    pub(crate) fn from_client(error: ClientError, path: &str) -> Self {
        if error.is_agent_not_running() {
            Self::AgentNotRunning {
                path: path.to_owned(),
            }
        } else {
            Self::Client(error)
        }
    }
}
