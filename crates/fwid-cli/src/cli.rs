//! CLI argument definitions.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

use fwid_config::DEFAULT_REQUEST_TIMEOUT_SECS;

/// Command-line interface for the fw-id agent.
#[derive(Parser, Debug)]
#[command(name = "fwid", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Agent socket; defaults to the invoking user's socket.
    #[arg(long, value_name = "PATH")]
    pub(crate) socket: Option<Utf8PathBuf>,
    /// Seconds to wait for the agent to answer.
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub(crate) timeout: u64,
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Requests understood by the agent.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Prints the agent status document.
    Status,
    /// Asks the agent to authenticate again.
    Relogin,
}
