//! Process lifecycle: launch sequencing and shutdown signalling.

mod errors;
mod launch;
mod shutdown;

pub use errors::LaunchError;
pub use launch::{run_agent, run_agent_with, server_options};
pub use shutdown::{SHUTDOWN_SIGNALS, ShutdownError, ShutdownSignal, SystemShutdownSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
