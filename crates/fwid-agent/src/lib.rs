//! Runtime for the fw-id agent daemon.
//!
//! The agent loads its configuration, installs structured telemetry, and
//! serves the per-user socket through [`fwid_api::Server`]. A single worker
//! thread consumes validated requests and answers status queries and
//! re-authentication requests until a termination signal arrives.

mod process;
pub mod telemetry;
mod worker;

pub use process::{
    LaunchError, SHUTDOWN_SIGNALS, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_agent,
    run_agent_with, server_options,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use worker::{AgentStatus, Worker, WorkerError};
