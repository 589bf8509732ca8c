//! CLI entrypoint for talking to the fw-id agent.
//!
//! The binary delegates to [`fwid_cli::run`], which parses arguments, sends a
//! single request to the agent socket, and prints the reply.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    fwid_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
