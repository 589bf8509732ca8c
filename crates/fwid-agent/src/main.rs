//! Entry point for the fw-id agent daemon.

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match fwid_agent::run_agent() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let mut stderr = io::stderr().lock();
            let _ = writeln!(stderr, "fwid-agent: {error}");
            ExitCode::FAILURE
        }
    }
}
