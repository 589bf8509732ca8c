//! Command-line client for the fw-id agent.
//!
//! Each invocation sends exactly one request to the agent socket and prints
//! the reply. IO streams are injected so the runtime can be exercised from
//! tests without spawning the binary.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use clap::error::ErrorKind;

use fwid_api::Client;
use fwid_config::user_socket_file;

mod cli;
mod errors;

use cli::{Cli, CliCommand};
use errors::AppError;

const RELOGIN_REQUESTED: &str = "relogin requested";

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = write!(stdout, "{error}");
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            let _ = write!(stderr, "{}", AppError::CliUsage(error));
            return ExitCode::FAILURE;
        }
    };

    match execute(&cli, stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<W: Write>(cli: &Cli, stdout: &mut W) -> Result<(), AppError> {
    let socket = match &cli.socket {
        Some(path) => path.clone(),
        None => user_socket_file()?,
    };
    let client = Client::new(socket.clone()).with_timeout(Duration::from_secs(cli.timeout));

    match cli.command {
        CliCommand::Status => {
            let status = client
                .status()
                .map_err(|error| AppError::from_client(error, socket.as_str()))?;
            stdout.write_all(&status).map_err(AppError::Output)?;
            writeln!(stdout).map_err(AppError::Output)
        }
        CliCommand::Relogin => {
            client
                .relogin()
                .map_err(|error| AppError::from_client(error, socket.as_str()))?;
            writeln!(stdout, "{RELOGIN_REQUESTED}").map_err(AppError::Output)
        }
    }
}

#[cfg(test)]
mod tests;
