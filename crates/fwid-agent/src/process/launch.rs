//! Supervises agent launch sequencing and shutdown.

use tracing::{info, warn};

use fwid_api::{AcceptedTypes, Server, ServerOptions};
use fwid_config::{AcceptedRequests, Config};

use crate::telemetry;
use crate::worker::Worker;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Runs the agent using the production collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] when any launch or shutdown step fails.
pub fn run_agent() -> Result<(), LaunchError> {
    let config = Config::load()?;
    // Handlers go in before the socket exists so an early SIGTERM still
    // reaches the cleanup path.
    let shutdown = SystemShutdownSignal::install()?;
    run_agent_with(&config, &shutdown)
}

/// Runs the agent with injected configuration and shutdown source.
///
/// # Errors
///
/// Returns [`LaunchError`] when any launch or shutdown step fails.
pub fn run_agent_with<S>(config: &Config, shutdown: &S) -> Result<(), LaunchError>
where
    S: ShutdownSignal + ?Sized,
{
    telemetry::initialise(config)?;
    let socket_path = config.resolve_socket_path()?;
    info!(
        target: PROCESS_TARGET,
        socket = %socket_path,
        accepted = %config.accepted_requests(),
        "starting agent runtime"
    );

    let mut server = Server::with_options(socket_path.clone(), server_options(config));
    server.start()?;
    let worker = match Worker::new(socket_path).spawn(server.requests()) {
        Ok(worker) => worker,
        Err(source) => {
            if let Err(error) = server.stop() {
                warn!(target: PROCESS_TARGET, %error, "failed to stop socket server");
            }
            return Err(LaunchError::WorkerSpawn { source });
        }
    };

    let waited = shutdown.wait();
    let stopped = server.stop();
    let handled = worker.join().map_err(|_| LaunchError::WorkerPanic)?;
    waited?;
    stopped?;
    info!(
        target: PROCESS_TARGET,
        handled,
        "shutdown sequence completed"
    );
    Ok(())
}

/// Derives server options from the agent configuration.
#[must_use]
pub fn server_options(config: &Config) -> ServerOptions {
    let accepted = match config.accepted_requests() {
        AcceptedRequests::Broad => AcceptedTypes::broad(),
        AcceptedRequests::QueryOnly => AcceptedTypes::query_only(),
    };
    ServerOptions::default()
        .with_request_timeout(config.request_timeout())
        .with_accepted(accepted)
}
