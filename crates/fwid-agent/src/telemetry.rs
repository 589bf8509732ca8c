//! Agent logging.
//!
//! The agent writes its events to stderr, where the session manager or
//! journald collects them. JSON output is the default so log shippers can
//! index the connection server's event fields; `compact` is for reading the
//! agent from a terminal.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::subscriber::{SetGlobalDefaultError, set_global_default};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use fwid_config::{Config, LogFormat};

static INSTALLED_FORMAT: OnceCell<LogFormat> = OnceCell::new();

/// Describes the subscriber that owns the process log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Format selected by the first successful [`initialise`] call.
    #[must_use]
    pub const fn format(self) -> LogFormat {
        self.format
    }
}

/// Reasons the agent's subscriber could not be installed.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// `log_filter` is not a valid directive list.
    #[error("log_filter {filter:?} is invalid: {message}")]
    Filter {
        /// Configured directives.
        filter: String,
        /// Parser message.
        message: String,
    },
    /// Something else in the process already installed a subscriber.
    #[error("another tracing subscriber is already installed: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Installs the agent subscriber once per process.
///
/// Repeat calls ignore `config` and describe the subscriber already in place.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter does not parse or the global
/// subscriber slot is taken.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED_FORMAT
        .get_or_try_init(|| install(config))
        .map(|format| TelemetryHandle { format: *format })
}

fn install(config: &Config) -> Result<LogFormat, TelemetryError> {
    let format = config.log_format();
    let builder = fmt::Subscriber::builder()
        .with_env_filter(parse_filter(config.log_filter())?)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339());

    match format {
        LogFormat::Json => set_global_default(builder.json().flatten_event(true).finish())?,
        LogFormat::Compact => set_global_default(builder.compact().finish())?,
    }
    Ok(format)
}

fn parse_filter(directives: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directives).map_err(|error| TelemetryError::Filter {
        filter: directives.to_owned(),
        message: error.to_string(),
    })
}
