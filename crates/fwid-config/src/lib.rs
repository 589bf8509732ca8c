//! Shared configuration for the fw-id-agent daemon and its clients.
//!
//! Configuration is layered with `ortho_config`: built-in defaults, then a
//! configuration file, then `FWID_*` environment variables, then command-line
//! flags. The socket path defaults to a per-user location derived in
//! [`user_socket_file`], so most deployments never set it explicitly.

mod defaults;
mod errors;
mod logging;
mod requests;
mod socket;

use std::ffi::OsString;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_REQUEST_TIMEOUT, DEFAULT_REQUEST_TIMEOUT_SECS,
    MAX_REQUEST_TIMEOUT_SECS, default_accepted_requests, default_log_filter,
    default_log_filter_string, default_log_format,
};
pub use errors::ConfigError;
pub use logging::{LogFormat, LogFormatParseError};
pub use requests::{AcceptedRequests, AcceptedRequestsParseError};
pub use socket::{
    SOCKET_FILE_PREFIX, SOCKET_ROOT, SocketPathError, socket_file_for_uid, user_socket_file,
};

/// Runtime configuration shared by the agent binaries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "FWID")]
pub struct Config {
    /// Overrides the per-user socket path.
    pub socket_path: Option<Utf8PathBuf>,
    /// `tracing` filter expression, e.g. `info` or `fwid_api=debug`.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for structured logs.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Absolute deadline, in seconds, for each client exchange.
    ///
    /// Must lie within `1..=`[`MAX_REQUEST_TIMEOUT_SECS`].
    #[ortho_config(default = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,
    /// Request types handed to the worker; `query_only` rejects
    /// re-authentication.
    #[ortho_config(default = default_accepted_requests())]
    pub accepted_requests: AcceptedRequests,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: None,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            accepted_requests: default_accepted_requests(),
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when any layer fails to parse and
    /// [`ConfigError::RequestTimeout`] when the merged deadline is out of
    /// range.
    pub fn load() -> Result<Self, ConfigError> {
        let config = <Self as OrthoConfig>::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from an explicit argument list.
    ///
    /// The first element is treated as the binary name.
    ///
    /// # Errors
    ///
    /// As for [`Config::load`].
    pub fn load_from_iter<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = OsString>,
    {
        let config = <Self as OrthoConfig>::load_from_iter(args)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values the loader cannot constrain on its own.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RequestTimeout`] when `request_timeout_secs`
    /// is zero or above [`MAX_REQUEST_TIMEOUT_SECS`].
    pub const fn validate(&self) -> Result<(), ConfigError> {
        let value = self.request_timeout_secs;
        if value == 0 || value > MAX_REQUEST_TIMEOUT_SECS {
            return Err(ConfigError::RequestTimeout {
                value,
                max: MAX_REQUEST_TIMEOUT_SECS,
            });
        }
        Ok(())
    }

    /// Returns the configured socket path or the per-user default.
    ///
    /// # Errors
    ///
    /// Returns [`SocketPathError`] when no override is configured and the
    /// invoking user cannot be resolved.
    pub fn resolve_socket_path(&self) -> Result<Utf8PathBuf, SocketPathError> {
        match &self.socket_path {
            Some(path) => Ok(path.clone()),
            None => user_socket_file(),
        }
    }

    /// Per-connection deadline as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Request types handed to the worker.
    #[must_use]
    pub const fn accepted_requests(&self) -> AcceptedRequests {
        self.accepted_requests
    }
}
