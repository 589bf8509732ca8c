use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;

/// Errors raised while loading or validating [`crate::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration layer failed to parse.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Arc<OrthoError>),
    /// The request deadline is zero or longer than the agent allows.
    #[error("request_timeout_secs must be between 1 and {max}, got {value}")]
    RequestTimeout {
        /// Configured value.
        value: u64,
        /// Largest accepted value.
        max: u64,
    },
}
