use std::time::Duration;

use crate::logging::LogFormat;
use crate::requests::AcceptedRequests;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Seconds a client has to complete its whole exchange with the agent.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Longest request deadline the agent accepts, one day.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 86_400;

/// [`DEFAULT_REQUEST_TIMEOUT_SECS`] as a [`Duration`].
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS);

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default request set: queries and re-authentication.
#[must_use]
pub const fn default_accepted_requests() -> AcceptedRequests {
    AcceptedRequests::Broad
}
