//! Layering tests for the shared configuration loader.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use fwid_config::{AcceptedRequests, Config, ConfigError, LogFormat, MAX_REQUEST_TIMEOUT_SECS};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct EnvOverride {
    key: &'static str,
    previous: Option<OsString>,
    guard: Option<MutexGuard<'static, ()>>,
}

impl EnvOverride {
    fn set_var(key: &'static str, value: &OsStr) -> Self {
        let guard = ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let previous = std::env::var_os(key);
        // Environment mutation is `unsafe` on edition 2024; the mutex keeps
        // tests in this binary from racing each other.
        unsafe { std::env::set_var(key, value) };
        Self {
            key,
            previous,
            guard: Some(guard),
        }
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => unsafe { std::env::set_var(self.key, value) },
            None => unsafe { std::env::remove_var(self.key) },
        }
        drop(self.guard.take());
    }
}

fn args(extra: &[&str]) -> Vec<OsString> {
    std::iter::once("fwid-agent")
        .chain(extra.iter().copied())
        .map(OsString::from)
        .collect()
}

#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("create temp dir")
}

#[rstest]
fn cli_flags_override_defaults() {
    let _lock = ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let config = Config::load_from_iter(args(&[
        "--log-filter",
        "debug",
        "--log-format",
        "compact",
        "--socket-path",
        "/tmp/fwid-cli.sock",
    ]))
    .expect("load config");

    assert_eq!(config.log_filter(), "debug");
    assert_eq!(config.log_format(), LogFormat::Compact);
    assert_eq!(
        config.socket_path.as_ref().map(|path| path.as_str()),
        Some("/tmp/fwid-cli.sock")
    );
}

#[rstest]
fn environment_overrides_defaults() {
    let _env = EnvOverride::set_var("FWID_REQUEST_TIMEOUT_SECS", OsStr::new("5"));
    let config = Config::load_from_iter(args(&[])).expect("load config");
    assert_eq!(config.request_timeout_secs, 5);
}

#[rstest]
fn cli_flags_override_environment() {
    let _env = EnvOverride::set_var("FWID_LOG_FILTER", OsStr::new("warn"));
    let config =
        Config::load_from_iter(args(&["--log-filter", "trace"])).expect("load config");
    assert_eq!(config.log_filter(), "trace");
}

fn config_file(dir: &TempDir, contents: &str) -> Vec<OsString> {
    let path = dir.path().join("fwid.toml");
    fs::write(&path, contents).expect("write config");
    let mut arguments = args(&["--config-path"]);
    arguments.push(path.into_os_string());
    arguments
}

#[rstest]
fn configuration_file_sets_query_only(temp_dir: TempDir) {
    let _lock = ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let arguments = config_file(
        &temp_dir,
        "accepted_requests = \"query_only\"\nrequest_timeout_secs = 12\n",
    );
    let config = Config::load_from_iter(arguments).expect("load config");

    assert_eq!(config.accepted_requests(), AcceptedRequests::QueryOnly);
    assert_eq!(config.request_timeout_secs, 12);
}

#[rstest]
fn environment_sets_query_only() {
    let _env = EnvOverride::set_var("FWID_ACCEPTED_REQUESTS", OsStr::new("query_only"));
    let config = Config::load_from_iter(args(&[])).expect("load config");
    assert_eq!(config.accepted_requests(), AcceptedRequests::QueryOnly);
}

#[rstest]
fn cli_flag_overrides_environment_request_set() {
    let _env = EnvOverride::set_var("FWID_ACCEPTED_REQUESTS", OsStr::new("query_only"));
    let config = Config::load_from_iter(args(&["--accepted-requests", "broad"]))
        .expect("load config");
    assert_eq!(config.accepted_requests(), AcceptedRequests::Broad);
}

#[rstest]
fn omitted_request_set_keeps_the_broad_default() {
    let _lock = ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let config = Config::load_from_iter(args(&[])).expect("load config");
    assert_eq!(config.accepted_requests(), AcceptedRequests::Broad);
}

#[rstest]
#[case("0")]
#[case("86401")]
#[case("18446744073709551615")]
fn out_of_range_environment_timeout_is_rejected(#[case] value: &str) {
    let _env = EnvOverride::set_var("FWID_REQUEST_TIMEOUT_SECS", OsStr::new(value));
    let error = Config::load_from_iter(args(&[])).expect_err("timeout should be rejected");
    assert!(
        matches!(
            error,
            ConfigError::RequestTimeout { max: MAX_REQUEST_TIMEOUT_SECS, .. }
        ),
        "unexpected error: {error:?}"
    );
}

#[rstest]
fn zero_timeout_in_file_is_rejected(temp_dir: TempDir) {
    let _lock = ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let arguments = config_file(&temp_dir, "request_timeout_secs = 0\n");
    let error = Config::load_from_iter(arguments).expect_err("zero timeout should be rejected");
    assert!(
        matches!(error, ConfigError::RequestTimeout { value: 0, .. }),
        "unexpected error: {error:?}"
    );
}

#[rstest]
fn malformed_timeout_is_rejected() {
    let _env = EnvOverride::set_var("FWID_REQUEST_TIMEOUT_SECS", OsStr::new("soon"));
    let result = Config::load_from_iter(args(&[]));
    assert!(
        matches!(result, Err(ConfigError::Load(_))),
        "non-numeric timeout should fail to load: {result:?}"
    );
}
