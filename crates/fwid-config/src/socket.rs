//! Per-user socket addressing.
//!
//! Every OS user gets an isolated endpoint derived from their numeric uid, so
//! the agent and its clients agree on the path without any configuration.
//! The path is recomputed on every call; nothing is cached process-wide.

use camino::Utf8PathBuf;
use nix::errno::Errno;
use nix::unistd::{Uid, User};
use thiserror::Error;

/// Directory holding the per-user socket files.
pub const SOCKET_ROOT: &str = "/tmp";

/// File name prefix shared by every per-user socket.
pub const SOCKET_FILE_PREFIX: &str = "fw-id-agent";

/// Errors raised while resolving the invoking user's socket path.
#[derive(Debug, Error)]
pub enum SocketPathError {
    /// The user database lookup itself failed.
    #[error("failed to look up user {uid}: {source}")]
    Lookup {
        /// Real uid of the calling process.
        uid: u32,
        /// Underlying OS error.
        #[source]
        source: Errno,
    },
    /// The uid has no entry in the user database.
    #[error("no user database entry for uid {uid}")]
    UnknownUser {
        /// Real uid of the calling process.
        uid: u32,
    },
}

/// Derives the socket path for `uid`.
///
/// ```text
/// socket_file_for_uid(1000) == "/tmp/fw-id-agent-1000"
/// ```
#[must_use]
pub fn socket_file_for_uid(uid: u32) -> Utf8PathBuf {
    Utf8PathBuf::from(SOCKET_ROOT).join(format!("{SOCKET_FILE_PREFIX}-{uid}"))
}

/// Resolves the invoking user and returns their socket path.
///
/// # Errors
///
/// Returns [`SocketPathError`] when the user cannot be resolved. Callers must
/// treat this as fatal rather than fall back to a shared path.
pub fn user_socket_file() -> Result<Utf8PathBuf, SocketPathError> {
    let uid = Uid::current();
    let user = User::from_uid(uid)
        .map_err(|source| SocketPathError::Lookup {
            uid: uid.as_raw(),
            source,
        })?
        .ok_or(SocketPathError::UnknownUser { uid: uid.as_raw() })?;
    Ok(socket_file_for_uid(user.uid.as_raw()))
}
