//! Structured reporting for server lifecycle and connection faults.

use std::io;
use std::sync::Arc;

use camino::Utf8Path;

use crate::codec::CodecError;
use crate::message::MessageType;

use super::SERVER_TARGET;

/// Why an accepted connection was closed without a handoff.
#[derive(Debug)]
pub enum DropReason<'a> {
    /// Arming the connection deadline failed.
    Deadline(&'a io::Error),
    /// The request frame could not be read.
    Read(&'a CodecError),
}

/// Observer for server events, so callers can route them to telemetry
/// sinks or record them in tests.
pub trait ServerEvents: Send + Sync {
    /// The listener is bound and the accept loop is about to start.
    fn listening(&self, path: &Utf8Path);

    /// A leftover socket file from an unclean shutdown was removed.
    fn stale_socket_removed(&self, path: &Utf8Path);

    /// Restricting the socket file to its owner failed.
    fn permissions_failed(&self, path: &Utf8Path, error: &io::Error);

    /// A connection was closed during intake.
    fn connection_dropped(&self, reason: DropReason<'_>);

    /// A request carried a type this server does not accept.
    fn message_rejected(&self, kind: MessageType, reply_error: Option<&CodecError>);

    /// `accept` failed while the server was not stopping.
    fn accept_failed(&self, error: &io::Error);

    /// The accept loop exited and the handoff channel is closed.
    fn stopped(&self, path: &Utf8Path);
}

impl<T> ServerEvents for Arc<T>
where
    T: ServerEvents + ?Sized,
{
    fn listening(&self, path: &Utf8Path) {
        (**self).listening(path);
    }

    fn stale_socket_removed(&self, path: &Utf8Path) {
        (**self).stale_socket_removed(path);
    }

    fn permissions_failed(&self, path: &Utf8Path, error: &io::Error) {
        (**self).permissions_failed(path, error);
    }

    fn connection_dropped(&self, reason: DropReason<'_>) {
        (**self).connection_dropped(reason);
    }

    fn message_rejected(&self, kind: MessageType, reply_error: Option<&CodecError>) {
        (**self).message_rejected(kind, reply_error);
    }

    fn accept_failed(&self, error: &io::Error) {
        (**self).accept_failed(error);
    }

    fn stopped(&self, path: &Utf8Path) {
        (**self).stopped(path);
    }
}

/// Default sink that records events with `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredServerEvents;

impl ServerEvents for StructuredServerEvents {
    fn listening(&self, path: &Utf8Path) {
        tracing::info!(
            target: SERVER_TARGET,
            event = "listening",
            socket = %path,
            "agent socket listener active"
        );
    }

    fn stale_socket_removed(&self, path: &Utf8Path) {
        tracing::warn!(
            target: SERVER_TARGET,
            event = "stale_socket_removed",
            socket = %path,
            "removed existing unix socket file"
        );
    }

    fn permissions_failed(&self, path: &Utf8Path, error: &io::Error) {
        tracing::error!(
            target: SERVER_TARGET,
            event = "permissions_failed",
            socket = %path,
            %error,
            "could not set permissions of socket file"
        );
    }

    fn connection_dropped(&self, reason: DropReason<'_>) {
        match reason {
            DropReason::Deadline(error) => tracing::error!(
                target: SERVER_TARGET,
                event = "connection_dropped",
                %error,
                "failed to set connection deadline"
            ),
            DropReason::Read(error) => tracing::error!(
                target: SERVER_TARGET,
                event = "connection_dropped",
                %error,
                timeout = error.is_timeout(),
                "failed to receive client message"
            ),
        }
    }

    fn message_rejected(&self, kind: MessageType, reply_error: Option<&CodecError>) {
        match reply_error {
            None => tracing::warn!(
                target: SERVER_TARGET,
                event = "message_rejected",
                message_type = %kind,
                "rejected client message"
            ),
            Some(error) => tracing::error!(
                target: SERVER_TARGET,
                event = "message_rejected",
                message_type = %kind,
                %error,
                "failed to send error reply"
            ),
        }
    }

    fn accept_failed(&self, error: &io::Error) {
        tracing::error!(
            target: SERVER_TARGET,
            event = "accept_failed",
            %error,
            "listener error, no longer accepting clients"
        );
    }

    fn stopped(&self, path: &Utf8Path) {
        tracing::info!(
            target: SERVER_TARGET,
            event = "stopped",
            socket = %path,
            "agent socket listener stopped"
        );
    }
}
