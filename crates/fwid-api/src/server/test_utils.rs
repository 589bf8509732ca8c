//! Test helpers for the server module.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};

use crate::codec::CodecError;
use crate::message::MessageType;

use super::events::{DropReason, ServerEvents};

/// Flattened view of a [`ServerEvents`] callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RecordedEvent {
    Listening,
    StaleSocketRemoved,
    PermissionsFailed,
    DeadlineFailed,
    ReadFailed,
    TimedOut,
    Rejected(u16),
    RejectReplyFailed(u16),
    AcceptFailed,
    Stopped,
}

/// Event sink that records every callback for later assertions.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingEvents {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecordingEvents {
    pub(crate) fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn contains(&self, event: &RecordedEvent) -> bool {
        self.events().contains(event)
    }

    /// Polls until `event` is recorded or two seconds pass.
    pub(crate) fn wait_for(&self, event: &RecordedEvent) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if self.contains(event) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }

    fn record(&self, event: RecordedEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl ServerEvents for RecordingEvents {
    fn listening(&self, _path: &Utf8Path) {
        self.record(RecordedEvent::Listening);
    }

    fn stale_socket_removed(&self, _path: &Utf8Path) {
        self.record(RecordedEvent::StaleSocketRemoved);
    }

    fn permissions_failed(&self, _path: &Utf8Path, _error: &io::Error) {
        self.record(RecordedEvent::PermissionsFailed);
    }

    fn connection_dropped(&self, reason: DropReason<'_>) {
        self.record(match reason {
            DropReason::Deadline(_) => RecordedEvent::DeadlineFailed,
            DropReason::Read(error) if error.is_timeout() => RecordedEvent::TimedOut,
            DropReason::Read(_) => RecordedEvent::ReadFailed,
        });
    }

    fn message_rejected(&self, kind: MessageType, reply_error: Option<&CodecError>) {
        self.record(match reply_error {
            None => RecordedEvent::Rejected(kind.raw()),
            Some(_) => RecordedEvent::RejectReplyFailed(kind.raw()),
        });
    }

    fn accept_failed(&self, _error: &io::Error) {
        self.record(RecordedEvent::AcceptFailed);
    }

    fn stopped(&self, _path: &Utf8Path) {
        self.record(RecordedEvent::Stopped);
    }
}

/// Temporary directory holding a socket path for one test.
pub(crate) struct SocketDir {
    _dir: tempfile::TempDir,
    path: Utf8PathBuf,
}

impl SocketDir {
    pub(crate) fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("fw-id-agent.sock"))
            .expect("utf8 temp path");
        Self { _dir: dir, path }
    }

    pub(crate) fn path(&self) -> &Utf8Path {
        &self.path
    }
}
