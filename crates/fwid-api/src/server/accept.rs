//! The accept loop: Accepting until the listener fails or a stop is
//! requested, then Stopped.

use std::fs;
use std::io;
use std::os::unix::net::{UnixListener, UnixStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::thread;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

use super::events::ServerEvents;
use super::handoff::Request;
use super::{ACCEPT_BACKOFF, SERVER_TARGET, ServerOptions, intake};

/// Where the accept loop takes client streams from.
pub(super) trait Incoming: Send {
    /// Accepts the next client, or `WouldBlock` when none is waiting.
    fn next_stream(&self) -> io::Result<UnixStream>;
}

impl Incoming for UnixListener {
    fn next_stream(&self) -> io::Result<UnixStream> {
        self.accept().map(|(stream, _)| stream)
    }
}

/// Everything the accept thread owns.
pub(super) struct AcceptLoop {
    pub(super) listener: Box<dyn Incoming>,
    pub(super) path: Utf8PathBuf,
    pub(super) stopping: Arc<AtomicBool>,
    pub(super) sender: SyncSender<Request>,
    pub(super) options: ServerOptions,
    pub(super) events: Arc<dyn ServerEvents>,
}

impl AcceptLoop {
    pub(super) fn run(self) {
        self.events.listening(&self.path);
        while !self.stopping.load(Ordering::SeqCst) {
            match self.listener.next_stream() {
                Ok(stream) => {
                    let Some(request) = intake::receive(
                        stream,
                        self.options.request_timeout,
                        &self.options.accepted,
                        self.events.as_ref(),
                    ) else {
                        continue;
                    };
                    // Blocks until a consumer takes the request.
                    if self.sender.send(request).is_err() {
                        debug!(
                            target: SERVER_TARGET,
                            "request consumers are gone, closing listener"
                        );
                        break;
                    }
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_BACKOFF);
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => {
                    if !self.stopping.load(Ordering::SeqCst) {
                        self.events.accept_failed(&error);
                    }
                    break;
                }
            }
        }
        self.finish();
    }

    fn finish(self) {
        let Self {
            listener,
            path,
            sender,
            events,
            ..
        } = self;
        drop(listener);
        remove_socket_file(&path);
        // Closing the channel releases `Server::stop` and ends consumers'
        // read loops.
        drop(sender);
        events.stopped(&path);
    }
}

pub(super) fn remove_socket_file(path: &Utf8Path) {
    if let Err(error) = fs::remove_file(path.as_std_path())
        && error.kind() != io::ErrorKind::NotFound
    {
        warn!(
            target: SERVER_TARGET,
            error = %error,
            socket = %path,
            "failed to remove unix socket file"
        );
    }
}
