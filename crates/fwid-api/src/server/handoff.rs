//! The rendezvous between the accept loop and the request consumer.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::connection::Connection;
use crate::message::Message;

/// A validated request and the still-open connection it arrived on.
///
/// Ownership of the connection passes to whoever receives the request; the
/// server never touches it again.
#[derive(Debug)]
pub struct Request {
    message: Message,
    connection: Connection,
}

impl Request {
    pub(crate) const fn new(message: Message, connection: Connection) -> Self {
        Self {
            message,
            connection,
        }
    }

    /// The parsed request message.
    #[must_use]
    pub const fn message(&self) -> &Message {
        &self.message
    }

    /// Mutable access to the client connection, e.g. to write a reply.
    pub fn connection(&mut self) -> &mut Connection {
        &mut self.connection
    }

    /// Splits the request into its message and connection.
    #[must_use]
    pub fn into_parts(self) -> (Message, Connection) {
        (self.message, self.connection)
    }
}

/// Read side of the handoff channel.
///
/// The channel has zero capacity: the accept loop blocks in `send` until a
/// consumer receives, which is what serialises intake and keeps handoff
/// order equal to accept order. Handles are cheap to clone; clones share one
/// receiver, so each request is delivered to exactly one caller.
#[derive(Debug, Clone)]
pub struct Requests {
    receiver: Arc<Mutex<Receiver<Request>>>,
}

impl Requests {
    /// Blocks until the next request arrives. Returns `None` once the server
    /// has stopped and the channel is closed.
    #[must_use]
    pub fn recv(&self) -> Option<Request> {
        self.lock().recv().ok()
    }

    /// Waits up to `timeout` for the next request.
    ///
    /// # Errors
    ///
    /// Returns [`RecvTimeoutError::Timeout`] when nothing arrived in time and
    /// [`RecvTimeoutError::Disconnected`] once the channel is closed.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Request, RecvTimeoutError> {
        self.lock().recv_timeout(timeout)
    }

    /// Iterates until the channel is closed.
    pub fn iter(&self) -> impl Iterator<Item = Request> + '_ {
        std::iter::from_fn(move || self.recv())
    }

    fn lock(&self) -> MutexGuard<'_, Receiver<Request>> {
        // A panicking consumer cannot corrupt the receiver itself.
        self.receiver.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Creates the unbuffered handoff channel.
pub(crate) fn channel() -> (SyncSender<Request>, Requests) {
    let (sender, receiver) = mpsc::sync_channel(0);
    (
        sender,
        Requests {
            receiver: Arc::new(Mutex::new(receiver)),
        },
    )
}

#[cfg(test)]
mod tests {
    use std::os::unix::net::UnixStream;
    use std::thread;

    use super::*;

    fn request(message: Message) -> Request {
        let (stream, _peer) = UnixStream::pair().expect("socket pair");
        let connection =
            Connection::with_deadline(stream, Duration::from_secs(5)).expect("arm deadline");
        Request::new(message, connection)
    }

    #[test]
    fn recv_returns_none_after_sender_dropped() {
        let (sender, requests) = channel();
        drop(sender);
        assert!(requests.recv().is_none());
    }

    #[test]
    fn send_blocks_until_received() {
        let (sender, requests) = channel();
        let producer = thread::spawn(move || {
            sender
                .send(request(Message::query()))
                .expect("consumer should be present");
        });

        thread::sleep(Duration::from_millis(50));
        assert!(!producer.is_finished(), "send must wait for a receiver");

        let received = requests.recv().expect("request delivered");
        assert_eq!(received.message().kind(), Message::query().kind());
        producer.join().expect("producer thread");
    }

    #[test]
    fn clones_share_one_receiver() {
        let (sender, requests) = channel();
        let other = requests.clone();
        let producer = thread::spawn(move || {
            sender.send(request(Message::relogin())).expect("send relogin");
        });

        let first = other.recv().expect("request delivered");
        assert_eq!(first.message(), &Message::relogin());
        producer.join().expect("producer thread");
        assert!(requests.recv().is_none());
    }
}
