//! Deadline-bound client connections.

use std::io::{self, Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::time::{Duration, Instant};

use crate::codec::{self, CodecError};
use crate::message::Message;

/// An accepted client connection with an absolute deadline.
///
/// The deadline is fixed when the connection is accepted and is never
/// extended: every read and write arms the socket timeout with whatever time
/// remains, so the whole exchange (including the consumer's reply) must
/// complete before it passes. Dropping the connection closes it.
#[derive(Debug)]
pub struct Connection {
    stream: UnixStream,
    deadline: Instant,
}

impl Connection {
    /// Switches `stream` to blocking mode and binds it to a deadline
    /// `timeout` from now.
    pub(crate) fn with_deadline(stream: UnixStream, timeout: Duration) -> io::Result<Self> {
        let deadline = deadline_after(timeout)?;
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        Ok(Self { stream, deadline })
    }

    /// Instant after which all IO on this connection fails.
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Reads one framed message.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] on malformed frames, IO failure, or an expired
    /// deadline.
    pub fn read_message(&mut self) -> Result<Message, CodecError> {
        codec::read_message(self)
    }

    /// Writes one framed message.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] on IO failure or an expired deadline.
    pub fn reply(&mut self, message: &Message) -> Result<(), CodecError> {
        codec::write_message(self, message)
    }

    /// Shuts down both directions and drops the stream.
    pub fn close(self) {
        // The peer may already be gone; there is nothing left to report.
        if let Err(error) = self.stream.shutdown(Shutdown::Both) {
            tracing::trace!(target: super::SERVER_TARGET, %error, "connection already closed");
        }
    }

    fn remaining(&self) -> io::Result<Duration> {
        self.deadline
            .checked_duration_since(Instant::now())
            .filter(|remaining| !remaining.is_zero())
            .ok_or_else(deadline_exceeded)
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining()?;
        self.stream.set_read_timeout(Some(remaining))?;
        self.stream.read(buf).map_err(map_timeout)
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let remaining = self.remaining()?;
        self.stream.set_write_timeout(Some(remaining))?;
        self.stream.write(buf).map_err(map_timeout)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

/// Instant `timeout` from now.
///
/// Fails with [`io::ErrorKind::InvalidInput`] when `timeout` is zero or the
/// sum does not fit in an [`Instant`].
pub(crate) fn deadline_after(timeout: Duration) -> io::Result<Instant> {
    if timeout.is_zero() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "connection deadline must be non-zero",
        ));
    }
    Instant::now().checked_add(timeout).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "connection deadline is out of range",
        )
    })
}

fn deadline_exceeded() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "connection deadline exceeded")
}

// Socket timeouts surface as `WouldBlock` on Unix.
fn map_timeout(error: io::Error) -> io::Error {
    if error.kind() == io::ErrorKind::WouldBlock {
        deadline_exceeded()
    } else {
        error
    }
}
