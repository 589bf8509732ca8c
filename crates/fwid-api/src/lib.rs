//! Local IPC surface of the fw-id agent.
//!
//! The agent listens on a per-user Unix socket. Each client connection carries
//! exactly one request frame and receives at most one reply frame. This crate
//! provides the framing codec, the message model, the connection [`Server`]
//! that accepts and validates requests, and a blocking [`Client`] for
//! short-lived callers.

pub mod codec;
mod client;
mod message;
pub mod server;

pub use client::{CONNECT_TIMEOUT, Client, ClientError};
pub use codec::{CodecError, read_message, write_message};
pub use message::{Message, MessageType};
pub use server::{
    AcceptedTypes, Connection, DropReason, INVALID_MESSAGE, Request, Requests, Server,
    ServerError, ServerEvents, ServerOptions, StructuredServerEvents,
};

#[cfg(test)]
mod tests;
