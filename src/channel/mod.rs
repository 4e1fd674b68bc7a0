//! # Command Channel
//!
//! Single-instance IPC over a Unix domain socket.
//!
//! The first process to bind the well-known socket path is the server and
//! runs the reminder loop. Later invocations connect as clients, send one
//! bare command token (no framing), wait for the two-byte `ok`, and exit.

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{send_command, send_token};
pub use protocol::Command;
pub use server::ChannelServer;
