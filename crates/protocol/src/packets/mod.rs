//! Message definitions for the worm-arena protocol.
//!
//! This module contains both client->server and server->client message types.
//! All messages are JSON objects carrying a `type` discriminator.

mod client;
mod server;

pub use client::*;
pub use server::*;

/// `type` value of a client join message.
pub const TYPE_JOIN: &str = "join";
/// `type` value of a client input message.
pub const TYPE_INPUT: &str = "input";
/// `type` value of the per-tick world snapshot.
pub const TYPE_STATE: &str = "state";
