//! Wire protocol for client-server communication.
//!
//! The server speaks JSON text frames over a persistent message-oriented
//! connection. This module only encodes and decodes; the connection itself
//! belongs to the client.

/// Codec error types.
pub mod errors;

/// Message types and the frame codec.
pub mod messages;
