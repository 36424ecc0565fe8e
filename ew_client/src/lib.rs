//! Internal modules for the Empire of Wagers client.
//!
//! This library provides the connection manager, transport, configuration,
//! command parsing, and rendering used by the ew_client binary.

pub mod commands;
pub mod config;
pub mod connection;
pub mod display;
pub mod logging;
pub mod transport;
