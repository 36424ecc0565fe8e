//! Client-side game model.
//!
//! This module provides everything the client keeps about a game session:
//! - Card and roster entities
//! - Hand scoring
//! - The one-shot modifier selection
//! - The session state machine that applies server events

pub mod constants;
pub mod entities;
pub mod functional;
pub mod modifier;
pub mod state_machine;
pub mod states;
