//! # Empire of Wagers
//!
//! Client-side session engine for a realtime multiplayer card game built
//! on blackjack arithmetic, where each player's HP rises and falls with
//! every round.
//!
//! This library holds everything a client needs that doesn't touch a socket.
//! That covers the wire protocol, hand scoring, the modifier that rides
//! along with the next action, and the session state machine that turns
//! server events into something a UI can render. Phases are implemented
//! with `enum_dispatch` so the actions offered in each one are a pure
//! function of the phase.
//!
//! ## Phases
//!
//! - **Idle**: No session
//! - **LobbyWaiting**: Connected, waiting for the room to fill
//! - **ActiveRound**: Drawing and standing
//! - **RoundResolved**: Results are in, waiting for the next round
//! - **GameOver**: Terminal until the next connect
//!
//! ## Core Modules
//!
//! - [`game`]: Session state machine, entities, and scoring
//! - [`net`]: Wire messages and codec errors
//!
//! ## Example
//!
//! ```
//! use empire_wagers::{SessionMachine, messages::decode};
//!
//! let mut machine = SessionMachine::default();
//! machine.begin_session();
//! if let Some(event) = decode(r#"{"type":"start","player_id":"p1"}"#) {
//!     machine.apply(event);
//! }
//! assert!(machine.draw().is_ok());
//! ```

/// Wire protocol shared with the game server.
pub mod net;
pub use net::{errors::CodecError, messages};

/// Session logic, entities, and scoring.
pub mod game;
pub use game::{
    constants::{self, BUST_LIMIT, DEFAULT_HP},
    entities::{self, Card, ChatMessage, Notice, NoticeKind, Player, PlayerId},
    functional,
    modifier::{ModifierController, ModifierKey, UnknownModifier},
    state_machine::{ActionError, Applied, SessionMachine, SessionSettings, SessionView},
    states::{ActionSet, Phase, PhaseRules},
};
