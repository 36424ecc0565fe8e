//! Session phase definitions.
//!
//! Each phase is a unit type implementing [`PhaseRules`]; [`Phase`] dispatches
//! to them. What the player may do is a pure function of the phase.

use enum_dispatch::enum_dispatch;
use std::fmt;

/// Actions the UI may offer in a phase.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ActionSet {
    pub connect: bool,
    pub disconnect: bool,
    pub draw: bool,
    pub stand: bool,
    pub arm_modifier: bool,
    pub advance_round: bool,
    pub chat: bool,
}

impl fmt::Display for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (self.draw, "draw"),
            (self.stand, "stand"),
            (self.arm_modifier, "mod <key>"),
            (self.advance_round, "next"),
            (self.chat, "chat <text>"),
            (self.connect, "connect"),
            (self.disconnect, "disconnect"),
        ];
        let available: Vec<&str> = names
            .into_iter()
            .filter_map(|(enabled, name)| enabled.then_some(name))
            .collect();
        write!(f, "{}", available.join(", "))
    }
}

/// Behavior that differs by phase.
#[enum_dispatch]
pub trait PhaseRules {
    /// Actions the UI may offer.
    fn available_actions(&self) -> ActionSet;

    /// Whether a session with an open transport exists in this phase.
    fn is_live(&self) -> bool;
}

/// No session. The UI offers to connect.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Idle;

/// Connected, waiting for the room to fill.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LobbyWaiting;

/// A round is in progress and the local player may draw or stand.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ActiveRound;

/// The server revealed a round's results.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RoundResolved;

/// Terminal. Nothing is applied until a fresh connect.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GameOver;

impl PhaseRules for Idle {
    fn available_actions(&self) -> ActionSet {
        ActionSet {
            connect: true,
            ..ActionSet::default()
        }
    }

    fn is_live(&self) -> bool {
        false
    }
}

impl PhaseRules for LobbyWaiting {
    fn available_actions(&self) -> ActionSet {
        ActionSet {
            disconnect: true,
            chat: true,
            ..ActionSet::default()
        }
    }

    fn is_live(&self) -> bool {
        true
    }
}

impl PhaseRules for ActiveRound {
    fn available_actions(&self) -> ActionSet {
        ActionSet {
            disconnect: true,
            draw: true,
            stand: true,
            arm_modifier: true,
            chat: true,
            ..ActionSet::default()
        }
    }

    fn is_live(&self) -> bool {
        true
    }
}

impl PhaseRules for RoundResolved {
    fn available_actions(&self) -> ActionSet {
        ActionSet {
            disconnect: true,
            advance_round: true,
            chat: true,
            ..ActionSet::default()
        }
    }

    fn is_live(&self) -> bool {
        true
    }
}

impl PhaseRules for GameOver {
    fn available_actions(&self) -> ActionSet {
        ActionSet {
            connect: true,
            disconnect: true,
            ..ActionSet::default()
        }
    }

    fn is_live(&self) -> bool {
        false
    }
}

#[enum_dispatch(PhaseRules)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Idle,
    LobbyWaiting,
    ActiveRound,
    RoundResolved,
    GameOver,
}

impl Default for Phase {
    fn default() -> Self {
        Idle.into()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Idle(_) => "idle",
            Self::LobbyWaiting(_) => "lobby-waiting",
            Self::ActiveRound(_) => "active-round",
            Self::RoundResolved(_) => "round-resolved",
            Self::GameOver(_) => "game-over",
        };
        write!(f, "{repr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_active_round_allows_play() {
        let phases: [Phase; 5] = [
            Idle.into(),
            LobbyWaiting.into(),
            ActiveRound.into(),
            RoundResolved.into(),
            GameOver.into(),
        ];
        for phase in phases {
            let actions = phase.available_actions();
            let in_round = matches!(phase, Phase::ActiveRound(_));
            assert_eq!(actions.draw, in_round, "{phase}");
            assert_eq!(actions.stand, in_round, "{phase}");
            assert_eq!(actions.arm_modifier, in_round, "{phase}");
        }
    }

    #[test]
    fn test_idle_offers_connect_only() {
        let actions = Phase::default().available_actions();
        assert_eq!(
            actions,
            ActionSet {
                connect: true,
                ..ActionSet::default()
            }
        );
        assert_eq!(actions.to_string(), "connect");
    }

    #[test]
    fn test_round_resolved_offers_next() {
        let phase: Phase = RoundResolved.into();
        assert!(phase.available_actions().advance_round);
        assert!(phase.is_live());
    }

    #[test]
    fn test_phase_display() {
        let phase: Phase = ActiveRound.into();
        assert_eq!(phase.to_string(), "active-round");
    }
}
