//! One-shot modifier selection.
//!
//! A modifier is armed client-side and rides along with the next draw or
//! stand. Its effect is resolved entirely by the server.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The closed set of modifier identifiers understood by the server.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum ModifierKey {
    #[serde(rename = "SC")]
    Sc,
    #[serde(rename = "VN")]
    Vn,
    #[serde(rename = "NR")]
    Nr,
    #[serde(rename = "EL")]
    El,
    #[serde(rename = "PC")]
    Pc,
    #[serde(rename = "RT")]
    Rt,
}

impl ModifierKey {
    pub const ALL: [Self; 6] = [Self::Sc, Self::Vn, Self::Nr, Self::El, Self::Pc, Self::Rt];

    /// The two-letter wire identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sc => "SC",
            Self::Vn => "VN",
            Self::Nr => "NR",
            Self::El => "EL",
            Self::Pc => "PC",
            Self::Rt => "RT",
        }
    }
}

impl fmt::Display for ModifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string isn't one of the six modifier keys.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown modifier '{0}' (expected one of SC, VN, NR, EL, PC, RT)")]
pub struct UnknownModifier(pub String);

impl FromStr for ModifierKey {
    type Err = UnknownModifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownModifier(trimmed.to_string()))
    }
}

/// Tracks at most one armed modifier.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ModifierController {
    armed: Option<ModifierKey>,
}

impl ModifierController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `key`, replacing any other armed key. Arming the key that is
    /// already armed disarms it. Returns the key armed afterwards.
    pub fn arm(&mut self, key: ModifierKey) -> Option<ModifierKey> {
        self.armed = if self.armed == Some(key) {
            None
        } else {
            Some(key)
        };
        self.armed
    }

    pub fn disarm(&mut self) {
        self.armed = None;
    }

    #[must_use]
    pub fn armed(&self) -> Option<ModifierKey> {
        self.armed
    }

    /// Hand out the armed key for the next outgoing action, clearing it.
    pub fn take_for_next_action(&mut self) -> Option<ModifierKey> {
        self.armed.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Parsing ===

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("pc".parse::<ModifierKey>(), Ok(ModifierKey::Pc));
        assert_eq!(" Rt ".parse::<ModifierKey>(), Ok(ModifierKey::Rt));
        assert_eq!("SC".parse::<ModifierKey>(), Ok(ModifierKey::Sc));
    }

    #[test]
    fn test_parse_unknown_key() {
        let err = "XX".parse::<ModifierKey>().unwrap_err();
        assert!(err.to_string().contains("XX"));
    }

    #[test]
    fn test_serializes_as_wire_identifier() {
        let json = serde_json::to_string(&ModifierKey::El).unwrap();
        assert_eq!(json, "\"EL\"");
    }

    // === Arming ===

    #[test]
    fn test_double_arm_disarms() {
        let mut controller = ModifierController::new();
        assert_eq!(controller.arm(ModifierKey::Pc), Some(ModifierKey::Pc));
        assert_eq!(controller.arm(ModifierKey::Pc), None);
        assert_eq!(controller.take_for_next_action(), None);
    }

    #[test]
    fn test_take_is_one_shot() {
        let mut controller = ModifierController::new();
        controller.arm(ModifierKey::Pc);
        assert_eq!(controller.take_for_next_action(), Some(ModifierKey::Pc));
        assert_eq!(controller.take_for_next_action(), None);
    }

    #[test]
    fn test_arming_another_key_replaces() {
        let mut controller = ModifierController::new();
        controller.arm(ModifierKey::Sc);
        assert_eq!(controller.arm(ModifierKey::Vn), Some(ModifierKey::Vn));
        assert_eq!(controller.armed(), Some(ModifierKey::Vn));
    }

    #[test]
    fn test_disarm() {
        let mut controller = ModifierController::new();
        controller.arm(ModifierKey::Nr);
        controller.disarm();
        assert_eq!(controller.armed(), None);
    }
}
