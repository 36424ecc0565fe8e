use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use super::modifier::ModifierKey;

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    #[default]
    Spade,
    Heart,
    Diamond,
    Club,
}

impl Suit {
    /// Parse a suit from its symbol, English name, or initial.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "♠" | "s" | "spade" | "spades" => Some(Self::Spade),
            "♥" | "h" | "heart" | "hearts" => Some(Self::Heart),
            "♦" | "d" | "diamond" | "diamonds" => Some(Self::Diamond),
            "♣" | "c" | "club" | "clubs" => Some(Self::Club),
            _ => None,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Spade => "♠",
            Self::Heart => "♥",
            Self::Diamond => "♦",
            Self::Club => "♣",
        };
        write!(f, "{repr}")
    }
}

/// Card rank as reported by the server. Anything that isn't a recognizable
/// rank is kept as `Blank` and scores nothing.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Rank {
    Ace,
    Pip(u8),
    Jack,
    Queen,
    King,
    Blank,
}

impl Rank {
    /// Parse a rank, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "A" | "ACE" => Self::Ace,
            "J" | "JACK" => Self::Jack,
            "Q" | "QUEEN" => Self::Queen,
            "K" | "KING" => Self::King,
            other => other
                .parse::<u8>()
                .ok()
                .filter(|value| (2..=10).contains(value))
                .map_or(Self::Blank, Self::Pip),
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Ace => write!(f, "A"),
            Self::Pip(value) => write!(f, "{value}"),
            Self::Jack => write!(f, "J"),
            Self::Queen => write!(f, "Q"),
            Self::King => write!(f, "K"),
            Self::Blank => write!(f, "?"),
        }
    }
}

/// A card dealt by the server. Special cards carry the modifier they
/// represent.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(from = "CardRepr")]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
    pub special: Option<ModifierKey>,
}

impl Card {
    #[must_use]
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self {
            rank,
            suit,
            special: None,
        }
    }

    #[must_use]
    pub const fn with_special(mut self, special: ModifierKey) -> Self {
        self.special = Some(special);
        self
    }

    #[must_use]
    pub const fn is_special(&self) -> bool {
        self.special.is_some()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)?;
        if let Some(special) = self.special {
            write!(f, "[{special}]")?;
        }
        Ok(())
    }
}

/// A string or an integer, for fields servers don't agree on.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
}

impl From<Scalar> for String {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Text(text) => text,
            Scalar::Int(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CardRepr {
    Rank(String),
    Full {
        #[serde(default, alias = "name")]
        rank: Option<Scalar>,
        #[serde(default)]
        suit: Option<String>,
        #[serde(default, alias = "specialKind", alias = "special_kind", alias = "kind")]
        special: Option<String>,
    },
}

impl From<CardRepr> for Card {
    fn from(value: CardRepr) -> Self {
        match value {
            CardRepr::Rank(rank) => Self::new(Rank::parse(&rank), Suit::default()),
            CardRepr::Full {
                rank,
                suit,
                special,
            } => {
                let rank = rank.map_or(Rank::Blank, |rank| Rank::parse(&String::from(rank)));
                let suit = suit.as_deref().and_then(Suit::parse).unwrap_or_default();
                let special = special.and_then(|tag| match tag.parse::<ModifierKey>() {
                    Ok(key) => Some(key),
                    Err(error) => {
                        log::debug!("treating card as plain: {error}");
                        None
                    }
                });
                Self {
                    rank,
                    suit,
                    special,
                }
            }
        }
    }
}

/// Server-assigned player identifier, unique within a room.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let id = Scalar::deserialize(deserializer)?;
        Ok(Self(id.into()))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub hp: u32,
}

impl Player {
    /// A player the server hasn't named. The id doubles as the name.
    #[must_use]
    pub fn unnamed(id: PlayerId, hp: u32) -> Self {
        Self {
            name: id.to_string(),
            id,
            hp,
        }
    }
}

/// Players in the current room, keyed by id.
pub type Roster = BTreeMap<PlayerId, Player>;

/// Cards in draw order.
pub type Hand = Vec<Card>;

/// One player's line of a resolved round.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct RoundResult {
    #[serde(alias = "id", alias = "playerId")]
    pub player_id: PlayerId,
    pub total: u32,
    /// HP after the round.
    pub hp: u32,
}

/// How the game ended. An empty winner set means a draw or that the server
/// didn't say.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GameOutcome {
    pub is_over: bool,
    pub winner_ids: BTreeSet<PlayerId>,
}

impl GameOutcome {
    #[must_use]
    pub fn is_draw(&self) -> bool {
        self.is_over && self.winner_ids.is_empty()
    }

    #[must_use]
    pub fn is_winner(&self, id: &PlayerId) -> bool {
        self.winner_ids.contains(id)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ChatMessage {
    pub user: String,
    pub text: String,
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.user, self.text)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NoticeKind {
    SpecialCard,
    RoundResolved,
    GameOver,
}

/// A timestamped informational message for the player.
#[derive(Clone, Debug)]
pub struct Notice {
    pub datetime: DateTime<Utc>,
    pub kind: NoticeKind,
    pub content: String,
}

impl Notice {
    #[must_use]
    pub fn new(kind: NoticeKind, content: String) -> Self {
        Self {
            datetime: Utc::now(),
            kind,
            content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Rank Tests ===

    #[test]
    fn test_rank_parse_is_case_insensitive() {
        assert_eq!(Rank::parse("a"), Rank::Ace);
        assert_eq!(Rank::parse("k"), Rank::King);
        assert_eq!(Rank::parse(" q "), Rank::Queen);
        assert_eq!(Rank::parse("10"), Rank::Pip(10));
    }

    #[test]
    fn test_rank_parse_garbage_is_blank() {
        assert_eq!(Rank::parse(""), Rank::Blank);
        assert_eq!(Rank::parse("joker"), Rank::Blank);
        assert_eq!(Rank::parse("-3"), Rank::Blank);
    }

    // === Card Tests ===

    #[test]
    fn test_card_from_name_field() {
        let card: Card = serde_json::from_str(r#"{"name":"A"}"#).unwrap();
        assert_eq!(card, Card::new(Rank::Ace, Suit::Spade));
    }

    #[test]
    fn test_card_from_bare_string() {
        let card: Card = serde_json::from_str(r#""7""#).unwrap();
        assert_eq!(card.rank, Rank::Pip(7));
    }

    #[test]
    fn test_card_with_suit_and_special() {
        let card: Card =
            serde_json::from_str(r#"{"rank":"q","suit":"hearts","special":"pc"}"#).unwrap();
        assert_eq!(card.rank, Rank::Queen);
        assert_eq!(card.suit, Suit::Heart);
        assert_eq!(card.special, Some(ModifierKey::Pc));
    }

    #[test]
    fn test_card_unknown_special_is_plain() {
        let card: Card = serde_json::from_str(r#"{"rank":"5","kind":"ZZ"}"#).unwrap();
        assert!(!card.is_special());
    }

    #[test]
    fn test_card_numeric_rank() {
        let card: Card = serde_json::from_str(r#"{"rank":9,"suit":"♦"}"#).unwrap();
        assert_eq!(card.rank, Rank::Pip(9));
        assert_eq!(card.suit, Suit::Diamond);
    }

    #[test]
    fn test_card_display() {
        let card = Card::new(Rank::Pip(10), Suit::Club).with_special(ModifierKey::Rt);
        assert_eq!(card.to_string(), "10♣[RT]");
    }

    // === PlayerId Tests ===

    #[test]
    fn test_player_id_from_integer() {
        let id: PlayerId = serde_json::from_str("7").unwrap();
        assert_eq!(id, PlayerId::new("7"));
    }

    #[test]
    fn test_round_result_aliases() {
        let result: RoundResult =
            serde_json::from_str(r#"{"playerId":"p2","total":19,"hp":40}"#).unwrap();
        assert_eq!(result.player_id, PlayerId::new("p2"));
        assert_eq!(result.hp, 40);
    }

    // === GameOutcome Tests ===

    #[test]
    fn test_outcome_draw() {
        let outcome = GameOutcome {
            is_over: true,
            winner_ids: BTreeSet::new(),
        };
        assert!(outcome.is_draw());
        assert!(!GameOutcome::default().is_draw());
    }
}
