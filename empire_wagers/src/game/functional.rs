//! Hand scoring.

use super::{
    constants::{ACE_HIGH, BUST_LIMIT, FACE_VALUE, SOFT_ACE_DELTA},
    entities::{Card, Rank},
};

/// Value of a single card before soft-ace reduction.
#[must_use]
pub fn card_value(card: &Card) -> u32 {
    match card.rank {
        Rank::Ace => ACE_HIGH,
        Rank::Jack | Rank::Queen | Rank::King => FACE_VALUE,
        Rank::Pip(value) => u32::from(value),
        Rank::Blank => 0,
    }
}

/// Score a hand with blackjack arithmetic: aces count 11 and drop to 1 one
/// at a time while the total is over the bust limit. The result is not
/// clamped, so a bust hand scores above 21.
#[must_use]
pub fn score(hand: &[Card]) -> u32 {
    let mut total = 0;
    let mut aces = 0;
    for card in hand {
        total += card_value(card);
        if card.rank == Rank::Ace {
            aces += 1;
        }
    }

    while total > BUST_LIMIT && aces > 0 {
        total -= SOFT_ACE_DELTA;
        aces -= 1;
    }

    total
}

#[must_use]
pub fn is_bust(hand: &[Card]) -> bool {
    score(hand) > BUST_LIMIT
}
