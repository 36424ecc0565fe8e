/// Property-based tests for hand scoring using proptest
///
/// These tests check the blackjack arithmetic across randomly generated
/// hands, including the soft-ace reduction and the unclamped bust total.
use empire_wagers::game::{
    constants::BUST_LIMIT,
    entities::{Card, Rank, Suit},
    functional::{card_value, is_bust, score},
};
use proptest::prelude::*;

fn suit_strategy() -> impl Strategy<Value = Suit> {
    (0u8..=3).prop_map(|suit_idx| match suit_idx {
        0 => Suit::Club,
        1 => Suit::Diamond,
        2 => Suit::Heart,
        _ => Suit::Spade,
    })
}

// Strategy to generate any rank a server deals (1 = ace, 11-13 = faces)
fn rank_strategy() -> impl Strategy<Value = Rank> {
    (1u8..=13).prop_map(|value| match value {
        1 => Rank::Ace,
        11 => Rank::Jack,
        12 => Rank::Queen,
        13 => Rank::King,
        pip => Rank::Pip(pip),
    })
}

fn card_strategy() -> impl Strategy<Value = Card> {
    (rank_strategy(), suit_strategy()).prop_map(|(rank, suit)| Card::new(rank, suit))
}

fn hand_strategy(max: usize) -> impl Strategy<Value = Vec<Card>> {
    prop::collection::vec(card_strategy(), 0..=max)
}

fn aceless_hand_strategy() -> impl Strategy<Value = Vec<Card>> {
    prop::collection::vec(card_strategy(), 0..=8)
        .prop_map(|cards| cards.into_iter().filter(|c| c.rank != Rank::Ace).collect())
}

fn raw_sum(cards: &[Card]) -> u32 {
    cards.iter().map(card_value).sum()
}

proptest! {
    #[test]
    fn test_aceless_hand_is_plain_sum(cards in aceless_hand_strategy()) {
        prop_assert_eq!(score(&cards), raw_sum(&cards));
    }

    #[test]
    fn test_score_deterministic(cards in hand_strategy(10)) {
        prop_assert_eq!(score(&cards), score(&cards), "score() should be deterministic");
    }

    #[test]
    fn test_score_never_exceeds_raw_sum(cards in hand_strategy(10)) {
        prop_assert!(score(&cards) <= raw_sum(&cards));
    }

    #[test]
    fn test_score_independent_of_order(cards in hand_strategy(8)) {
        let mut reversed = cards.clone();
        reversed.reverse();
        prop_assert_eq!(score(&cards), score(&reversed));
    }

    #[test]
    fn test_suits_and_specials_dont_score(cards in hand_strategy(8)) {
        let respaded: Vec<Card> = cards
            .iter()
            .map(|card| Card::new(card.rank, Suit::Spade).with_special(empire_wagers::ModifierKey::Rt))
            .collect();
        prop_assert_eq!(score(&cards), score(&respaded));
    }

    #[test]
    fn test_aces_only_reduce_while_bust(cards in hand_strategy(10)) {
        let aces = cards.iter().filter(|c| c.rank == Rank::Ace).count() as u32;
        let raw = raw_sum(&cards);
        let total = score(&cards);

        // Each reduction is exactly 10, and only as many as there are aces
        prop_assert_eq!((raw - total) % 10, 0);
        prop_assert!((raw - total) / 10 <= aces);

        // A reduced hand stops at the first total that isn't bust
        if total < raw {
            prop_assert!(total + 10 > BUST_LIMIT, "reduced one ace too many");
        }

        // Still bust only when every ace is already low
        if total > BUST_LIMIT {
            prop_assert_eq!(raw - total, aces * 10);
        }
    }

    #[test]
    fn test_is_bust_matches_score(cards in hand_strategy(10)) {
        prop_assert_eq!(is_bust(&cards), score(&cards) > BUST_LIMIT);
    }

    #[test]
    fn test_adding_a_card_never_lowers_score_below_hard_total(
        cards in hand_strategy(6),
        extra in card_strategy(),
    ) {
        let mut longer = cards.clone();
        longer.push(extra);
        let hard_total: u32 = longer
            .iter()
            .map(|card| if card.rank == Rank::Ace { 1 } else { card_value(card) })
            .sum();
        prop_assert!(score(&longer) >= hard_total);
    }
}
