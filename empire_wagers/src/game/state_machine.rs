//! Session state machine.
//!
//! Turns the ordered stream of decoded server events into a consistent,
//! displayable session, and validates local actions before anything is
//! sent. The machine is the single writer of session state: events go
//! through [`SessionMachine::apply`], local intents through the action
//! methods.

use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;

use super::{
    constants::{BUST_LIMIT, DEFAULT_HP, MAX_NOTICES},
    entities::{
        Card, ChatMessage, GameOutcome, Hand, Notice, NoticeKind, Player, PlayerId, Roster,
        RoundResult,
    },
    functional,
    modifier::{ModifierController, ModifierKey},
    states::{ActionSet, ActiveRound, GameOver, Idle, LobbyWaiting, Phase, PhaseRules, RoundResolved},
};
use crate::net::messages::{ClientIntent, Decision, RosterUpdate, ServerEvent};

/// Local actions rejected before anything reaches the network.
#[derive(Debug, Eq, Error, PartialEq)]
pub enum ActionError {
    #[error("can't {action} during {phase}")]
    WrongPhase { action: &'static str, phase: Phase },
    #[error("hand is bust at {score}")]
    Bust { score: u32 },
    #[error("can't send an empty chat message")]
    EmptyChat,
}

/// What applying an event did.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Applied {
    /// Session state changed.
    Updated,
    /// A chat line for the UI. Session state is untouched.
    Chat(ChatMessage),
    /// Nothing changed.
    Ignored,
    /// The game is over. Nothing else will be applied.
    Finished,
}

/// Session configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionSettings {
    /// HP shown for a player until the server reports one.
    pub default_hp: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_hp: DEFAULT_HP,
        }
    }
}

/// Everything known about the current session.
#[derive(Debug, Default)]
pub struct SessionData {
    pub room_id: Option<String>,
    pub local_player_id: Option<PlayerId>,
    /// Players in the room as last reported while it was forming.
    pub player_count: Option<u32>,
    pub roster: Roster,
    /// The local hand in draw order.
    pub hand: Hand,
    /// Hands revealed by the last round result.
    pub hands: BTreeMap<PlayerId, Hand>,
    pub results: Vec<RoundResult>,
    pub outcome: GameOutcome,
    /// Set once the local player stands. Advisory only.
    pub planted: bool,
    pub(crate) modifier: ModifierController,
    pub(crate) notices: VecDeque<Notice>,
}

/// An owned snapshot of the session for the UI.
#[derive(Clone, Debug)]
pub struct SessionView {
    pub phase: Phase,
    pub actions: ActionSet,
    pub room_id: Option<String>,
    pub local_player_id: Option<PlayerId>,
    pub player_count: Option<u32>,
    pub roster: Vec<Player>,
    pub hand: Hand,
    pub hand_score: u32,
    pub is_bust: bool,
    pub hands: BTreeMap<PlayerId, Hand>,
    pub results: Vec<RoundResult>,
    pub outcome: GameOutcome,
    pub planted: bool,
    pub armed_modifier: Option<ModifierKey>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Default)]
pub struct SessionMachine {
    phase: Phase,
    data: SessionData,
    settings: SessionSettings,
}

impl SessionMachine {
    #[must_use]
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            phase: Phase::default(),
            data: SessionData::default(),
            settings,
        }
    }

    // === Lifecycle ===

    /// Start a brand-new session, discarding anything from the last one.
    pub fn begin_session(&mut self) {
        self.data = SessionData::default();
        self.phase = LobbyWaiting.into();
    }

    /// Full local reset back to idle.
    pub fn reset(&mut self) {
        self.data = SessionData::default();
        self.phase = Idle.into();
    }

    /// The transport closed. Resets to idle unless the game already ended.
    /// Returns whether a reset happened.
    pub fn transport_closed(&mut self) -> bool {
        if self.is_game_over() {
            false
        } else {
            self.reset();
            true
        }
    }

    // === Events ===

    /// Apply a decoded server event.
    pub fn apply(&mut self, event: ServerEvent) -> Applied {
        if self.is_game_over() {
            log::debug!("ignoring {event} after game over");
            return Applied::Ignored;
        }

        match event {
            ServerEvent::GameOver {
                results,
                winner_ids,
            } => {
                self.finish(results, winner_ids);
                Applied::Finished
            }
            _ if !self.phase.is_live() => {
                log::debug!("ignoring {event} while {}", self.phase);
                Applied::Ignored
            }
            ServerEvent::Waiting {
                room_id,
                player_count,
                roster,
            } => {
                self.data.room_id = Some(room_id);
                self.data.player_count = Some(player_count);
                if let Some(roster) = roster {
                    self.replace_roster(roster);
                }
                Applied::Updated
            }
            ServerEvent::Start { player_id, roster } => {
                self.start_round(player_id, roster);
                Applied::Updated
            }
            ServerEvent::DrawResult { card } => self.push_card(card),
            ServerEvent::UpdateHand { hand } => {
                if !matches!(self.phase, Phase::ActiveRound(_)) {
                    log::debug!("ignoring update_hand while {}", self.phase);
                    return Applied::Ignored;
                }
                self.data.hand = hand;
                Applied::Updated
            }
            ServerEvent::RoundResult { results, hands } => {
                self.resolve_round(results, hands);
                Applied::Updated
            }
            ServerEvent::PlayersList { roster } => {
                self.replace_roster(roster);
                Applied::Updated
            }
            ServerEvent::Chat(message) => Applied::Chat(message),
        }
    }

    fn start_round(&mut self, player_id: Option<PlayerId>, roster: Option<RosterUpdate>) {
        self.data.hand.clear();
        self.data.hands.clear();
        self.data.results.clear();
        self.data.planted = false;
        self.data.modifier.disarm();
        // Only the opening start resets HP. Later rounds keep what the
        // server last reported.
        if matches!(self.phase, Phase::LobbyWaiting(_)) {
            for player in self.data.roster.values_mut() {
                player.hp = self.settings.default_hp;
            }
        }
        if let Some(id) = player_id {
            self.data.local_player_id = Some(id);
        }
        if let Some(roster) = roster {
            self.replace_roster(roster);
        }
        if let Some(id) = self.data.local_player_id.clone() {
            let default_hp = self.settings.default_hp;
            self.data
                .roster
                .entry(id.clone())
                .or_insert_with(|| Player::unnamed(id, default_hp));
        }
        self.phase = ActiveRound.into();
    }

    fn push_card(&mut self, card: Card) -> Applied {
        if !matches!(self.phase, Phase::ActiveRound(_)) {
            log::debug!("ignoring draw_result while {}", self.phase);
            return Applied::Ignored;
        }
        if let Some(special) = card.special {
            self.push_notice(
                NoticeKind::SpecialCard,
                format!("drew special card {card} ({special} modifier)"),
            );
        }
        self.data.hand.push(card);
        Applied::Updated
    }

    fn resolve_round(
        &mut self,
        results: Vec<RoundResult>,
        hands: Option<BTreeMap<PlayerId, Vec<Card>>>,
    ) {
        self.data.results = results;
        if let Some(hands) = hands {
            self.data.hands = hands;
        }
        self.sync_hp_from_results();
        self.data.planted = false;
        self.data.modifier.disarm();

        let summary = self
            .local_result()
            .map_or_else(
                || "round resolved".to_string(),
                |result| {
                    format!(
                        "round resolved: you scored {}, {} hp left",
                        result.total, result.hp
                    )
                },
            );
        self.push_notice(NoticeKind::RoundResolved, summary);
        self.phase = RoundResolved.into();
    }

    fn finish(&mut self, results: Option<Vec<RoundResult>>, winner_ids: Option<Vec<PlayerId>>) {
        if let Some(results) = results {
            self.data.results = results;
            self.sync_hp_from_results();
        }
        self.data.outcome = GameOutcome {
            is_over: true,
            winner_ids: winner_ids.unwrap_or_default().into_iter().collect(),
        };
        self.data.planted = false;
        self.data.modifier.disarm();

        let summary = if self.data.outcome.winner_ids.is_empty() {
            "game over: no winner".to_string()
        } else {
            let winners: Vec<&str> = self
                .data
                .outcome
                .winner_ids
                .iter()
                .map(|id| {
                    self.data
                        .roster
                        .get(id)
                        .map_or(id.as_str(), |player| player.name.as_str())
                })
                .collect();
            format!("game over: {} won", winners.join(", "))
        };
        self.push_notice(NoticeKind::GameOver, summary);
        self.phase = GameOver.into();
        log::info!("session finished");
    }

    /// Replace the roster wholesale. Entries without HP keep whatever was
    /// last reported for that id, or the session default.
    fn replace_roster(&mut self, update: RosterUpdate) {
        let previous = std::mem::take(&mut self.data.roster);
        self.data.roster = update
            .into_entries()
            .into_iter()
            .map(|(id, entry)| {
                let hp = entry
                    .hp
                    .or_else(|| previous.get(&id).map(|player| player.hp))
                    .unwrap_or(self.settings.default_hp);
                let player = match entry.name {
                    Some(name) => Player {
                        id: id.clone(),
                        name,
                        hp,
                    },
                    None => Player::unnamed(id.clone(), hp),
                };
                (id, player)
            })
            .collect();
    }

    /// Results are authoritative for HP. A result for a player the roster
    /// doesn't know yet adds them.
    fn sync_hp_from_results(&mut self) {
        for result in &self.data.results {
            self.data
                .roster
                .entry(result.player_id.clone())
                .or_insert_with(|| Player::unnamed(result.player_id.clone(), result.hp))
                .hp = result.hp;
        }
    }

    fn push_notice(&mut self, kind: NoticeKind, content: String) {
        if self.data.notices.len() == MAX_NOTICES {
            self.data.notices.pop_front();
        }
        self.data.notices.push_back(Notice::new(kind, content));
    }

    // === Actions ===

    fn require(&self, allowed: bool, action: &'static str) -> Result<(), ActionError> {
        if allowed {
            Ok(())
        } else {
            Err(ActionError::WrongPhase {
                action,
                phase: self.phase,
            })
        }
    }

    /// Ask for another card. Rejected outside a round or on a bust hand. Any
    /// armed modifier rides along and is cleared.
    pub fn draw(&mut self) -> Result<ClientIntent, ActionError> {
        self.require(self.phase.available_actions().draw, "draw")?;
        let score = self.hand_score();
        if score > BUST_LIMIT {
            return Err(ActionError::Bust { score });
        }
        let modifier = self.data.modifier.take_for_next_action();
        Ok(ClientIntent::action(Decision::Draw, modifier))
    }

    /// Stand for the rest of the round. Any armed modifier rides along and
    /// is cleared.
    pub fn stand(&mut self) -> Result<ClientIntent, ActionError> {
        self.require(self.phase.available_actions().stand, "stand")?;
        let modifier = self.data.modifier.take_for_next_action();
        self.data.planted = true;
        Ok(ClientIntent::action(Decision::Stand, modifier))
    }

    /// Toggle `key` as the modifier for the next action. Returns the key
    /// armed afterwards.
    pub fn arm_modifier(&mut self, key: ModifierKey) -> Result<Option<ModifierKey>, ActionError> {
        self.require(
            self.phase.available_actions().arm_modifier,
            "arm a modifier",
        )?;
        Ok(self.data.modifier.arm(key))
    }

    pub fn disarm_modifier(&mut self) {
        self.data.modifier.disarm();
    }

    /// Move on from a resolved round while waiting for the server's next
    /// `start`. Local only.
    pub fn advance_round(&mut self) -> Result<(), ActionError> {
        self.require(
            self.phase.available_actions().advance_round,
            "advance the round",
        )?;
        self.data.hand.clear();
        self.data.hands.clear();
        self.data.results.clear();
        self.data.planted = false;
        self.phase = ActiveRound.into();
        Ok(())
    }

    /// Build a chat intent from `user`. The text is trimmed.
    pub fn chat(&self, user: &str, text: &str) -> Result<ClientIntent, ActionError> {
        self.require(self.phase.available_actions().chat, "chat")?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ActionError::EmptyChat);
        }
        Ok(ClientIntent::chat(user, text))
    }

    // === Queries ===

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver(_))
    }

    #[must_use]
    pub fn data(&self) -> &SessionData {
        &self.data
    }

    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    #[must_use]
    pub fn hand_score(&self) -> u32 {
        functional::score(&self.data.hand)
    }

    #[must_use]
    pub fn armed_modifier(&self) -> Option<ModifierKey> {
        self.data.modifier.armed()
    }

    #[must_use]
    pub fn local_player(&self) -> Option<&Player> {
        self.data
            .local_player_id
            .as_ref()
            .and_then(|id| self.data.roster.get(id))
    }

    fn local_result(&self) -> Option<&RoundResult> {
        let id = self.data.local_player_id.as_ref()?;
        self.data
            .results
            .iter()
            .find(|result| &result.player_id == id)
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.data.notices.iter()
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        let hand_score = self.hand_score();
        SessionView {
            phase: self.phase,
            actions: self.phase.available_actions(),
            room_id: self.data.room_id.clone(),
            local_player_id: self.data.local_player_id.clone(),
            player_count: self.data.player_count,
            roster: self.data.roster.values().cloned().collect(),
            hand: self.data.hand.clone(),
            hand_score,
            is_bust: hand_score > BUST_LIMIT,
            hands: self.data.hands.clone(),
            results: self.data.results.clone(),
            outcome: self.data.outcome.clone(),
            planted: self.data.planted,
            armed_modifier: self.data.modifier.armed(),
            notices: self.data.notices.iter().cloned().collect(),
        }
    }
}
