//! Plain-text rendering of a session snapshot.

use chrono::Local;
use empire_wagers::{ChatMessage, Phase, SessionView, entities::Card};
use std::{
    collections::VecDeque,
    fmt::{self, Write},
};

/// Notices shown under the table.
const RECENT_NOTICES: usize = 5;
const RECENT_CHAT: usize = 6;
const WIDTH: usize = 60;

/// Render `view` as a text table, with the tail of `chat` below it.
#[must_use]
pub fn render(view: &SessionView, chat: &VecDeque<ChatMessage>) -> String {
    Table { view, chat }.to_string()
}

struct Table<'a> {
    view: &'a SessionView,
    chat: &'a VecDeque<ChatMessage>,
}

impl fmt::Display for Table<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.view;
        writeln!(f, "{}", "═".repeat(WIDTH))?;
        write!(f, "EMPIRE OF WAGERS  [{}]", view.phase)?;
        if let Some(room_id) = &view.room_id {
            write!(f, "  room {room_id}")?;
        }
        if let Some(count) = view.player_count
            && matches!(view.phase, Phase::LobbyWaiting(_))
        {
            write!(f, "  ({count} joined)")?;
        }
        writeln!(f)?;
        writeln!(f, "{}", "═".repeat(WIDTH))?;

        if view.roster.is_empty() {
            writeln!(f, "No players yet")?;
        } else {
            writeln!(f, "Players:")?;
            for player in &view.roster {
                let is_local = view.local_player_id.as_ref() == Some(&player.id);
                let marker = if is_local { "→" } else { " " };
                let winner = if view.outcome.is_winner(&player.id) {
                    " ★"
                } else {
                    ""
                };
                write!(f, " {marker} {} - {} hp{winner}", player.name, player.hp)?;
                if let Some(hand) = view.hands.get(&player.id) {
                    write!(f, " - {}", cards(hand))?;
                }
                writeln!(f)?;
            }
        }

        if !view.results.is_empty() {
            writeln!(f, "{}", "─".repeat(WIDTH))?;
            writeln!(f, "Results:")?;
            for result in &view.results {
                writeln!(
                    f,
                    "   {}: scored {}, {} hp",
                    result.player_id, result.total, result.hp
                )?;
            }
        }

        writeln!(f, "{}", "─".repeat(WIDTH))?;
        if view.hand.is_empty() {
            writeln!(f, "Hand: (empty)")?;
        } else {
            write!(f, "Hand: {}  = {}", cards(&view.hand), view.hand_score)?;
            if view.is_bust {
                write!(f, " BUST")?;
            }
            writeln!(f)?;
        }
        if view.planted {
            writeln!(f, "Standing")?;
        }
        if let Some(key) = view.armed_modifier {
            writeln!(f, "Armed modifier: {key}")?;
        }

        if view.outcome.is_over {
            if view.outcome.is_draw() {
                writeln!(f, "Game over: no winner")?;
            } else {
                let winners: Vec<&str> = view
                    .outcome
                    .winner_ids
                    .iter()
                    .map(|id| id.as_str())
                    .collect();
                writeln!(f, "Game over: {} won", winners.join(", "))?;
            }
        }

        let skip = view.notices.len().saturating_sub(RECENT_NOTICES);
        for notice in view.notices.iter().skip(skip) {
            writeln!(
                f,
                "[{}] {}",
                notice.datetime.with_timezone(&Local).format("%H:%M:%S"),
                notice.content
            )?;
        }

        if !self.chat.is_empty() {
            writeln!(f, "{}", "─".repeat(WIDTH))?;
            let skip = self.chat.len().saturating_sub(RECENT_CHAT);
            for message in self.chat.iter().skip(skip) {
                writeln!(f, "{message}")?;
            }
        }

        writeln!(f, "{}", "═".repeat(WIDTH))?;
        write!(f, "Commands: {}, quit", view.actions)
    }
}

fn cards(hand: &[Card]) -> String {
    let mut out = String::new();
    for (i, card) in hand.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        // writing to a String can't fail
        let _ = write!(out, "{card}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use empire_wagers::{SessionMachine, messages::decode};

    fn feed(machine: &mut SessionMachine, frame: &str) {
        machine.apply(decode(frame).unwrap());
    }

    fn line(user: &str, text: &str) -> ChatMessage {
        ChatMessage {
            user: user.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_render_idle() {
        let out = render(&SessionMachine::default().view(), &VecDeque::new());
        assert!(out.contains("[idle]"));
        assert!(out.contains("No players yet"));
        assert!(out.contains("Commands: connect, quit"));
    }

    #[test]
    fn test_render_round() {
        let mut machine = SessionMachine::default();
        machine.begin_session();
        feed(
            &mut machine,
            r#"{"type":"start","player_id":"p1","roster":[{"id":"p1","name":"Ana"},{"id":"p2","name":"Bo","hp":80}]}"#,
        );
        feed(&mut machine, r#"{"type":"update_hand","hand":[{"rank":"K","suit":"♥"},{"rank":"Q","suit":"♠"},{"rank":"5","suit":"♣"}]}"#);

        let out = render(&machine.view(), &VecDeque::new());
        assert!(out.contains("[active-round]"));
        assert!(out.contains("→ Ana - 100 hp"));
        assert!(out.contains("Bo - 80 hp"));
        assert!(out.contains("Hand: K♥ Q♠ 5♣  = 25 BUST"));
        assert!(out.contains("draw, stand"));
    }

    #[test]
    fn test_render_game_over() {
        let mut machine = SessionMachine::default();
        machine.begin_session();
        feed(&mut machine, r#"{"type":"start","player_id":"p1"}"#);
        feed(&mut machine, r#"{"type":"game_over","winnerIds":["p1"]}"#);

        let out = render(&machine.view(), &VecDeque::new());
        assert!(out.contains("Game over: p1 won"));
        assert!(out.contains("p1 - 100 hp ★"));
    }

    #[test]
    fn test_render_chat_tail() {
        let chat: VecDeque<ChatMessage> = (0..RECENT_CHAT + 2)
            .map(|i| line("Bo", &format!("line {i}")))
            .collect();

        let out = render(&SessionMachine::default().view(), &chat);
        assert!(!out.contains("line 0"));
        assert!(!out.contains("line 1"));
        assert!(out.contains(&line("Bo", "line 2").to_string()));
        assert!(out.contains(&line("Bo", &format!("line {}", RECENT_CHAT + 1)).to_string()));
    }
}
