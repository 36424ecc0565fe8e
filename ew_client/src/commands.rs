use empire_wagers::ModifierKey;
use std::fmt;

/// A line of player input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UserCommand {
    Draw,
    Stand,
    /// Toggle a modifier for the next action.
    Arm(ModifierKey),
    Disarm,
    /// Move on from a resolved round.
    Next,
    Chat(String),
    Connect,
    Disconnect,
    Help,
    Quit,
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Modifier command without a key.
    MissingModifier,
    /// Key that isn't one of the six modifiers.
    UnknownModifier(String),
    /// Chat command without any text.
    EmptyChat,
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = ModifierKey::ALL.iter().map(|key| key.as_str()).collect();
        match self {
            Self::MissingModifier => write!(
                f,
                "Modifier command requires a key (e.g., 'mod PC'). Keys: {}",
                keys.join(", ")
            ),
            Self::UnknownModifier(value) => write!(
                f,
                "Unknown modifier '{}'. Keys: {}",
                value,
                keys.join(", ")
            ),
            Self::EmptyChat => write!(f, "Chat requires a message (e.g., 'chat good luck')"),
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{}'. Type 'help' to see available commands",
                cmd
            ),
        }
    }
}

impl std::error::Error for ParseError {}

pub const COMMANDS_HELP: &str = "\
Commands:
  draw                 Ask for another card
  stand                Keep your hand for this round
  mod KEY | arm KEY    Toggle a modifier for your next action (SC, VN, NR, EL, PC, RT)
  disarm               Clear the armed modifier
  next                 Continue after a round is resolved
  chat TEXT | say TEXT Send a chat message
  connect              Join a new game
  disconnect           Leave the current game
  help                 Show this help
  quit | exit          Leave and exit
";

/// Parse a command string into a UserCommand.
///
/// The command word is case-insensitive. Chat text keeps its case.
///
/// # Examples
///
/// ```
/// use ew_client::commands::{UserCommand, parse_command};
/// use empire_wagers::ModifierKey;
///
/// assert_eq!(parse_command("draw"), Ok(UserCommand::Draw));
/// assert_eq!(parse_command("mod pc"), Ok(UserCommand::Arm(ModifierKey::Pc)));
/// assert_eq!(parse_command("say Hi all"), Ok(UserCommand::Chat("Hi all".to_string())));
/// ```
pub fn parse_command(input: &str) -> Result<UserCommand, ParseError> {
    let trimmed = input.trim();
    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (trimmed, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "draw" | "hit" => Ok(UserCommand::Draw),
        "stand" => Ok(UserCommand::Stand),
        "mod" | "arm" => parse_modifier(rest),
        "disarm" => Ok(UserCommand::Disarm),
        "next" => Ok(UserCommand::Next),
        "chat" | "say" => {
            if rest.is_empty() {
                Err(ParseError::EmptyChat)
            } else {
                Ok(UserCommand::Chat(rest.to_string()))
            }
        }
        "connect" => Ok(UserCommand::Connect),
        "disconnect" => Ok(UserCommand::Disconnect),
        "help" | "?" => Ok(UserCommand::Help),
        "quit" | "exit" => Ok(UserCommand::Quit),
        _ => Err(ParseError::UnrecognizedCommand(trimmed.to_string())),
    }
}

/// Parse the key of a modifier command: "mod KEY"
fn parse_modifier(rest: &str) -> Result<UserCommand, ParseError> {
    let mut parts = rest.split_ascii_whitespace();
    match (parts.next(), parts.next()) {
        (None, _) => Err(ParseError::MissingModifier),
        (Some(key), None) => key
            .parse::<ModifierKey>()
            .map(UserCommand::Arm)
            .map_err(|_| ParseError::UnknownModifier(key.to_string())),
        (Some(_), Some(_)) => Err(ParseError::UnknownModifier(rest.to_string())),
    }
}
