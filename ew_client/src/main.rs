//! Terminal client for Empire of Wagers.
//!
//! Joins a room on the game server and plays from the command line. The
//! table is re-rendered after every change.

use anyhow::{Context, Result};
use empire_wagers::ActionError;
use pico_args::Arguments;
use tokio::io::{AsyncBufReadExt, BufReader};
use url::Url;

use ew_client::{
    commands::{COMMANDS_HELP, UserCommand, parse_command},
    config::{ClientConfig, ConfigOverrides},
    connection::{ConnectionManager, SessionParams, SessionUpdate},
    display, logging,
    transport::WebSocketConnector,
};

const HELP: &str = "\
Play Empire of Wagers from the terminal

USAGE:
  ew_client [OPTIONS]

OPTIONS:
  --server HOST[:PORT]  Server address  [default: localhost:8000]
  --players N           Desired room size, 2 to 4  [default: 2]
  --name NAME           Display name  [default: your user name]

FLAGS:
  --secure              Connect with wss (build with --features tls)
  -h, --help            Print help information

ENVIRONMENT:
  EW_SERVER, EW_SECURE, EW_PLAYERS, EW_NAME, EW_KEEPALIVE_SECS,
  EW_DEFAULT_HP, EW_LOG (default log filter when RUST_LOG is unset)
";

struct Args {
    server: Option<String>,
    players: Option<u8>,
    name: Option<String>,
    secure: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        server: pargs.opt_value_from_str("--server")?,
        players: pargs.opt_value_from_str("--players")?,
        name: pargs.opt_value_from_str("--name")?,
        secure: pargs.contains("--secure"),
    };

    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let config = ClientConfig::from_env(ConfigOverrides {
        server: args.server,
        secure: args.secure,
        desired_players: args.players,
        name: args.name,
    });
    config.validate().context("Invalid configuration")?;
    logging::init(&config.log_filter);

    run(config).await
}

async fn run(config: ClientConfig) -> Result<()> {
    let endpoint = config.endpoint()?;
    let params = config.session_params();
    let mut manager = ConnectionManager::new(
        WebSocketConnector,
        config.keepalive_period(),
        config.session_settings(),
    );

    let failure = connect(&mut manager, &endpoint, &params).await;
    redraw(&manager);
    if let Some(failure) = failure {
        println!("{failure}");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break; // EOF
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(UserCommand::Quit) => break,
                    Ok(UserCommand::Help) => print!("{COMMANDS_HELP}"),
                    Ok(command) => {
                        execute(&mut manager, command, &endpoint, &params).await;
                    }
                    Err(error) => eprintln!("{error}"),
                }
            }
            Some(update) = manager.next_update(), if manager.is_connected() => {
                match update {
                    SessionUpdate::Changed | SessionUpdate::Chat(_) => redraw(&manager),
                    SessionUpdate::Finished => {
                        redraw(&manager);
                        println!("Type 'connect' to play again.");
                    }
                    SessionUpdate::Closed { reason, reset } => {
                        redraw(&manager);
                        match reason {
                            Some(reason) => println!("Connection lost: {reason}"),
                            None => println!("Server closed the connection."),
                        }
                        if reset {
                            println!("Type 'connect' to join a new game.");
                        }
                    }
                }
            }
        }
    }

    manager.disconnect("client exit").await;
    println!("\nDisconnected.");
    Ok(())
}

async fn execute(
    manager: &mut ConnectionManager<WebSocketConnector>,
    command: UserCommand,
    endpoint: &Url,
    params: &SessionParams,
) {
    let outcome: Result<Option<String>, ActionError> = match command {
        UserCommand::Draw => manager.draw().map(|()| None),
        UserCommand::Stand => manager.stand().map(|()| None),
        UserCommand::Arm(key) => manager.arm_modifier(key).map(|armed| {
            Some(match armed {
                Some(key) => format!("{key} armed for your next action"),
                None => format!("{key} disarmed"),
            })
        }),
        UserCommand::Disarm => {
            manager.disarm_modifier();
            Ok(None)
        }
        UserCommand::Next => manager.advance_round().map(|()| None),
        UserCommand::Chat(text) => manager.chat(&text).map(|_| None),
        UserCommand::Connect => Ok(connect(manager, endpoint, params).await),
        UserCommand::Disconnect => {
            manager.disconnect("requested by player").await;
            Ok(None)
        }
        UserCommand::Help | UserCommand::Quit => Ok(None),
    };

    match outcome {
        Ok(note) => {
            redraw(manager);
            if let Some(note) = note {
                println!("{note}");
            }
        }
        Err(error) => eprintln!("Can't do that: {error}"),
    }
}

/// Connect, returning a message for the player if it failed.
async fn connect(
    manager: &mut ConnectionManager<WebSocketConnector>,
    endpoint: &Url,
    params: &SessionParams,
) -> Option<String> {
    println!("Connecting as {}...", params.name);
    match manager.connect(endpoint, params).await {
        Ok(()) => None,
        Err(error) => {
            tracing::warn!(%error, "connect failed");
            Some(format!("Failed to connect: {error}"))
        }
    }
}

fn redraw(manager: &ConnectionManager<WebSocketConnector>) {
    // Clear screen and move cursor to top
    print!("\x1B[2J\x1B[1;1H");
    println!("{}", display::render(&manager.view(), manager.chat_log()));
}
