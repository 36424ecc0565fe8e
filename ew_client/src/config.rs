//! Client configuration management.
//!
//! Consolidates all environment variable reads and provides validated
//! configuration. Command-line flags override the environment.

use empire_wagers::{
    SessionSettings,
    constants::{DEFAULT_HP, MAX_DESIRED_PLAYERS, MIN_DESIRED_PLAYERS},
};
use std::time::Duration;
use url::Url;

use crate::connection::SessionParams;

/// Display name used when the OS user name is blank.
pub const FALLBACK_NAME: &str = "Operador_21";
pub const MAX_NAME_LEN: usize = 32;

/// Complete client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server `host[:port]`
    pub server: String,
    /// Use `wss` instead of `ws`
    pub secure: bool,
    /// Desired room size
    pub desired_players: u8,
    /// Display name
    pub name: String,
    pub keepalive_secs: u64,
    /// HP shown until the server reports one
    pub default_hp: u32,
    /// Log filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub server: Option<String>,
    pub secure: bool,
    pub desired_players: Option<u8>,
    pub name: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables, then apply
    /// `overrides`.
    pub fn from_env(overrides: ConfigOverrides) -> Self {
        Self::from_vars(|key| std::env::var(key).ok(), overrides)
    }

    /// Load configuration through `lookup` instead of the process
    /// environment.
    pub fn from_vars<F>(lookup: F, overrides: ConfigOverrides) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = overrides
            .server
            .or_else(|| lookup("EW_SERVER"))
            .unwrap_or_else(|| "localhost:8000".to_string());

        let secure = overrides.secure || parse_var_or(&lookup, "EW_SECURE", false);

        let desired_players = overrides
            .desired_players
            .unwrap_or_else(|| parse_var_or(&lookup, "EW_PLAYERS", MIN_DESIRED_PLAYERS));

        let name = overrides
            .name
            .or_else(|| lookup("EW_NAME"))
            .unwrap_or_else(default_name);

        Self {
            server,
            secure,
            desired_players,
            name,
            keepalive_secs: parse_var_or(&lookup, "EW_KEEPALIVE_SECS", 10),
            default_hp: parse_var_or(&lookup, "EW_DEFAULT_HP", DEFAULT_HP),
            log_filter: lookup("EW_LOG").unwrap_or_else(|| "warn".to_string()),
        }
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_DESIRED_PLAYERS..=MAX_DESIRED_PLAYERS).contains(&self.desired_players) {
            return Err(ConfigError::Invalid {
                var: "EW_PLAYERS".to_string(),
                reason: format!(
                    "Must be between {MIN_DESIRED_PLAYERS} and {MAX_DESIRED_PLAYERS}, got {}",
                    self.desired_players
                ),
            });
        }

        let name = self.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Invalid {
                var: "EW_NAME".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        if name.chars().count() > MAX_NAME_LEN {
            return Err(ConfigError::Invalid {
                var: "EW_NAME".to_string(),
                reason: format!("Must be at most {MAX_NAME_LEN} characters"),
            });
        }

        if self.keepalive_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "EW_KEEPALIVE_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        self.endpoint()?;
        Ok(())
    }

    /// The game endpoint without session query parameters.
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let scheme = if self.secure { "wss" } else { "ws" };
        let url = Url::parse(&format!("{scheme}://{}/ws/game", self.server)).map_err(|error| {
            ConfigError::Invalid {
                var: "EW_SERVER".to_string(),
                reason: format!("'{}' is not a valid host: {error}", self.server),
            }
        })?;
        if url.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::Invalid {
                var: "EW_SERVER".to_string(),
                reason: "Missing host".to_string(),
            });
        }
        Ok(url)
    }

    #[must_use]
    pub fn session_params(&self) -> SessionParams {
        SessionParams {
            desired_players: self.desired_players,
            name: self.name.trim().to_string(),
        }
    }

    #[must_use]
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            default_hp: self.default_hp,
        }
    }

    #[must_use]
    pub fn keepalive_period(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn default_name() -> String {
    let name = whoami::username();
    if name.trim().is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name
    }
}

/// Helper to parse a variable with default fallback
fn parse_var_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
