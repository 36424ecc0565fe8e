/// Highest hand score that isn't a bust.
pub const BUST_LIMIT: u32 = 21;

/// Value of an ace before any soft-ace reduction.
pub const ACE_HIGH: u32 = 11;

/// Amount subtracted when an ace is counted as 1 instead of 11.
pub const SOFT_ACE_DELTA: u32 = 10;

/// Value of a jack, queen, or king.
pub const FACE_VALUE: u32 = 10;

/// HP displayed for a player until the server reports one.
pub const DEFAULT_HP: u32 = 100;

/// Maximum number of notices retained in a session.
pub const MAX_NOTICES: usize = 64;

/// Smallest room a player can ask for.
pub const MIN_DESIRED_PLAYERS: u8 = 2;

/// Largest room a player can ask for.
pub const MAX_DESIRED_PLAYERS: u8 = 4;
