// Shared models for the Lichess bot
use serde::{Deserialize, Serialize};

pub mod events;

pub use events::{
    ChallengeInfo, GameEventInfo, GameFullInfo, GameStateEvent, GameStateSnapshot, IncomingEvent,
    IncomingEventKind, PlayerInfo,
};

// ============================================================================
// Players & Sides
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two turn slots the bot holds in a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    FirstMover,
    SecondMover,
}

impl Side {
    /// Parity of the move count at which this side is to move
    pub fn parity(&self) -> usize {
        match self {
            Side::FirstMover => 0,
            Side::SecondMover => 1,
        }
    }

    /// Whether this side is to move after `ply` half-moves have been played
    pub fn to_move_at(&self, ply: usize) -> bool {
        ply % 2 == self.parity()
    }
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::FirstMover,
            Color::Black => Side::SecondMover,
        }
    }
}

// ============================================================================
// Accounts
// ============================================================================

/// Subset of `GET /api/account` used to identify the bot on connect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Split a server move string ("e2e4 e7e5 ...") into tokens.
///
/// An empty or blank string yields an empty history.
pub fn parse_move_list(moves: &str) -> Vec<String> {
    moves.split_whitespace().map(str::to_string).collect()
}
