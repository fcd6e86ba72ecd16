//! Lichess Bot API stream payloads
//!
//! Both streams are newline-delimited JSON objects discriminated by `type`.
//! They are decoded once at the stream boundary; nothing downstream inspects
//! raw JSON fields.

use serde::{Deserialize, Serialize};

use super::{parse_move_list, Color};

// ============================================================================
// Incoming event stream (/api/stream/event)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IncomingEvent {
    Challenge { challenge: ChallengeInfo },
    ChallengeCanceled { challenge: ChallengeInfo },
    ChallengeDeclined { challenge: ChallengeInfo },
    GameStart { game: GameEventInfo },
    GameFinish { game: GameEventInfo },
    #[serde(other)]
    Unknown,
}

/// Payload-free discriminant, kept by the dispatcher to recognise rematches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomingEventKind {
    Challenge,
    ChallengeCanceled,
    ChallengeDeclined,
    GameStart,
    GameFinish,
    Unknown,
}

impl IncomingEvent {
    pub fn kind(&self) -> IncomingEventKind {
        match self {
            IncomingEvent::Challenge { .. } => IncomingEventKind::Challenge,
            IncomingEvent::ChallengeCanceled { .. } => IncomingEventKind::ChallengeCanceled,
            IncomingEvent::ChallengeDeclined { .. } => IncomingEventKind::ChallengeDeclined,
            IncomingEvent::GameStart { .. } => IncomingEventKind::GameStart,
            IncomingEvent::GameFinish { .. } => IncomingEventKind::GameFinish,
            IncomingEvent::Unknown => IncomingEventKind::Unknown,
        }
    }
}

impl IncomingEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncomingEventKind::Challenge => "challenge",
            IncomingEventKind::ChallengeCanceled => "challengeCanceled",
            IncomingEventKind::ChallengeDeclined => "challengeDeclined",
            IncomingEventKind::GameStart => "gameStart",
            IncomingEventKind::GameFinish => "gameFinish",
            IncomingEventKind::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeInfo {
    pub id: String,
    #[serde(default)]
    pub challenger: Option<PlayerInfo>,
}

/// `game` object of gameStart / gameFinish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEventInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub game_id: Option<String>,
    pub color: Color,
    #[serde(default)]
    pub opponent: Option<PlayerInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    #[serde(default, alias = "username")]
    pub name: Option<String>,
    #[serde(default)]
    pub ai_level: Option<u8>,
}

impl PlayerInfo {
    pub fn display_name(&self) -> String {
        match (&self.name, self.ai_level) {
            (Some(name), _) => name.clone(),
            (None, Some(level)) => format!("Stockfish level {}", level),
            (None, None) => "anonymous".to_string(),
        }
    }
}

impl GameEventInfo {
    /// Game id; newer payloads carry `gameId`, older ones only `id`
    pub fn game_id(&self) -> Option<&str> {
        self.game_id.as_deref().or(self.id.as_deref())
    }
}

// ============================================================================
// Per-game state stream (/api/bot/game/stream/{id})
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameStateEvent {
    /// First message of every game stream
    GameFull(GameFullInfo),
    /// Sent on every move, draw offer, takeback offer and at game end
    GameState(GameStateSnapshot),
    ChatLine {
        #[serde(default)]
        username: String,
        #[serde(default)]
        text: String,
    },
    OpponentGone {
        #[serde(default)]
        gone: bool,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameFullInfo {
    pub id: String,
    pub state: GameStateSnapshot,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GameStateSnapshot {
    #[serde(default)]
    pub moves: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub winner: Option<Color>,
}

fn default_status() -> String {
    "started".to_string()
}

impl GameStateSnapshot {
    /// Full move history; the server resends it whole on every update
    pub fn move_list(&self) -> Vec<String> {
        parse_move_list(&self.moves)
    }

    /// Whether the game can still receive moves
    pub fn is_in_progress(&self) -> bool {
        matches!(self.status.as_str(), "created" | "started")
    }
}

impl GameStateEvent {
    /// The authoritative state carried by this update, if it carries one
    pub fn snapshot(&self) -> Option<&GameStateSnapshot> {
        match self {
            GameStateEvent::GameFull(full) => Some(&full.state),
            GameStateEvent::GameState(state) => Some(state),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            GameStateEvent::GameFull(_) => "gameFull",
            GameStateEvent::GameState(_) => "gameState",
            GameStateEvent::ChatLine { .. } => "chatLine",
            GameStateEvent::OpponentGone { .. } => "opponentGone",
            GameStateEvent::Unknown => "unknown",
        }
    }
}
