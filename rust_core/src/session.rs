//! In-memory state of one game the bot is playing
//!
//! Created on gameStart, dropped when the game's stream ends. Nothing here
//! survives a reconnect or a restart.

use chrono::{DateTime, Utc};

use crate::models::Side;

/// Lifecycle of a session as seen by its controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Started,
    AwaitingOpponent,
    OurTurn,
    Ended,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    id: String,
    side: Side,
    move_history: Vec<String>,
    phase: SessionPhase,
    started_at: DateTime<Utc>,
}

impl GameSession {
    pub fn new(id: impl Into<String>, side: Side) -> Self {
        Self {
            id: id.into(),
            side,
            move_history: Vec::new(),
            phase: SessionPhase::Started,
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn moves(&self) -> &[String] {
        &self.move_history
    }

    pub fn ply(&self) -> usize {
        self.move_history.len()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_our_turn(&self) -> bool {
        self.side.to_move_at(self.move_history.len())
    }

    /// Replace the history with the full list from the latest update.
    ///
    /// The server always sends the complete history, so the latest update wins.
    /// A shorter list (takeback) is accepted as is.
    pub fn apply_moves(&mut self, moves: Vec<String>) {
        self.move_history = moves;
        if self.phase != SessionPhase::Ended {
            self.phase = if self.is_our_turn() {
                SessionPhase::OurTurn
            } else {
                SessionPhase::AwaitingOpponent
            };
        }
    }

    /// Record that our move for the current position was accepted
    pub fn mark_move_submitted(&mut self) {
        if self.phase == SessionPhase::OurTurn {
            self.phase = SessionPhase::AwaitingOpponent;
        }
    }

    pub fn end(&mut self) {
        self.phase = SessionPhase::Ended;
    }

    pub fn duration(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }
}
