//! Drives one game from its first state update to the end of its stream
//!
//! Updates are handled strictly in arrival order; the engine call and the
//! move submission for a turn finish before the next update is read, so a
//! session never has two submissions in flight.

use futures_util::StreamExt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::clients::GameServer;
use crate::engine::MoveProvider;
use crate::error::BotResult;
use crate::models::{GameStateEvent, Side};
use crate::retry::{execute_with_retry, RetryPolicy};
use crate::session::GameSession;

/// What a session looked like when its stream closed
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub game_id: String,
    pub side: Side,
    pub plies: usize,
    pub moves_submitted: u32,
    /// Last non-running status the server reported ("mate", "resign", ...)
    pub final_status: Option<String>,
    pub duration: chrono::Duration,
}

pub struct SessionController {
    server: Arc<dyn GameServer>,
    engine: Arc<dyn MoveProvider>,
    retry: RetryPolicy,
    session: GameSession,
    /// History we last moved on, until the server shows a different one
    moved_on: Option<Vec<String>>,
    moves_submitted: u32,
    final_status: Option<String>,
}

impl SessionController {
    pub fn new(
        server: Arc<dyn GameServer>,
        engine: Arc<dyn MoveProvider>,
        retry: RetryPolicy,
        session: GameSession,
    ) -> Self {
        Self {
            server,
            engine,
            retry,
            session,
            moved_on: None,
            moves_submitted: 0,
            final_status: None,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Consume the game's state stream until the server closes it.
    ///
    /// A transport error on the stream, an engine failure or a move that could
    /// not be submitted within the retry budget ends the session with `Err`.
    pub async fn run(mut self) -> BotResult<SessionSummary> {
        let game_id = self.session.id().to_string();
        let mut stream = self.server.stream_game_state(&game_id).await?;

        while let Some(update) = stream.next().await {
            let update = update?;
            self.handle_update(update).await?;
        }

        self.session.end();
        let summary = SessionSummary {
            game_id,
            side: self.session.side(),
            plies: self.session.ply(),
            moves_submitted: self.moves_submitted,
            final_status: self.final_status,
            duration: self.session.duration(),
        };
        Ok(summary)
    }

    pub async fn handle_update(&mut self, update: GameStateEvent) -> BotResult<()> {
        let snapshot = match update.snapshot() {
            Some(snapshot) => snapshot.clone(),
            None => {
                match &update {
                    GameStateEvent::ChatLine { username, text } => {
                        debug!("Game {} chat <{}> {}", self.session.id(), username, text)
                    }
                    GameStateEvent::OpponentGone { gone } => {
                        info!("Game {}: opponent gone = {}", self.session.id(), gone)
                    }
                    other => debug!("Game {}: ignoring {}", self.session.id(), other.type_name()),
                }
                return Ok(());
            }
        };

        let moves = snapshot.move_list();
        if self.moved_on.as_ref().is_some_and(|prev| *prev != moves) {
            self.moved_on = None;
        }
        self.session.apply_moves(moves);

        let our_turn = self.session.is_our_turn();
        info!(
            "Game {} ({}): moves={:?} our_turn={}",
            self.session.id(),
            update.type_name(),
            self.session.moves(),
            our_turn
        );

        if !snapshot.is_in_progress() {
            info!(
                "Game {} over: status={} winner={}",
                self.session.id(),
                snapshot.status,
                snapshot.winner.map(|c| c.as_str()).unwrap_or("none")
            );
            self.final_status = Some(snapshot.status);
            self.session.end();
            return Ok(());
        }

        if !our_turn {
            return Ok(());
        }

        if self.moved_on.as_deref() == Some(self.session.moves()) {
            debug!(
                "Game {}: already moved at ply {}, waiting for the server",
                self.session.id(),
                self.session.ply()
            );
            return Ok(());
        }

        self.play_turn().await
    }

    async fn play_turn(&mut self) -> BotResult<()> {
        info!("Game {}: getting engine move...", self.session.id());
        let mv = self.engine.get_move(self.session.moves()).await?;
        info!("Game {}: engine suggests {}", self.session.id(), mv);

        let server = &self.server;
        let game_id = self.session.id();
        let label = format!("Move {} in game {}", mv, game_id);
        execute_with_retry(&label, self.retry, || server.make_move(game_id, &mv)).await?;

        info!("Game {}: move {} made", game_id, mv);
        self.moved_on = Some(self.session.moves().to_vec());
        self.moves_submitted += 1;
        self.session.mark_move_submitted();
        Ok(())
    }
}
