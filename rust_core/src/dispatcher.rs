//! Top-level event handling: accept challenges, start one controller per game
//!
//! Each game runs in its own task inside a `JoinSet` owned by the dispatcher,
//! so dropping or abandoning the dispatcher stops every game it started.
//! Failures inside a game stay inside its task; only failures of the
//! incoming event stream itself are returned to the caller.

use futures_util::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::{AbortHandle, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::clients::GameServer;
use crate::controller::SessionController;
use crate::engine::MoveProvider;
use crate::error::{BotError, BotResult, TransportError};
use crate::models::{ChallengeInfo, GameEventInfo, IncomingEvent, IncomingEventKind, Side};
use crate::retry::RetryPolicy;
use crate::session::GameSession;

pub struct EventDispatcher {
    server: Arc<dyn GameServer>,
    engine: Arc<dyn MoveProvider>,
    retry: RetryPolicy,
    shutdown: CancellationToken,
    sessions: JoinSet<()>,
    active: HashMap<String, AbortHandle>,
    previous: Option<IncomingEventKind>,
}

impl EventDispatcher {
    pub fn new(
        server: Arc<dyn GameServer>,
        engine: Arc<dyn MoveProvider>,
        retry: RetryPolicy,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            server,
            engine,
            retry,
            shutdown,
            sessions: JoinSet::new(),
            active: HashMap::new(),
            previous: None,
        }
    }

    /// Consume the incoming event stream until it fails or shutdown is requested.
    ///
    /// Never returns `Ok`: a stream that ends is reported as
    /// `TransportError::StreamClosed` so the caller reconnects.
    pub async fn run(&mut self) -> BotResult<()> {
        let mut events = self.server.stream_incoming_events().await?;
        info!("Listening for incoming events");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => return Err(BotError::Interrupted),
                Some(joined) = self.sessions.join_next(), if !self.sessions.is_empty() => {
                    self.reap(joined);
                }
                event = events.next() => match event {
                    Some(Ok(event)) => self.handle_event(event).await?,
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        return Err(TransportError::StreamClosed("incoming event stream".into()).into())
                    }
                },
            }
        }
    }

    pub async fn handle_event(&mut self, event: IncomingEvent) -> BotResult<()> {
        let kind = event.kind();
        info!("Received event: {}", kind.as_str());

        match event {
            IncomingEvent::Challenge { challenge } => self.accept(&challenge).await?,
            IncomingEvent::GameStart { game } => self.start_session(&game),
            IncomingEvent::GameFinish { game } => {
                info!("Game {} finished", game.game_id().unwrap_or("?"));
            }
            IncomingEvent::ChallengeCanceled { challenge }
            | IncomingEvent::ChallengeDeclined { challenge } => {
                debug!("Challenge {} withdrawn ({})", challenge.id, kind.as_str());
            }
            IncomingEvent::Unknown => {}
        }

        self.previous = Some(kind);
        Ok(())
    }

    /// A challenge right after a game finished is a rematch offer
    pub fn next_challenge_is_rematch(&self) -> bool {
        self.previous == Some(IncomingEventKind::GameFinish)
    }

    async fn accept(&self, challenge: &ChallengeInfo) -> BotResult<()> {
        let from = challenge
            .challenger
            .as_ref()
            .map(|p| p.display_name())
            .unwrap_or_else(|| "unknown".to_string());

        if self.next_challenge_is_rematch() {
            info!("Accepting rematch {} from {}", challenge.id, from);
        } else {
            info!("Accepting challenge {} from {}", challenge.id, from);
        }

        match self.server.accept_challenge(&challenge.id).await {
            Ok(()) => Ok(()),
            // challenge withdrawn or already taken; nothing wrong with the connection
            Err(e @ TransportError::Api { .. }) => {
                warn!("Could not accept challenge {}: {}", challenge.id, e);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn start_session(&mut self, game: &GameEventInfo) {
        let Some(game_id) = game.game_id().map(str::to_string) else {
            warn!("gameStart without a game id, ignoring");
            return;
        };

        if self.active.get(&game_id).is_some_and(|h| !h.is_finished()) {
            warn!("Game {} already has a running controller", game_id);
            return;
        }

        let side = Side::from(game.color);
        info!(
            "Game started! ID: {}, playing as {}{}",
            game_id,
            game.color,
            game.opponent
                .as_ref()
                .map(|p| format!(" against {}", p.display_name()))
                .unwrap_or_default()
        );

        let controller = SessionController::new(
            self.server.clone(),
            self.engine.clone(),
            self.retry,
            GameSession::new(game_id.clone(), side),
        );
        let token = self.shutdown.child_token();
        let id = game_id.clone();

        let handle = self.sessions.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => info!("Game {}: cancelled by shutdown", id),
                result = controller.run() => match result {
                    Ok(summary) => info!(
                        "Game {} ended after {} plies ({} of our moves, status {}, {}s)",
                        summary.game_id,
                        summary.plies,
                        summary.moves_submitted,
                        summary.final_status.as_deref().unwrap_or("unknown"),
                        summary.duration.num_seconds()
                    ),
                    Err(e) => warn!("Game {} ended or connection lost: {}", id, e),
                },
            }
        });
        self.active.insert(game_id, handle);
    }

    fn reap(&mut self, joined: Result<(), JoinError>) {
        if let Err(e) = joined {
            if e.is_panic() {
                error!("Game task panicked: {}", e);
            }
        }
        self.active.retain(|_, handle| !handle.is_finished());
    }

    /// Ids of games whose controller is still running
    pub fn active_games(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .active
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Stop every game this dispatcher started
    pub fn abandon_sessions(&mut self) {
        let running = self.active_games();
        if !running.is_empty() {
            warn!("Abandoning {} in-flight game(s): {:?}", running.len(), running);
        }
        self.sessions.abort_all();
        self.active.clear();
    }
}
