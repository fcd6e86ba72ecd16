//! Scripted stand-ins for the Lichess server and the engine
#![allow(dead_code)]

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use herring_rust_core::clients::{GameServer, GameServerConnector, GameStateStream, IncomingEventStream};
use herring_rust_core::engine::MoveProvider;
use herring_rust_core::error::{EngineError, TransportError};
use herring_rust_core::models::{Account, GameStateEvent, IncomingEvent};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

// ============================================================================
// Event fixtures
// ============================================================================

pub fn challenge(id: &str) -> IncomingEvent {
    serde_json::from_value(json!({
        "type": "challenge",
        "challenge": {"id": id, "challenger": {"id": "alice", "name": "Alice"}, "rated": false}
    }))
    .unwrap()
}

pub fn game_start(id: &str, color: &str) -> IncomingEvent {
    serde_json::from_value(json!({
        "type": "gameStart",
        "game": {"id": id, "gameId": id, "color": color}
    }))
    .unwrap()
}

pub fn game_finish(id: &str) -> IncomingEvent {
    serde_json::from_value(json!({
        "type": "gameFinish",
        "game": {"id": id, "gameId": id, "color": "white"}
    }))
    .unwrap()
}

pub fn game_full(id: &str, moves: &str) -> GameStateEvent {
    serde_json::from_value(json!({
        "type": "gameFull",
        "id": id,
        "white": {"id": "herring", "name": "BlueHerring"},
        "black": {"id": "alice", "name": "Alice"},
        "initialFen": "startpos",
        "state": {"type": "gameState", "moves": moves, "status": "started"}
    }))
    .unwrap()
}

pub fn game_state(moves: &str) -> GameStateEvent {
    game_state_with_status(moves, "started")
}

pub fn game_state_with_status(moves: &str, status: &str) -> GameStateEvent {
    serde_json::from_value(json!({
        "type": "gameState",
        "moves": moves,
        "wtime": 180000,
        "btime": 180000,
        "status": status
    }))
    .unwrap()
}

pub fn chat_line(text: &str) -> GameStateEvent {
    serde_json::from_value(json!({
        "type": "chatLine", "room": "player", "username": "alice", "text": text
    }))
    .unwrap()
}

pub fn connection_error() -> TransportError {
    TransportError::Connection("connection reset by peer".into())
}

// ============================================================================
// Scripted server
// ============================================================================

/// How a scripted stream behaves after its events are delivered
pub enum StreamEnd {
    StayOpen,
    Close,
    Fail(TransportError),
}

pub enum IncomingScript {
    OpenFails(TransportError),
    Events(Vec<IncomingEvent>, StreamEnd),
}

fn scripted_stream<T: Send + 'static>(
    items: Vec<T>,
    end: StreamEnd,
) -> BoxStream<'static, Result<T, TransportError>> {
    let head = stream::iter(items.into_iter().map(Ok));
    let tail: BoxStream<'static, Result<T, TransportError>> = match end {
        StreamEnd::StayOpen => stream::pending().boxed(),
        StreamEnd::Close => stream::empty().boxed(),
        StreamEnd::Fail(e) => stream::once(async move { Err(e) }).boxed(),
    };
    head.chain(tail).boxed()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveAttempt {
    pub game_id: String,
    pub mv: String,
    pub at: Instant,
    pub accepted: bool,
}

#[derive(Default)]
pub struct FakeServer {
    incoming: Mutex<VecDeque<IncomingScript>>,
    incoming_calls: Mutex<Vec<Instant>>,
    games: Mutex<HashMap<String, (Vec<GameStateEvent>, StreamEnd)>>,
    game_stream_calls: Mutex<Vec<String>>,
    move_failures: Mutex<HashMap<String, VecDeque<TransportError>>>,
    move_attempts: Mutex<Vec<MoveAttempt>>,
    accept_failures: Mutex<VecDeque<TransportError>>,
    accepted: Mutex<Vec<String>>,
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_incoming(&self, script: IncomingScript) {
        self.incoming.lock().unwrap().push_back(script);
    }

    pub fn script_game(&self, game_id: &str, events: Vec<GameStateEvent>, end: StreamEnd) {
        self.games
            .lock()
            .unwrap()
            .insert(game_id.to_string(), (events, end));
    }

    /// Make the next `make_move` calls for `game_id` fail with these errors, in order
    pub fn fail_moves(&self, game_id: &str, errors: Vec<TransportError>) {
        self.move_failures
            .lock()
            .unwrap()
            .entry(game_id.to_string())
            .or_default()
            .extend(errors);
    }

    pub fn fail_next_accept(&self, error: TransportError) {
        self.accept_failures.lock().unwrap().push_back(error);
    }

    pub fn incoming_calls(&self) -> Vec<Instant> {
        self.incoming_calls.lock().unwrap().clone()
    }

    pub fn game_stream_calls(&self, game_id: &str) -> usize {
        self.game_stream_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|id| id.as_str() == game_id)
            .count()
    }

    pub fn move_attempts(&self, game_id: &str) -> Vec<MoveAttempt> {
        self.move_attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.game_id == game_id)
            .cloned()
            .collect()
    }

    pub fn accepted_moves(&self, game_id: &str) -> Vec<String> {
        self.move_attempts(game_id)
            .into_iter()
            .filter(|a| a.accepted)
            .map(|a| a.mv)
            .collect()
    }

    pub fn accepted_challenges(&self) -> Vec<String> {
        self.accepted.lock().unwrap().clone()
    }
}

#[async_trait]
impl GameServer for FakeServer {
    async fn account(&self) -> Result<Account, TransportError> {
        Ok(Account {
            id: "blueherring".into(),
            username: "BlueHerring".into(),
            title: Some("BOT".into()),
        })
    }

    async fn stream_incoming_events(&self) -> Result<IncomingEventStream, TransportError> {
        self.incoming_calls.lock().unwrap().push(Instant::now());
        let script = self.incoming.lock().unwrap().pop_front();
        match script {
            Some(IncomingScript::OpenFails(e)) => Err(e),
            Some(IncomingScript::Events(events, end)) => Ok(scripted_stream(events, end)),
            None => Ok(scripted_stream(Vec::new(), StreamEnd::StayOpen)),
        }
    }

    async fn stream_game_state(&self, game_id: &str) -> Result<GameStateStream, TransportError> {
        self.game_stream_calls
            .lock()
            .unwrap()
            .push(game_id.to_string());
        let script = self.games.lock().unwrap().remove(game_id);
        Ok(match script {
            Some((events, end)) => scripted_stream(events, end),
            None => scripted_stream(Vec::new(), StreamEnd::StayOpen),
        })
    }

    async fn accept_challenge(&self, challenge_id: &str) -> Result<(), TransportError> {
        if let Some(e) = self.accept_failures.lock().unwrap().pop_front() {
            return Err(e);
        }
        self.accepted.lock().unwrap().push(challenge_id.to_string());
        Ok(())
    }

    async fn make_move(&self, game_id: &str, mv: &str) -> Result<(), TransportError> {
        let failure = self
            .move_failures
            .lock()
            .unwrap()
            .get_mut(game_id)
            .and_then(|q| q.pop_front());
        self.move_attempts.lock().unwrap().push(MoveAttempt {
            game_id: game_id.to_string(),
            mv: mv.to_string(),
            at: Instant::now(),
            accepted: failure.is_none(),
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Hands out the same `FakeServer` on every connect, optionally failing first
pub struct FakeConnector {
    server: Arc<FakeServer>,
    failures: Mutex<VecDeque<TransportError>>,
    connects: Mutex<Vec<Instant>>,
}

impl FakeConnector {
    pub fn new(server: Arc<FakeServer>) -> Arc<Self> {
        Arc::new(Self {
            server,
            failures: Mutex::new(VecDeque::new()),
            connects: Mutex::new(Vec::new()),
        })
    }

    pub fn fail_next_connect(&self, error: TransportError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn connects(&self) -> Vec<Instant> {
        self.connects.lock().unwrap().clone()
    }
}

#[async_trait]
impl GameServerConnector for FakeConnector {
    async fn connect(&self) -> Result<Arc<dyn GameServer>, TransportError> {
        self.connects.lock().unwrap().push(Instant::now());
        if let Some(e) = self.failures.lock().unwrap().pop_front() {
            return Err(e);
        }
        Ok(self.server.clone())
    }
}

// ============================================================================
// Scripted engine
// ============================================================================

type Pick = dyn Fn(&[String]) -> Result<String, EngineError> + Send + Sync;

pub struct FakeEngine {
    pick: Box<Pick>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeEngine {
    pub fn new(
        pick: impl Fn(&[String]) -> Result<String, EngineError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            pick: Box::new(pick),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Plays `m<ply>` for every position
    pub fn numbered() -> Arc<Self> {
        Self::new(|moves| Ok(format!("m{}", moves.len())))
    }

    pub fn failing() -> Arc<Self> {
        Self::new(|_| Err(EngineError::Exit { code: Some(1) }))
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MoveProvider for FakeEngine {
    async fn get_move(&self, moves: &[String]) -> Result<String, EngineError> {
        self.calls.lock().unwrap().push(moves.to_vec());
        (self.pick)(moves)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Poll `condition` until it holds, panicking after `limit`
pub async fn wait_until(limit: Duration, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + limit;
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached within {:?}", limit);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub fn history(list: &[&str]) -> Vec<String> {
    list.iter().map(|m| m.to_string()).collect()
}
