pub mod lichess;
pub mod ndjson;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use std::sync::Arc;

use crate::error::TransportError;
use crate::models::{Account, GameStateEvent, IncomingEvent};

// Re-export commonly used types
pub use lichess::{LichessClient, LichessConnector};

pub type IncomingEventStream = BoxStream<'static, Result<IncomingEvent, TransportError>>;
pub type GameStateStream = BoxStream<'static, Result<GameStateEvent, TransportError>>;

/// Remote game server as seen by the bot
///
/// Every call may fail with a `TransportError`. Streams end when the server
/// closes them; a mid-stream failure is yielded as one final `Err`.
#[async_trait]
pub trait GameServer: Send + Sync {
    /// Account the credential belongs to
    async fn account(&self) -> Result<Account, TransportError>;

    /// Challenges, game starts and game endings for the bot account
    async fn stream_incoming_events(&self) -> Result<IncomingEventStream, TransportError>;

    /// Full state followed by incremental updates of one game
    async fn stream_game_state(&self, game_id: &str) -> Result<GameStateStream, TransportError>;

    async fn accept_challenge(&self, challenge_id: &str) -> Result<(), TransportError>;

    async fn make_move(&self, game_id: &str, mv: &str) -> Result<(), TransportError>;
}

/// Opens a fresh server session; called at the start of every supervisor cycle
#[async_trait]
pub trait GameServerConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn GameServer>, TransportError>;
}
