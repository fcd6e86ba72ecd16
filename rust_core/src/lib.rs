//! BlueHerring Lichess bot core.
//!
//! This module provides:
//! - Lichess Bot API client with ndjson stream decoding
//! - Bridge to the external move-decision process
//! - Per-game session state and turn detection
//! - Session controller with bounded move submission retries
//! - Event dispatcher running one controller task per game
//! - Supervisor loop that reconnects until shutdown

pub mod clients;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod models;
pub mod retry;
pub mod session;
pub mod supervisor;

pub use clients::{GameServer, GameServerConnector, LichessClient, LichessConnector};
pub use config::BotConfig;
pub use controller::{SessionController, SessionSummary};
pub use dispatcher::EventDispatcher;
pub use engine::{EngineProcess, MoveProvider};
pub use error::{BotError, BotResult, EngineError, TransportError};
pub use models::{Color, Side};
pub use retry::RetryPolicy;
pub use session::{GameSession, SessionPhase};
pub use supervisor::{SupervisorLoop, SupervisorStats};
