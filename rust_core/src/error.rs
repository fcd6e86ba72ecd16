//! Error taxonomy for the bot
//!
//! - `TransportError`: the Lichess connection dropped or the API refused a call.
//!   Retried locally when submitting moves, recovered globally by reconnecting.
//! - `EngineError`: the move-decision process failed. Never retried, ends one game.
//! - `BotError`: what the dispatcher and supervisor see. `Interrupted` is the only
//!   variant that stops the supervisor; everything else leads to a reconnect.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level failure (refused, reset, timed out, body read failed)
    #[error("connection error: {0}")]
    Connection(String),

    /// The server answered with a non-success status
    #[error("api error {status}: {body}")]
    Api { status: u16, body: String },

    /// A stream we expected to stay open was closed by the server
    #[error("stream closed by server: {0}")]
    StreamClosed(String),
}

impl TransportError {
    /// Whether a move submission that failed with this error is worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Api { .. })
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Api {
                status: status.as_u16(),
                body: err.to_string(),
            },
            None => Self::Connection(err.to_string()),
        }
    }
}

/// Failure of the external move-decision process
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine scratch file error: {0}")]
    Io(#[from] std::io::Error),

    /// `None` when the process was terminated by a signal
    #[error("engine exited with status {code:?}")]
    Exit { code: Option<i32> },

    #[error("engine did not answer within {0:?}")]
    Timeout(std::time::Duration),

    #[error("engine produced no move")]
    EmptyOutput,

    #[error("engine produced malformed output: {0:?}")]
    MalformedOutput(String),
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("interrupted by operator")]
    Interrupted,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BotError {
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

pub type BotResult<T> = Result<T, BotError>;
