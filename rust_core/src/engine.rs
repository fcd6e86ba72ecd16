//! Bridge to the external move-decision process
//!
//! The engine is run once per turn as `<engine> [args..] -H <history> -m <move>`:
//! - `<history>` holds the moves played so far, one per line
//! - `<move>` is where the engine writes its single chosen move
//! - exit status 0 means a move was written
//!
//! Both files are private to one invocation and are removed on every exit path,
//! including spawn failures, timeouts and non-zero exits.

use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::BotConfig;
use crate::error::EngineError;

/// Anything that can pick a move for a position given its history
#[async_trait]
pub trait MoveProvider: Send + Sync {
    async fn get_move(&self, moves: &[String]) -> Result<String, EngineError>;
}

#[derive(Debug, Clone)]
pub struct EngineProcess {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
    /// Directory for the history/move files; system temp dir when `None`
    scratch_dir: Option<PathBuf>,
}

impl EngineProcess {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(crate::config::DEFAULT_ENGINE_TIMEOUT_SECS),
            scratch_dir: None,
        }
    }

    pub fn from_config(config: &BotConfig) -> Self {
        Self::new(config.engine_path.clone())
            .with_args(config.engine_args.clone())
            .with_timeout(config.engine_timeout)
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    fn scratch_file(&self, role: &str) -> std::io::Result<NamedTempFile> {
        let prefix = format!("herring-{}-", role);
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(".txt");
        match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
    }

    fn write_history(&self, moves: &[String]) -> std::io::Result<NamedTempFile> {
        let mut history = self.scratch_file("history")?;
        for mv in moves {
            writeln!(history, "{}", mv)?;
        }
        history.flush()?;
        Ok(history)
    }
}

#[async_trait]
impl MoveProvider for EngineProcess {
    async fn get_move(&self, moves: &[String]) -> Result<String, EngineError> {
        // Dropping these removes the files, whichever way we leave this function
        let history = self.write_history(moves)?;
        let output = self.scratch_file("move")?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("-H")
            .arg(history.path())
            .arg("-m")
            .arg(output.path())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!(
            "Running engine {} on {} moves",
            self.program.display(),
            moves.len()
        );

        let mut child = command.spawn().map_err(|source| EngineError::Spawn {
            path: self.program.display().to_string(),
            source,
        })?;

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed out engine: {}", e);
                }
                return Err(EngineError::Timeout(self.timeout));
            }
        };

        if !status.success() {
            return Err(EngineError::Exit {
                code: status.code(),
            });
        }

        let raw = tokio::fs::read_to_string(output.path()).await?;
        parse_engine_output(&raw)
    }
}

/// Extract the single move token the engine wrote
pub fn parse_engine_output(raw: &str) -> Result<String, EngineError> {
    let mut tokens = raw.split_whitespace();
    let mv = tokens.next().ok_or(EngineError::EmptyOutput)?;
    if tokens.next().is_some() || !mv.chars().all(|c| c.is_ascii_graphic()) {
        return Err(EngineError::MalformedOutput(raw.trim().to_string()));
    }
    Ok(mv.to_string())
}
