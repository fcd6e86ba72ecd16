//! Configuration constants and environment loading for the bot
//!
//! Loaded once at startup into an immutable `BotConfig` that is handed to
//! the supervisor and the engine bridge. Sources, highest precedence first:
//! - process environment (after `.env` is loaded by the service)
//! - the JSON config file (`config.json` or `BOT_CONFIG_PATH`)
//! - built-in defaults

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Default Lichess host
pub const DEFAULT_LICHESS_BASE_URL: &str = "https://lichess.org";

/// Default path of the move-decision executable
pub const DEFAULT_ENGINE_PATH: &str = "./BlueHerring";

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Default cap on a single engine invocation
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 300;

/// Default move submission attempts per turn
pub const DEFAULT_MOVE_RETRY_ATTEMPTS: u32 = 3;

/// Default wait between move submission attempts
pub const DEFAULT_MOVE_RETRY_BACKOFF_MS: u64 = 1000;

/// Default wait before reconnecting after the event stream fails
pub const DEFAULT_RECONNECT_DELAY_SECS: u64 = 5;

/// Shape of `config.json`
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub lichess_token: Option<String>,
    #[serde(default)]
    pub engine_path: Option<String>,
}

impl ConfigFile {
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Invalid bot config file")
    }

    /// Read the file if it exists; a missing file is not an error
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&raw).map(Some)
    }
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub lichess_token: String,
    pub base_url: String,
    pub engine_path: PathBuf,
    /// Extra arguments placed before `-H <history> -m <move>`
    pub engine_args: Vec<String>,
    pub engine_timeout: Duration,
    pub move_retry: RetryPolicy,
    pub reconnect_delay: Duration,
}

impl BotConfig {
    /// Load configuration from the environment and the optional config file
    pub fn from_env() -> Result<Self> {
        let path = env::var("BOT_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let file = ConfigFile::load(Path::new(&path))?;
        Self::from_lookup(|key| env::var(key).ok(), file)
    }

    /// Build configuration from an arbitrary key lookup plus file values
    pub fn from_lookup<F>(lookup: F, file: Option<ConfigFile>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = file.unwrap_or_default();

        let lichess_token = lookup("LICHESS_TOKEN")
            .or(file.lichess_token)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow!("LICHESS_TOKEN is not set and config file has no lichess_token"))?;

        let engine_path = lookup("ENGINE_PATH")
            .or(file.engine_path)
            .unwrap_or_else(|| DEFAULT_ENGINE_PATH.to_string());

        let engine_args = lookup("ENGINE_ARGS")
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        let base_url = lookup("LICHESS_BASE_URL")
            .unwrap_or_else(|| DEFAULT_LICHESS_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let engine_timeout = Duration::from_secs(
            lookup("ENGINE_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_ENGINE_TIMEOUT_SECS),
        );

        let max_attempts = lookup("MOVE_RETRY_ATTEMPTS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MOVE_RETRY_ATTEMPTS)
            .max(1);

        let backoff = Duration::from_millis(
            lookup("MOVE_RETRY_BACKOFF_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MOVE_RETRY_BACKOFF_MS),
        );

        let reconnect_delay = Duration::from_secs(
            lookup("RECONNECT_DELAY_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RECONNECT_DELAY_SECS),
        );

        Ok(Self {
            lichess_token,
            base_url,
            engine_path: PathBuf::from(engine_path),
            engine_args,
            engine_timeout,
            move_retry: RetryPolicy::new(max_attempts, backoff),
            reconnect_delay,
        })
    }

    /// Token suffix safe to print
    pub fn redacted_token(&self) -> String {
        let chars: Vec<char> = self.lichess_token.chars().collect();
        let suffix: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        format!("...{}", suffix)
    }

    /// Log current configuration (useful at startup)
    pub fn log_config(&self) {
        tracing::info!("BotConfig loaded:");
        tracing::info!("  lichess: {} (token {})", self.base_url, self.redacted_token());
        tracing::info!("  engine: {} {:?}", self.engine_path.display(), self.engine_args);
        tracing::info!("  engine_timeout: {:?}", self.engine_timeout);
        tracing::info!(
            "  move_retry: {} attempts, {:?} backoff",
            self.move_retry.max_attempts,
            self.move_retry.backoff
        );
        tracing::info!("  reconnect_delay: {:?}", self.reconnect_delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BotConfig::from_lookup(lookup_from(&[("LICHESS_TOKEN", "lip_abcdef")]), None)
            .unwrap();

        assert_eq!(config.lichess_token, "lip_abcdef");
        assert_eq!(config.base_url, DEFAULT_LICHESS_BASE_URL);
        assert_eq!(config.engine_path, PathBuf::from(DEFAULT_ENGINE_PATH));
        assert!(config.engine_args.is_empty());
        assert_eq!(config.move_retry.max_attempts, 3);
        assert_eq!(config.move_retry.backoff, Duration::from_secs(1));
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
        assert_eq!(config.engine_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_token_from_file_when_env_missing() {
        let file = ConfigFile::parse(r#"{"lichess_token": "lip_fromfile", "engine_path": "/opt/herring"}"#)
            .unwrap();
        let config = BotConfig::from_lookup(lookup_from(&[]), Some(file)).unwrap();

        assert_eq!(config.lichess_token, "lip_fromfile");
        assert_eq!(config.engine_path, PathBuf::from("/opt/herring"));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = ConfigFile::parse(r#"{"lichess_token": "lip_fromfile"}"#).unwrap();
        let config = BotConfig::from_lookup(
            lookup_from(&[
                ("LICHESS_TOKEN", "lip_fromenv"),
                ("ENGINE_ARGS", "--threads 2"),
                ("LICHESS_BASE_URL", "http://localhost:9663/"),
                ("MOVE_RETRY_ATTEMPTS", "5"),
                ("MOVE_RETRY_BACKOFF_MS", "250"),
            ]),
            Some(file),
        )
        .unwrap();

        assert_eq!(config.lichess_token, "lip_fromenv");
        assert_eq!(config.engine_args, vec!["--threads", "2"]);
        assert_eq!(config.base_url, "http://localhost:9663");
        assert_eq!(config.move_retry.max_attempts, 5);
        assert_eq!(config.move_retry.backoff, Duration::from_millis(250));
    }

    #[test]
    fn test_missing_token_is_error() {
        assert!(BotConfig::from_lookup(lookup_from(&[]), None).is_err());
        assert!(BotConfig::from_lookup(lookup_from(&[("LICHESS_TOKEN", "  ")]), None).is_err());
    }

    #[test]
    fn test_zero_attempts_clamped() {
        let config = BotConfig::from_lookup(
            lookup_from(&[("LICHESS_TOKEN", "t"), ("MOVE_RETRY_ATTEMPTS", "0")]),
            None,
        )
        .unwrap();
        assert_eq!(config.move_retry.max_attempts, 1);
    }

    #[test]
    fn test_redacted_token() {
        let config =
            BotConfig::from_lookup(lookup_from(&[("LICHESS_TOKEN", "lip_secret1234")]), None).unwrap();
        assert_eq!(config.redacted_token(), "...1234");
    }

    #[test]
    fn test_redacted_token_multibyte_suffix() {
        let config =
            BotConfig::from_lookup(lookup_from(&[("LICHESS_TOKEN", "lip_a€€")]), None).unwrap();
        assert_eq!(config.redacted_token(), "..._a€€");

        let short = BotConfig::from_lookup(lookup_from(&[("LICHESS_TOKEN", "€x")]), None).unwrap();
        assert_eq!(short.redacted_token(), "...€x");
    }

    #[test]
    fn test_missing_file_is_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ConfigFile::load(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_none());
    }
}
