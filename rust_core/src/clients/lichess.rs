//! Lichess Bot API client.
//!
//! Covers the calls the bot needs:
//! - `GET  /api/account`
//! - `GET  /api/stream/event` (ndjson)
//! - `GET  /api/bot/game/stream/{gameId}` (ndjson)
//! - `POST /api/challenge/{challengeId}/accept`
//! - `POST /api/bot/game/{gameId}/move/{move}`
//!
//! Streaming requests carry no overall timeout, only a connect timeout;
//! one-shot requests are capped individually.

use async_trait::async_trait;
use reqwest::{Client, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::ndjson::decode_ndjson;
use super::{GameServer, GameServerConnector, GameStateStream, IncomingEventStream};
use crate::config::BotConfig;
use crate::error::TransportError;
use crate::models::Account;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct LichessClient {
    client: Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for LichessClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LichessClient")
            .field("base_url", &self.base_url)
            .field("has_token", &!self.token.is_empty())
            .finish()
    }
}

impl LichessClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("blueherring-bot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn from_config(config: &BotConfig) -> Result<Self, TransportError> {
        Self::new(config.base_url.clone(), config.lichess_token.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_stream(&self, path: &str) -> Result<Response, TransportError> {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/x-ndjson")
            .send()
            .await?;
        check_status(resp).await
    }

    async fn post_empty(&self, path: &str) -> Result<(), TransportError> {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        check_status(resp).await.map(|_| ())
    }
}

/// Turn a non-2xx response into `TransportError::Api`, keeping the body
async fn check_status(resp: Response) -> Result<Response, TransportError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(TransportError::Api {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl GameServer for LichessClient {
    async fn account(&self) -> Result<Account, TransportError> {
        let resp = self
            .client
            .get(self.url("/api/account"))
            .bearer_auth(&self.token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let account = check_status(resp).await?.json::<Account>().await?;
        Ok(account)
    }

    async fn stream_incoming_events(&self) -> Result<IncomingEventStream, TransportError> {
        let resp = self.get_stream("/api/stream/event").await?;
        debug!("Incoming event stream opened");
        Ok(decode_ndjson(resp.bytes_stream(), "event stream"))
    }

    async fn stream_game_state(&self, game_id: &str) -> Result<GameStateStream, TransportError> {
        let resp = self
            .get_stream(&format!("/api/bot/game/stream/{}", game_id))
            .await?;
        debug!("Game stream opened for {}", game_id);
        Ok(decode_ndjson(resp.bytes_stream(), format!("game {}", game_id)))
    }

    async fn accept_challenge(&self, challenge_id: &str) -> Result<(), TransportError> {
        self.post_empty(&format!("/api/challenge/{}/accept", challenge_id))
            .await
    }

    async fn make_move(&self, game_id: &str, mv: &str) -> Result<(), TransportError> {
        self.post_empty(&format!("/api/bot/game/{}/move/{}", game_id, mv))
            .await
    }
}

/// Builds a `LichessClient` per connection cycle and checks the token with `/api/account`
#[derive(Debug, Clone)]
pub struct LichessConnector {
    config: Arc<BotConfig>,
}

impl LichessConnector {
    pub fn new(config: Arc<BotConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl GameServerConnector for LichessConnector {
    async fn connect(&self) -> Result<Arc<dyn GameServer>, TransportError> {
        let client = LichessClient::from_config(&self.config)?;
        let account = client.account().await?;
        info!(
            "Connected to {} as {}{}",
            self.config.base_url,
            account
                .title
                .as_deref()
                .map(|t| format!("{} ", t))
                .unwrap_or_default(),
            account.username
        );
        Ok(Arc::new(client))
    }
}
