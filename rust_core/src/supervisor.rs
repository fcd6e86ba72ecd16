//! Outer reconnect loop
//!
//! Connect, dispatch events until something fails, wait, start over. Games in
//! flight when a cycle fails are abandoned; the next cycle only sees them again
//! if the server re-announces them. The loop has no retry budget and stops only
//! when the shutdown token is cancelled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::clients::GameServerConnector;
use crate::config::BotConfig;
use crate::dispatcher::EventDispatcher;
use crate::engine::MoveProvider;
use crate::error::{BotError, BotResult};
use crate::retry::RetryPolicy;

/// Statistics for monitoring reconnection behavior
#[derive(Debug, Default)]
pub struct SupervisorStats {
    /// Connection cycles started
    pub cycles: AtomicU64,
    /// Cycles that ended with an error other than shutdown
    pub failures: AtomicU64,
}

impl SupervisorStats {
    pub fn record_cycle(&self) -> u64 {
        self.cycles.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

pub struct SupervisorLoop {
    connector: Arc<dyn GameServerConnector>,
    engine: Arc<dyn MoveProvider>,
    move_retry: RetryPolicy,
    reconnect_delay: Duration,
    stats: Arc<SupervisorStats>,
}

impl SupervisorLoop {
    pub fn new(
        config: &BotConfig,
        connector: Arc<dyn GameServerConnector>,
        engine: Arc<dyn MoveProvider>,
    ) -> Self {
        Self {
            connector,
            engine,
            move_retry: config.move_retry,
            reconnect_delay: config.reconnect_delay,
            stats: Arc::new(SupervisorStats::default()),
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_move_retry(mut self, policy: RetryPolicy) -> Self {
        self.move_retry = policy;
        self
    }

    pub fn stats(&self) -> &Arc<SupervisorStats> {
        &self.stats
    }

    /// Run until `shutdown` is cancelled
    pub async fn run(&self, shutdown: CancellationToken) {
        loop {
            let cycle = self.stats.record_cycle();
            info!("Starting bot (connection cycle {})...", cycle);

            match self.run_cycle(&shutdown).await {
                Err(e) if e.is_interrupt() => break,
                Err(e) => {
                    self.stats.record_failure();
                    error!("Error occurred: {}", e);
                }
                Ok(()) => warn!("Event dispatch returned without error"),
            }

            if shutdown.is_cancelled() {
                break;
            }

            info!("Reconnecting in {:?}...", self.reconnect_delay);
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }

        info!("Stopping bot...");
    }

    async fn run_cycle(&self, shutdown: &CancellationToken) -> BotResult<()> {
        let server = tokio::select! {
            _ = shutdown.cancelled() => return Err(BotError::Interrupted),
            connected = self.connector.connect() => connected?,
        };

        let mut dispatcher = EventDispatcher::new(
            server,
            self.engine.clone(),
            self.move_retry,
            shutdown.clone(),
        );
        let result = dispatcher.run().await;
        dispatcher.abandon_sessions();
        result
    }
}
