use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tether_core::prelude::*;
use tether_observe::{LoggerConfig, init_logger};

/// Simulated cleanup work done on shutdown; compare with the shutdown-timeout below.
const CLEANUP_KEY: &str = "cleanup";

struct EchoService {
    message: String,
    period: Duration,
    stop: CancellationToken,
}

impl EchoService {
    fn new(message: impl Into<String>, period: Duration) -> Self {
        Self {
            message: message.into(),
            period,
            stop: CancellationToken::new(),
        }
    }
}

#[async_trait]
impl Service for EchoService {
    async fn run(&self, ctx: RunContext) -> anyhow::Result<()> {
        loop {
            info!("{}", self.message);
            tokio::select! {
                _ = tokio::time::sleep(self.period) => {}
                _ = self.stop.cancelled() => {
                    info!("service shutdown signal received");
                    break;
                }
                _ = ctx.cancelled() => break,
            }
        }
        info!("service stopped");
        Ok(())
    }

    async fn shutdown(&self, ctx: ShutdownContext) -> anyhow::Result<()> {
        info!("service shutdown method called");
        let cleanup = ctx
            .get::<Duration>(CLEANUP_KEY)
            .copied()
            .unwrap_or(Duration::from_millis(300));

        let res = tokio::select! {
            _ = tokio::time::sleep(cleanup) => {
                info!("service shutdown actions completed");
                Ok(())
            }
            _ = ctx.expired() => {
                warn!(
                    cleanup_ms = cleanup.as_millis() as u64,
                    "shutdown deadline reached before cleanup finished"
                );
                Err(anyhow::anyhow!("shutdown deadline exceeded"))
            }
        };

        self.stop.cancel();
        res
    }

    fn name(&self) -> &str {
        "echo-worker"
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger(&LoggerConfig::from_env()?)?;

    let svc = EchoService::new("I'm running", Duration::from_secs(1));
    tether_core::run(
        svc,
        [
            with_run_timeout(Duration::from_secs(5)),
            with_shutdown_timeout(Duration::from_millis(500)),
            with_value(CLEANUP_KEY, Duration::from_millis(300)),
        ],
    )
}
