use std::net::SocketAddr;

use async_trait::async_trait;
use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use tether_core::prelude::*;
use tether_observe::{LoggerConfig, init_logger};

const PORT_KEY: &str = "port";

struct HttpService {
    /// Asks axum to stop accepting and drain.
    stop: CancellationToken,
    /// Cancelled once `run` has returned, whatever the reason.
    stopped: CancellationToken,
}

impl HttpService {
    fn new() -> Self {
        Self {
            stop: CancellationToken::new(),
            stopped: CancellationToken::new(),
        }
    }
}

async fn hello() -> &'static str {
    "Hello, this is a simple web server!"
}

#[async_trait]
impl Service for HttpService {
    async fn run(&self, ctx: RunContext) -> anyhow::Result<()> {
        let _stopped = self.stopped.clone().drop_guard();

        let port = ctx
            .get::<u16>(PORT_KEY)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("no port value found in configuration"))?;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "http server listening");

        let app = Router::new().route("/", get(hello));
        axum::serve(listener, app)
            .with_graceful_shutdown(self.stop.clone().cancelled_owned())
            .await?;

        info!("http server stopped");
        Ok(())
    }

    async fn shutdown(&self, ctx: ShutdownContext) -> anyhow::Result<()> {
        info!("API shutdown requested");
        self.stop.cancel();

        tokio::select! {
            _ = self.stopped.cancelled() => {
                info!("API shutdown");
                Ok(())
            }
            _ = ctx.expired() => {
                Err(anyhow::anyhow!("http server did not drain before the shutdown deadline"))
            }
        }
    }

    fn name(&self) -> &str {
        "http-server"
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger(&LoggerConfig::from_env()?)?;

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    tether_core::run(HttpService::new(), [with_value(PORT_KEY, port)])
}
