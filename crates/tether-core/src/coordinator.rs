use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::{sync::watch, time::Instant};
use tracing::{Instrument, debug, error, info, warn};

use crate::{config::Config, context::ShutdownContext, service::Service};

/// Result of the (single) shutdown execution.
#[derive(Debug, Clone)]
pub enum ShutdownOutcome {
    Success,
    Failed(Arc<anyhow::Error>),
}

impl ShutdownOutcome {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, ShutdownOutcome::Success)
    }

    pub fn error(&self) -> Option<&anyhow::Error> {
        match self {
            ShutdownOutcome::Success => None,
            ShutdownOutcome::Failed(e) => Some(e),
        }
    }
}

/// Runs [`Service::shutdown`] at most once.
///
/// The first caller of [`shutdown`](Self::shutdown) claims the gate and starts the service
/// teardown on its own task; every caller, the first included, waits for that task and receives
/// a clone of the same outcome. Dropping a waiting caller does not abort the teardown and does
/// not let a later caller start a second one.
pub struct ShutdownCoordinator {
    service: Arc<dyn Service>,
    config: Arc<Config>,
    started: AtomicBool,
    outcome: Arc<watch::Sender<Option<ShutdownOutcome>>>,
}

impl ShutdownCoordinator {
    pub fn new(service: Arc<dyn Service>, config: Arc<Config>) -> Self {
        let (outcome, _) = watch::channel(None);
        Self {
            service,
            config,
            started: AtomicBool::new(false),
            outcome: Arc::new(outcome),
        }
    }

    pub async fn shutdown(&self) -> ShutdownOutcome {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.spawn_execute();
        } else {
            debug!(service = self.service.name(), "shutdown already started, waiting for it");
        }

        let mut rx = self.outcome.subscribe();
        rx.wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|o| (*o).clone())
            .unwrap_or_else(|| {
                ShutdownOutcome::Failed(Arc::new(anyhow::anyhow!("shutdown outcome was lost")))
            })
    }

    /// Whether some caller has claimed the gate, finished or not.
    #[inline]
    pub fn has_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Outcome of the shutdown, if it has finished.
    pub fn outcome(&self) -> Option<ShutdownOutcome> {
        self.outcome.borrow().clone()
    }

    fn spawn_execute(&self) {
        let handle = tokio::spawn(
            execute(Arc::clone(&self.service), Arc::clone(&self.config)).in_current_span(),
        );
        let publish = Arc::clone(&self.outcome);
        tokio::spawn(
            async move {
                let outcome = match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!(error = %e, "service shutdown task panicked");
                        ShutdownOutcome::Failed(Arc::new(anyhow::anyhow!(
                            "service shutdown task panicked: {e}"
                        )))
                    }
                };
                publish.send_replace(Some(outcome));
            }
            .in_current_span(),
        );
    }
}

async fn execute(service: Arc<dyn Service>, config: Arc<Config>) -> ShutdownOutcome {
    let name = service.name();
    let started = Instant::now();
    let timeout = config.shutdown_timeout();
    let ctx = ShutdownContext::new(config, started);
    let deadline = ctx.deadline();

    info!(service = name, ?timeout, "service shutdown requested");
    let res = service.shutdown(ctx).await;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    if deadline.is_some_and(|d| Instant::now() > d) {
        warn!(service = name, elapsed_ms, "service shutdown overran its deadline");
    }

    match res {
        Ok(()) => {
            info!(service = name, elapsed_ms, "service shutdown completed");
            ShutdownOutcome::Success
        }
        Err(e) => {
            error!(service = name, elapsed_ms, error = %format!("{e:#}"), "service shutdown error");
            ShutdownOutcome::Failed(Arc::new(e))
        }
    }
}
