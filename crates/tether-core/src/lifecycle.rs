use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::Instant,
};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::{
    config::{Config, Opt, build},
    context::RunContext,
    coordinator::ShutdownCoordinator,
    error::LifecycleError,
    exit::{EXIT_FAILURE, Termination},
    service::Service,
    signal::SignalSource,
    trigger::Trigger,
};

/// Phase of a [`Lifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Running,
    ShuttingDown,
    Terminated,
}

/// Drives exactly one execution of a [`Service`].
///
/// `run` is spawned on its own task while watchers for termination signals and the optional
/// run-timeout are armed next to it. Every source reports into a single trigger channel; the first
/// trigger received decides how the lifecycle ends:
/// - `run` returned cleanly: nothing to tear down, terminate with success.
/// - anything else: execute [`Service::shutdown`] once, then cancel the run context and wait for
///   `run` to return.
///
/// The wait for `run` is bounded by the shutdown-timeout when one is configured. Later triggers
/// are logged and dropped.
pub struct Lifecycle {
    service: Arc<dyn Service>,
    config: Arc<Config>,
    signals: SignalSource,
    state: watch::Sender<State>,
}

impl Lifecycle {
    pub fn new<S: Service>(service: S, opts: impl IntoIterator<Item = Opt>) -> Self {
        Self::from_arc(Arc::new(service), opts)
    }

    /// Same as [`new`](Self::new) for a service the caller keeps a handle to.
    pub fn from_arc(service: Arc<dyn Service>, opts: impl IntoIterator<Item = Opt>) -> Self {
        let (state, _) = watch::channel(State::Idle);
        Self {
            service,
            config: Arc::new(build(opts)),
            signals: SignalSource::Os,
            state,
        }
    }

    /// Replace the OS signal watcher.
    pub fn with_signal_source(mut self, signals: SignalSource) -> Self {
        self.signals = signals;
        self
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> State {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<State> {
        self.state.subscribe()
    }

    /// Run the service until the first trigger and report how it ended.
    pub async fn run(self) -> Termination {
        let span = info_span!(
            "lifecycle",
            service = self.service.name(),
            run_id = %Uuid::new_v4()
        );
        self.drive().instrument(span).await
    }

    async fn drive(self) -> Termination {
        let Lifecycle {
            service,
            config,
            signals,
            state,
        } = self;

        let started = Instant::now();
        let run_token = CancellationToken::new();
        let watchers = CancellationToken::new();
        // Each source raises at most one trigger.
        let (tx, mut rx) = mpsc::channel::<Trigger>(3);
        let coordinator = ShutdownCoordinator::new(Arc::clone(&service), Arc::clone(&config));

        state.send_replace(State::Running);
        info!(
            run_timeout = ?config.run_timeout(),
            shutdown_timeout = ?config.shutdown_timeout(),
            "service starting"
        );

        let run_done = spawn_run(
            Arc::clone(&service),
            RunContext::new(Arc::clone(&config), run_token.clone(), started),
            tx.clone(),
        );
        spawn_signal_watcher(signals, watchers.clone(), tx.clone());
        if let Some(timeout) = config.run_timeout() {
            let tx = tx.clone();
            let stop = watchers.clone();
            tokio::spawn(
                async move {
                    tokio::select! {
                        _ = stop.cancelled() => {}
                        _ = tokio::time::sleep_until(started + timeout) => {
                            warn!(timeout_ms = timeout.as_millis() as u64, "run timeout exceeded");
                            let _ = tx.send(Trigger::RunTimeoutElapsed(timeout)).await;
                        }
                    }
                }
                .in_current_span(),
            );
        }
        drop(tx);

        let trigger = rx.recv().await.unwrap_or_else(|| {
            Trigger::RunCompleted(Some(anyhow::anyhow!("all trigger sources closed")))
        });
        match &trigger {
            Trigger::RunCompleted(Some(e)) => {
                error!(error = %format!("{e:#}"), "service run error")
            }
            Trigger::RunCompleted(None) => info!("service run completed"),
            other => info!(trigger = other.kind(), "{other}"),
        }

        let shutdown = if trigger.requires_shutdown() {
            state.send_replace(State::ShuttingDown);
            Some(coordinator.shutdown().await)
        } else {
            info!("service run completed without shutdown");
            None
        };

        run_token.cancel();
        watchers.cancel();
        wait_run_returned(run_done, config.shutdown_timeout()).await;
        while let Ok(late) = rx.try_recv() {
            match late {
                Trigger::RunCompleted(Some(e)) => {
                    debug!(error = %format!("{e:#}"), "late service run error ignored")
                }
                other => debug!(trigger = other.kind(), "late trigger ignored"),
            }
        }

        state.send_replace(State::Terminated);
        let termination = Termination::new(trigger, shutdown);
        info!(code = termination.code(), "service shutdown");
        termination
    }
}

/// The returned handle resolves once `run` has returned and its trigger has been sent.
fn spawn_run(
    service: Arc<dyn Service>,
    ctx: RunContext,
    tx: mpsc::Sender<Trigger>,
) -> JoinHandle<()> {
    let handle = tokio::spawn(async move { service.run(ctx).await }.in_current_span());
    tokio::spawn(
        async move {
            let res = match handle.await {
                Ok(res) => res.err(),
                Err(e) => Some(anyhow::anyhow!("service run task panicked: {e}")),
            };
            let _ = tx.send(Trigger::RunCompleted(res)).await;
        }
        .in_current_span(),
    )
}

async fn wait_run_returned(run: JoinHandle<()>, bound: Option<Duration>) {
    let res = match bound {
        Some(bound) => match tokio::time::timeout(bound, run).await {
            Ok(res) => res,
            Err(_) => {
                warn!(
                    wait_ms = bound.as_millis() as u64,
                    "service run did not return after cancellation, abandoning it"
                );
                return;
            }
        },
        None => run.await,
    };
    match res {
        Ok(()) => debug!("service run returned"),
        Err(e) => debug!(error = %e, "service run watcher failed"),
    }
}

fn spawn_signal_watcher(
    signals: SignalSource,
    stop: CancellationToken,
    tx: mpsc::Sender<Trigger>,
) {
    tokio::spawn(
        async move {
            tokio::select! {
                _ = stop.cancelled() => {}
                res = signals.wait() => match res {
                    Ok(sig) => {
                        let _ = tx.send(Trigger::SignalReceived(sig)).await;
                    }
                    Err(e) => {
                        warn!(
                            error = %e,
                            "failed to register signal handlers, signal watcher disabled"
                        );
                    }
                },
            }
        }
        .in_current_span(),
    );
}

/// Run `service` to completion and exit the process.
///
/// Builds a multi-threaded tokio runtime, drives a [`Lifecycle`] on it, and calls
/// [`std::process::exit`] with the derived code once `run` has returned (or the shutdown-timeout
/// has passed waiting for it).
///
/// ```no_run
/// use std::time::Duration;
/// use tether_core::{RunContext, Service, ShutdownContext, with_run_timeout};
///
/// struct Idle;
///
/// #[async_trait::async_trait]
/// impl Service for Idle {
///     async fn run(&self, ctx: RunContext) -> anyhow::Result<()> {
///         ctx.cancelled().await;
///         Ok(())
///     }
///     async fn shutdown(&self, _ctx: ShutdownContext) -> anyhow::Result<()> {
///         Ok(())
///     }
/// }
///
/// tether_core::run(Idle, [with_run_timeout(Duration::from_secs(5))]);
/// ```
pub fn run<S: Service>(service: S, opts: impl IntoIterator<Item = Opt>) -> ! {
    let lifecycle = Lifecycle::new(service, opts);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %LifecycleError::from(e), "cannot run service");
            std::process::exit(EXIT_FAILURE)
        }
    };
    runtime.block_on(lifecycle.run()).exit()
}
