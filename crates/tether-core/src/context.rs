use std::{any::Any, sync::Arc, time::Duration};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Handed to [`Service::run`](crate::Service::run).
///
/// Gives read access to the configuration and reports when the harness wants `run` to stop.
#[derive(Clone, Debug)]
pub struct RunContext {
    config: Arc<Config>,
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RunContext {
    pub(crate) fn new(config: Arc<Config>, token: CancellationToken, started: Instant) -> Self {
        let deadline = config.run_timeout().map(|t| started + t);
        Self {
            config,
            token,
            deadline,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Typed configuration lookup, see [`Config::get`].
    #[inline]
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.config.get(key)
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once the harness has finished shutting the service down.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Child token for work spawned by the service.
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Point in time at which the run-timeout fires, if one is configured.
    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Handed to [`Service::shutdown`](crate::Service::shutdown).
///
/// The deadline is advisory: the harness never aborts a shutdown that overruns it.
#[derive(Clone, Debug)]
pub struct ShutdownContext {
    config: Arc<Config>,
    deadline: Option<Instant>,
}

impl ShutdownContext {
    pub(crate) fn new(config: Arc<Config>, started: Instant) -> Self {
        let deadline = config.shutdown_timeout().map(|t| started + t);
        Self { config, deadline }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.config.get(key)
    }

    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` without one, zero once it passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Completes when the deadline passes. Never completes without a deadline.
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{build, with_run_timeout, with_shutdown_timeout, with_value};

    #[test]
    fn run_context_reads_config() {
        let cfg = Arc::new(build([with_value("port", 8080_u16)]));
        let ctx = RunContext::new(cfg, CancellationToken::new(), Instant::now());
        assert_eq!(ctx.get::<u16>("port"), Some(&8080));
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn run_context_deadline_follows_run_timeout() {
        let started = Instant::now();
        let cfg = Arc::new(build([with_run_timeout(Duration::from_millis(100))]));
        let ctx = RunContext::new(cfg, CancellationToken::new(), started);
        assert_eq!(ctx.deadline(), Some(started + Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn run_context_observes_cancellation() {
        let token = CancellationToken::new();
        let ctx = RunContext::new(Arc::new(Config::new()), token.clone(), Instant::now());
        let child = ctx.token();

        token.cancel();
        ctx.cancelled().await;
        assert!(ctx.is_cancelled());
        assert!(child.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_context_without_timeout_has_no_deadline() {
        let ctx = ShutdownContext::new(Arc::new(Config::new()), Instant::now());
        assert!(ctx.deadline().is_none());
        assert!(ctx.remaining().is_none());
        assert!(!ctx.is_expired());

        let expired = tokio::time::timeout(Duration::from_secs(3600), ctx.expired()).await;
        assert!(expired.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_context_deadline_expires() {
        let cfg = Arc::new(build([with_shutdown_timeout(Duration::from_millis(500))]));
        let ctx = ShutdownContext::new(cfg, Instant::now());
        assert_eq!(ctx.remaining(), Some(Duration::from_millis(500)));

        ctx.expired().await;
        assert!(ctx.is_expired());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }
}
