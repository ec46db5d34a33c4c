#![allow(dead_code)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tether_core::{RunContext, Service, ShutdownContext};
use tokio::sync::Notify;

/// How the mock's `run` behaves.
#[derive(Debug, Clone, Copy)]
pub enum RunMode {
    /// Wait for cancellation, then return `Ok`.
    Block,
    /// Wait for cancellation, then return an error.
    FailOnCancel,
    /// Wait for cancellation, keep cleaning up for the delay, then return `Ok`.
    LingerOnCancel(Duration),
    /// Return `Ok` after the delay.
    ReturnAfter(Duration),
    /// Return an error after the delay.
    FailAfter(Duration),
    /// Panic after the delay.
    PanicAfter(Duration),
}

pub struct MockService {
    mode: RunMode,
    fail_shutdown: bool,
    shutdown_calls: AtomicUsize,
    run_cancelled: Notify,
    run_returned: AtomicBool,
    had_deadline: AtomicUsize,
}

impl MockService {
    pub fn new(mode: RunMode) -> Arc<Self> {
        Self::build(mode, false)
    }

    pub fn failing_shutdown(mode: RunMode) -> Arc<Self> {
        Self::build(mode, true)
    }

    fn build(mode: RunMode, fail_shutdown: bool) -> Arc<Self> {
        Arc::new(Self {
            mode,
            fail_shutdown,
            shutdown_calls: AtomicUsize::new(0),
            run_cancelled: Notify::new(),
            run_returned: AtomicBool::new(false),
            had_deadline: AtomicUsize::new(0),
        })
    }

    pub fn shutdown_calls(&self) -> usize {
        self.shutdown_calls.load(Ordering::SeqCst)
    }

    /// Number of shutdown calls whose context carried a deadline.
    pub fn deadlines_seen(&self) -> usize {
        self.had_deadline.load(Ordering::SeqCst)
    }

    /// Whether `run` has returned (normally or with an error).
    pub fn run_returned(&self) -> bool {
        self.run_returned.load(Ordering::SeqCst)
    }

    /// Resolves once `run` has observed its context being cancelled.
    pub async fn wait_run_cancelled(&self, within: Duration) -> bool {
        tokio::time::timeout(within, self.run_cancelled.notified())
            .await
            .is_ok()
    }
}

impl MockService {
    async fn run_inner(&self, ctx: RunContext) -> anyhow::Result<()> {
        match self.mode {
            RunMode::Block => {
                ctx.cancelled().await;
                self.run_cancelled.notify_one();
                Ok(())
            }
            RunMode::LingerOnCancel(d) => {
                ctx.cancelled().await;
                self.run_cancelled.notify_one();
                tokio::time::sleep(d).await;
                Ok(())
            }
            RunMode::FailOnCancel => {
                ctx.cancelled().await;
                self.run_cancelled.notify_one();
                anyhow::bail!("listener closed")
            }
            RunMode::ReturnAfter(d) => {
                tokio::time::sleep(d).await;
                Ok(())
            }
            RunMode::FailAfter(d) => {
                tokio::time::sleep(d).await;
                anyhow::bail!("run failed")
            }
            RunMode::PanicAfter(d) => {
                tokio::time::sleep(d).await;
                panic!("run blew up")
            }
        }
    }
}

#[async_trait]
impl Service for MockService {
    async fn run(&self, ctx: RunContext) -> anyhow::Result<()> {
        let res = self.run_inner(ctx).await;
        self.run_returned.store(true, Ordering::SeqCst);
        res
    }

    async fn shutdown(&self, ctx: ShutdownContext) -> anyhow::Result<()> {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        if ctx.deadline().is_some() {
            self.had_deadline.fetch_add(1, Ordering::SeqCst);
        }
        if self.fail_shutdown {
            anyhow::bail!("shutdown failed");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
