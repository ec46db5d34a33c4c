use async_trait::async_trait;

use crate::context::{RunContext, ShutdownContext};

/// A long-running unit of work driven by the harness.
///
/// `run` is invoked exactly once, on its own task.
/// `shutdown` is invoked at most once, whenever the first stop trigger fires (signal, run-timeout,
/// or `run` failing). The harness waits for `run` to return after cancelling its context.
/// Both may execute concurrently, so implementations share state through interior mutability.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Main loop. Must return promptly once `ctx` is cancelled.
    async fn run(&self, ctx: RunContext) -> anyhow::Result<()>;

    /// Graceful teardown; should honour [`ShutdownContext::deadline`] when one is set.
    async fn shutdown(&self, ctx: ShutdownContext) -> anyhow::Result<()>;

    /// Name used in log fields.
    fn name(&self) -> &str {
        "service"
    }
}
