//! # Process-termination signals.
//!
//! [`wait_for_shutdown_signal`] completes when the process receives a termination request.
//!
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]
use std::{fmt, future::Future, pin::Pin};

/// Which termination request was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the lifecycle's signal watcher gets its stop request from.
pub enum SignalSource {
    /// Real OS signals.
    Os,
    /// Any future; its output is reported as the received signal.
    Custom(Pin<Box<dyn Future<Output = Signal> + Send>>),
}

impl SignalSource {
    pub fn custom<F>(fut: F) -> Self
    where
        F: Future<Output = Signal> + Send + 'static,
    {
        SignalSource::Custom(Box::pin(fut))
    }

    /// Never fires.
    pub fn never() -> Self {
        Self::custom(std::future::pending())
    }

    pub(crate) async fn wait(self) -> std::io::Result<Signal> {
        match self {
            SignalSource::Os => wait_for_shutdown_signal().await,
            SignalSource::Custom(fut) => Ok(fut.await),
        }
    }
}

impl Default for SignalSource {
    fn default() -> Self {
        SignalSource::Os
    }
}

impl fmt::Debug for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalSource::Os => f.write_str("Os"),
            SignalSource::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
///
/// Returns the received signal, or `Err` if registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<Signal> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let received = tokio::select! {
        _ = sigint.recv()  => Signal::Interrupt,
        _ = sigterm.recv() => Signal::Terminate,
    };
    Ok(received)
}

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
///
/// Returns the received signal, or `Err` if registration fails.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<Signal> {
    tokio::signal::ctrl_c().await?;
    Ok(Signal::Interrupt)
}
