use std::{fmt, time::Duration};

use crate::signal::Signal;

/// Event that ends the running phase of a lifecycle.
///
/// Only the first trigger raised is acted upon; the rest are dropped.
#[derive(Debug)]
pub enum Trigger {
    /// `run` returned; `Some` carries its error.
    RunCompleted(Option<anyhow::Error>),
    /// A termination signal was received.
    SignalReceived(Signal),
    /// The configured run-timeout elapsed.
    RunTimeoutElapsed(Duration),
}

impl Trigger {
    /// Short symbolic name for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Trigger::RunCompleted(None) => "run_completed",
            Trigger::RunCompleted(Some(_)) => "run_failed",
            Trigger::SignalReceived(_) => "signal",
            Trigger::RunTimeoutElapsed(_) => "run_timeout",
        }
    }

    /// Whether this trigger requires the service to be shut down.
    ///
    /// A clean return from `run` does not: nothing is left to tear down.
    pub fn requires_shutdown(&self) -> bool {
        !matches!(self, Trigger::RunCompleted(None))
    }

    pub fn run_error(&self) -> Option<&anyhow::Error> {
        match self {
            Trigger::RunCompleted(Some(e)) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::RunCompleted(None) => f.write_str("run completed"),
            Trigger::RunCompleted(Some(e)) => write!(f, "run failed: {e:#}"),
            Trigger::SignalReceived(sig) => write!(f, "received signal: {sig}"),
            Trigger::RunTimeoutElapsed(t) => {
                write!(f, "run timeout exceeded ({}ms)", t.as_millis())
            }
        }
    }
}
