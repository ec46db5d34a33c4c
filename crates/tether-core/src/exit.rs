use tracing::{error, info};

use crate::{coordinator::ShutdownOutcome, error::LifecycleError, trigger::Trigger};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Maps the acted-upon trigger and the shutdown outcome to a process exit code.
///
/// A failed shutdown always yields [`EXIT_FAILURE`]; otherwise only a failed `run` does.
pub fn exit_code(trigger: &Trigger, shutdown: Option<&ShutdownOutcome>) -> i32 {
    if let Some(ShutdownOutcome::Failed(_)) = shutdown {
        return EXIT_FAILURE;
    }
    match trigger {
        Trigger::RunCompleted(Some(_)) => EXIT_FAILURE,
        Trigger::RunCompleted(None)
        | Trigger::SignalReceived(_)
        | Trigger::RunTimeoutElapsed(_) => EXIT_SUCCESS,
    }
}

/// Final report of a lifecycle.
#[derive(Debug)]
pub struct Termination {
    trigger: Trigger,
    shutdown: Option<ShutdownOutcome>,
    code: i32,
}

impl Termination {
    pub(crate) fn new(trigger: Trigger, shutdown: Option<ShutdownOutcome>) -> Self {
        let code = exit_code(&trigger, shutdown.as_ref());
        Self {
            trigger,
            shutdown,
            code,
        }
    }

    #[inline]
    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// `None` when the service was never shut down (clean `run` return).
    #[inline]
    pub fn shutdown(&self) -> Option<&ShutdownOutcome> {
        self.shutdown.as_ref()
    }

    #[inline]
    pub fn code(&self) -> i32 {
        self.code
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.code == EXIT_SUCCESS
    }

    /// Shutdown failure takes priority over a run error.
    pub fn into_result(self) -> Result<(), LifecycleError> {
        if let Some(ShutdownOutcome::Failed(e)) = self.shutdown {
            return Err(LifecycleError::Shutdown(e));
        }
        match self.trigger {
            Trigger::RunCompleted(Some(e)) => Err(LifecycleError::Run(e)),
            _ => Ok(()),
        }
    }

    /// Terminate the process with the derived exit code.
    pub fn exit(self) -> ! {
        if self.is_success() {
            info!(code = self.code, trigger = self.trigger.kind(), "service stopped");
        } else {
            error!(code = self.code, trigger = self.trigger.kind(), "service stopped with failure");
        }
        std::process::exit(self.code)
    }
}
