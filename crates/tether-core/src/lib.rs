//! # Lifecycle harness for long-running services.
//!
//! A [`Service`] exposes `run` and `shutdown`. The harness runs it once, stops it gracefully on
//! the first of:
//! - a termination signal (`SIGINT`/`SIGTERM`),
//! - the optional run-timeout elapsing,
//! - `run` itself returning,
//!
//! and turns the result into a process exit code.
//!
//! ```text
//! opts ──► build ──► Config ──► Lifecycle ──► run (task)
//!                                  │  ├────► signal watcher ─┐
//!                                  │  └────► timeout watcher ┤
//!                                  │◄────── first Trigger ◄──┘
//!                                  ▼
//!                         ShutdownCoordinator (once)
//!                                  ▼
//!                            Termination ──► exit code
//! ```
mod context;
mod coordinator;
mod error;
mod exit;
mod lifecycle;
mod service;
mod trigger;

pub mod config;
pub mod signal;

pub use config::{
    Config, Opt, Value, build, with_run_timeout, with_shutdown_timeout, with_value, with_values,
};
pub use context::{RunContext, ShutdownContext};
pub use coordinator::{ShutdownCoordinator, ShutdownOutcome};
pub use error::LifecycleError;
pub use exit::{EXIT_FAILURE, EXIT_SUCCESS, Termination, exit_code};
pub use lifecycle::{Lifecycle, State, run};
pub use service::Service;
pub use signal::{Signal, SignalSource};
pub use trigger::Trigger;

pub mod prelude {
    pub use crate::config::{with_run_timeout, with_shutdown_timeout, with_value, with_values};
    pub use crate::{RunContext, Service, ShutdownContext, Value};
}
