mod config;
mod error;
mod format;
mod log;

pub use config::{ENV_LOG, ENV_LOG_FORMAT, LoggerConfig};
pub use error::LoggerError;
pub use format::LoggerFormat;

/// Install the global `tracing` subscriber described by `cfg`.
///
/// Fails with [`LoggerError::SubscriberAlreadySet`] when a global subscriber is already set.
pub fn init_logger(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    match cfg.format {
        LoggerFormat::Text => log::init_text(cfg),
        LoggerFormat::Json => log::init_json(cfg),
        LoggerFormat::Journald => log::init_journald(cfg),
    }
}
