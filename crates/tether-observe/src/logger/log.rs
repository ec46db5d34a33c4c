use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, fmt, fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError};

/// Human-readable lines on stdout.
pub(crate) fn init_text(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let layer = fmt::layer()
        .with_ansi(cfg.use_color)
        .with_target(cfg.with_targets)
        .with_timer(local_timer());
    install(tracing_subscriber::registry().with(mk_filter(&cfg.level)?).with(layer))
}

/// One JSON object per record, carrying the current span (service, run id).
pub(crate) fn init_json(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_ansi(false)
        .with_target(cfg.with_targets)
        .with_timer(local_timer());
    install(tracing_subscriber::registry().with(mk_filter(&cfg.level)?).with(layer))
}

pub(crate) fn init_journald(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    mk_journald(mk_filter(&cfg.level)?)
}

pub(crate) fn mk_filter(level: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(level).map_err(|source| LoggerError::Filter {
        directives: level.to_string(),
        source,
    })
}

fn local_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

fn install<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber.try_init().map_err(|e| {
        let msg = e.to_string();
        // tracing-core reports "a global default trace dispatcher has already been set"
        if msg.contains("global default") {
            LoggerError::SubscriberAlreadySet
        } else {
            LoggerError::Install(msg)
        }
    })
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn mk_journald(filter: EnvFilter) -> Result<(), LoggerError> {
    let journald = tracing_journald::layer().map_err(LoggerError::Journald)?;
    install(tracing_subscriber::registry().with(filter).with(journald))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn mk_journald(_filter: EnvFilter) -> Result<(), LoggerError> {
    Err(LoggerError::JournaldUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LoggerFormat, init_logger};

    #[test]
    fn invalid_level_is_rejected() {
        let err = mk_filter("tether_core=verbose").unwrap_err();
        assert!(matches!(
            err,
            LoggerError::Filter { ref directives, .. } if directives == "tether_core=verbose"
        ));
        assert!(err.to_string().contains("TETHER_LOG"));
    }

    #[test]
    fn valid_directives_are_accepted() {
        assert!(mk_filter("info").is_ok());
        assert!(mk_filter("warn,tether_core=debug").is_ok());
    }

    #[test]
    fn second_init_reports_subscriber_already_set() {
        let cfg = LoggerConfig {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: false,
            use_color: false,
        };
        // The first call may race other tests installing a subscriber.
        let _ = init_logger(&cfg);
        assert!(matches!(init_logger(&cfg), Err(LoggerError::SubscriberAlreadySet)));
    }
}
