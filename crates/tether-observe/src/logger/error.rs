use thiserror::Error;
use tracing_subscriber::filter::ParseError;

use crate::logger::config::{ENV_LOG, ENV_LOG_FORMAT};

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown log format `{0}` in {var}, use text, json or journald", var = ENV_LOG_FORMAT)]
    UnknownFormat(String),
    #[error("journald output needs Linux and the `journald` feature")]
    JournaldUnavailable,
    #[error("cannot open the journald socket: {0}")]
    Journald(#[source] std::io::Error),
    #[error("invalid filter `{directives}` in {var}: {source}", var = ENV_LOG)]
    Filter {
        directives: String,
        #[source]
        source: ParseError,
    },
    #[error("a global tracing subscriber is already installed")]
    SubscriberAlreadySet,
    #[error("cannot install tracing subscriber: {0}")]
    Install(String),
}
