use std::{fmt, str::FromStr};

use serde::Deserialize;

use crate::logger::error::LoggerError;

/// Output sink and encoding for log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggerFormat {
    /// Human-readable lines on stdout.
    #[default]
    Text,
    /// One JSON object per line on stdout, with the lifecycle span fields.
    Json,
    /// systemd journal (Linux, `journald` feature).
    Journald,
}

impl LoggerFormat {
    /// Whether this build can write to the systemd journal.
    pub const JOURNALD_AVAILABLE: bool = cfg!(all(target_os = "linux", feature = "journald"));

    const NAMES: [(&'static str, LoggerFormat); 4] = [
        ("text", LoggerFormat::Text),
        ("json", LoggerFormat::Json),
        ("journald", LoggerFormat::Journald),
        ("journal", LoggerFormat::Journald),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LoggerFormat::Text => "text",
            LoggerFormat::Json => "json",
            LoggerFormat::Journald => "journald",
        }
    }
}

impl fmt::Display for LoggerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoggerFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let format = Self::NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, f)| *f)
            .ok_or_else(|| LoggerError::UnknownFormat(name.to_string()))?;

        if format == LoggerFormat::Journald && !Self::JOURNALD_AVAILABLE {
            return Err(LoggerError::JournaldUnavailable);
        }
        Ok(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_formats_case_insensitively() {
        assert_eq!(" Text ".parse::<LoggerFormat>().unwrap(), LoggerFormat::Text);
        assert_eq!("JSON".parse::<LoggerFormat>().unwrap(), LoggerFormat::Json);
    }

    #[test]
    fn display_matches_env_spelling() {
        for format in [LoggerFormat::Text, LoggerFormat::Json, LoggerFormat::Journald] {
            let name = format.to_string();
            if format != LoggerFormat::Journald || LoggerFormat::JOURNALD_AVAILABLE {
                assert_eq!(name.parse::<LoggerFormat>().unwrap(), format);
            }
        }
    }

    #[test]
    fn rejects_unknown_format() {
        let err = "yaml".parse::<LoggerFormat>().unwrap_err();
        assert!(matches!(err, LoggerError::UnknownFormat(ref s) if s == "yaml"));
        assert!(err.to_string().contains("TETHER_LOG_FORMAT"));
    }

    #[test]
    fn journal_alias_follows_availability() {
        let res = "journal".parse::<LoggerFormat>();
        if LoggerFormat::JOURNALD_AVAILABLE {
            assert_eq!(res.unwrap(), LoggerFormat::Journald);
        } else {
            assert!(matches!(res, Err(LoggerError::JournaldUnavailable)));
        }
    }
}
