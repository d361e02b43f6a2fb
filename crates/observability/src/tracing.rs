//! Tracing subscriber initialization.
//!
//! `RUST_LOG` selects what is emitted (default [`DEFAULT_FILTER`]) and
//! `STOCKROOM_LOG_FORMAT` selects `json` or `pretty` output.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

pub const ENV_LOG_FORMAT: &str = "STOCKROOM_LOG_FORMAT";
pub const DEFAULT_FILTER: &str = "info,sqlx=warn";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub format: LogFormat,
    /// Directive string used when `RUST_LOG` is unset or invalid.
    pub default_filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }
}

impl LogSettings {
    /// Read settings from the process environment.
    ///
    /// An unrecognized format falls back to JSON rather than failing startup.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = lookup(ENV_LOG_FORMAT)
            .and_then(|value| value.parse().ok())
            .unwrap_or_default();
        Self {
            format,
            ..Self::default()
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }
}

/// Install the global subscriber described by `settings`.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(settings: &LogSettings) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(settings.filter())
        .with_timer(tracing_subscriber::fmt::time::SystemTime);

    let _ = match settings.format {
        LogFormat::Json => builder.json().with_target(false).try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!(" pretty ".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn settings_default_to_json() {
        let settings = LogSettings::from_lookup(|_| None);
        assert_eq!(settings, LogSettings::default());
        assert_eq!(settings.default_filter, DEFAULT_FILTER);
    }

    #[test]
    fn unknown_format_falls_back_to_default() {
        let settings = LogSettings::from_lookup(|key| {
            (key == ENV_LOG_FORMAT).then(|| "yaml".to_string())
        });
        assert_eq!(settings.format, LogFormat::Json);

        let settings = LogSettings::from_lookup(|key| {
            (key == ENV_LOG_FORMAT).then(|| "pretty".to_string())
        });
        assert_eq!(settings.format, LogFormat::Pretty);
    }

    #[test]
    fn format_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&LogFormat::Pretty).unwrap(), "\"pretty\"");
    }

    #[test]
    fn init_is_idempotent() {
        init(&LogSettings::default());
        init(&LogSettings {
            format: LogFormat::Pretty,
            ..LogSettings::default()
        });
    }
}
