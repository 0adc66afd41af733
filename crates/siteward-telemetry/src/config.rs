//! Database log sink configuration.

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;

use crate::error::TelemetryError;

/// Targets that must never reach the sink: writing a log row through
/// them would produce more log events.
pub(crate) const ALWAYS_IGNORED_TARGETS: &[&str] = &["surrealdb", "siteward_telemetry::writer"];

/// Configuration for [`DbLogLayer`](crate::DbLogLayer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSinkConfig {
    /// Least severe level persisted ("error", "warn", "info", "debug",
    /// "trace" or "off").
    #[serde(default = "default_min_level")]
    pub min_level: String,

    /// Target prefixes that are never persisted.
    #[serde(default)]
    pub ignored_targets: Vec<String>,
}

impl Default for LogSinkConfig {
    fn default() -> Self {
        Self {
            min_level: default_min_level(),
            ignored_targets: Vec::new(),
        }
    }
}

fn default_min_level() -> String {
    "warn".to_string()
}

impl LogSinkConfig {
    pub fn level_filter(&self) -> Result<LevelFilter, TelemetryError> {
        self.min_level
            .trim()
            .parse()
            .map_err(|_| TelemetryError::InvalidLevel(self.min_level.clone()))
    }

    /// Configured prefixes plus the ones that are always ignored.
    pub(crate) fn effective_ignored_targets(&self) -> Vec<String> {
        ALWAYS_IGNORED_TARGETS
            .iter()
            .map(|t| t.to_string())
            .chain(self.ignored_targets.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_level_is_warn() {
        let config = LogSinkConfig::default();
        assert_eq!(config.level_filter().unwrap(), LevelFilter::WARN);
    }

    #[test]
    fn level_parsing_is_case_insensitive() {
        let config = LogSinkConfig {
            min_level: "Debug".into(),
            ..Default::default()
        };
        assert_eq!(config.level_filter().unwrap(), LevelFilter::DEBUG);
    }

    #[test]
    fn unknown_level_is_rejected() {
        let config = LogSinkConfig {
            min_level: "loud".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.level_filter(),
            Err(TelemetryError::InvalidLevel(level)) if level == "loud"
        ));
    }

    #[test]
    fn builtin_ignores_come_first() {
        let config = LogSinkConfig {
            ignored_targets: vec!["hyper".into()],
            ..Default::default()
        };
        let targets = config.effective_ignored_targets();
        assert_eq!(targets.first().map(String::as_str), Some("surrealdb"));
        assert_eq!(targets.last().map(String::as_str), Some("hyper"));
    }
}
