//! Structured logging configuration.

use tracing_subscriber::EnvFilter;

/// Env var holding the log filter; `RUST_LOG` is read when it is unset.
pub const LOG_FILTER_ENV: &str = "FACETSEARCH_LOG";

/// Env var selecting the log format (`pretty` or `json`).
pub const LOG_FORMAT_ENV: &str = "FACETSEARCH_LOG_FORMAT";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses `json`; anything else is `Pretty`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Event filter.
    pub filter: EnvFilter,
}

impl LoggingConfig {
    /// Reads the filter and format from the environment.
    ///
    /// `verbose` raises the default level from `info` to `debug`; an explicit
    /// filter in the environment still wins.
    #[must_use]
    pub fn from_env(verbose: bool) -> Self {
        Self::from_lookup(verbose, |key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`] with a custom variable lookup.
    #[must_use]
    pub fn from_lookup<F>(verbose: bool, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_level = if verbose { "debug" } else { "info" };
        let directives = lookup(LOG_FILTER_ENV)
            .or_else(|| lookup("RUST_LOG"))
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default_level.to_string());
        let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(default_level));
        let format = lookup(LOG_FORMAT_ENV)
            .map(|v| LogFormat::parse(&v))
            .unwrap_or_default();
        Self { format, filter }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LoggingConfig::from_lookup(false, lookup(&[]));
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.filter.to_string(), "info");

        let config = LoggingConfig::from_lookup(true, lookup(&[]));
        assert_eq!(config.filter.to_string(), "debug");
    }

    #[test]
    fn test_env_precedence() {
        let config = LoggingConfig::from_lookup(
            true,
            lookup(&[("FACETSEARCH_LOG", "warn"), ("RUST_LOG", "trace")]),
        );
        assert_eq!(config.filter.to_string(), "warn");

        let config = LoggingConfig::from_lookup(false, lookup(&[("RUST_LOG", "error")]));
        assert_eq!(config.filter.to_string(), "error");
    }

    #[test]
    fn test_format() {
        let config = LoggingConfig::from_lookup(false, lookup(&[("FACETSEARCH_LOG_FORMAT", "JSON")]));
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(LogFormat::parse("text"), LogFormat::Pretty);
    }
}
