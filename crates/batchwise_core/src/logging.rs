//! Logging setup.
//!
//! The batchwise crates only emit `tracing` events: page fetches and limit
//! hits at `debug`, the end of a run at `info`, cleanup details at `trace`.
//! [`LoggingConfig`] installs a subscriber that shows them.
//!
//! Without an explicit filter the configured level applies to the batchwise
//! crates only and everything else is held at `warn`.
//!
//! # Example
//!
//! ```
//! use batchwise_core::{LogFormat, LoggingConfig};
//! use tracing::Level;
//!
//! let config = LoggingConfig::new()
//!     .with_level(Level::DEBUG)
//!     .with_format(LogFormat::Compact);
//! assert_eq!(
//!     config.default_directives(),
//!     "warn,batchwise_iter=debug,batchwise_features=debug,batchwise_host=debug,batchwise_hooks=debug"
//! );
//! config.init();
//! ```

use core::fmt;
use core::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::TestWriter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Crates whose events follow the configured level by default.
pub const BATCHWISE_TARGETS: [&str; 4] = [
    "batchwise_iter",
    "batchwise_features",
    "batchwise_host",
    "batchwise_hooks",
];

/// Environment variable holding a full filter, e.g. `batchwise_iter=trace`.
pub const LOG_FILTER_VAR: &str = "BATCHWISE_LOG";

/// Environment variable holding the level for the batchwise crates.
pub const LOG_LEVEL_VAR: &str = "BATCHWISE_LOG_LEVEL";

/// Environment variable holding the output format.
pub const LOG_FORMAT_VAR: &str = "BATCHWISE_LOG_FORMAT";

type FilteredRegistry = Layered<EnvFilter, Registry>;

// ─────────────────────────────────────────────────────────────────────────────
// LogFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line output for watching a job in a terminal.
    #[default]
    Pretty,
    /// One line per event.
    Compact,
    /// One JSON object per event, for log shippers.
    Json,
}

impl LogFormat {
    /// Name accepted by [`FromStr`] and [`LOG_FORMAT_VAR`].
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(LoggingError::InvalidValue {
                key: LOG_FORMAT_VAR,
                value: value.to_owned(),
            }),
        }
    }
}

/// Error reading a [`LoggingConfig`] from the environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoggingError {
    /// A variable was set to something that is not a level or format name.
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue {
        /// Name of the variable.
        key: &'static str,
        /// The raw value.
        value: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// LoggingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Subscriber configuration.
///
/// The filter is taken from, in order of preference:
///
/// 1. [`with_env_filter`](Self::with_env_filter)
/// 2. [`default_directives`](Self::default_directives), built from the level
///
/// A filter string that does not parse falls back to the default directives.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    level: Level,
    format: LogFormat,
    env_filter: Option<String>,
    span_events: bool,
    test_writer: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            env_filter: None,
            span_events: false,
            test_writer: false,
        }
    }
}

impl LoggingConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads [`LOG_FILTER_VAR`], [`LOG_LEVEL_VAR`] and [`LOG_FORMAT_VAR`] from
    /// the process environment. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`LoggingError`] if the level or format is not recognized.
    pub fn from_env() -> Result<Self, LoggingError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LoggingError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(LOG_LEVEL_VAR) {
            config.level = raw
                .trim()
                .parse()
                .map_err(|_| LoggingError::InvalidValue {
                    key: LOG_LEVEL_VAR,
                    value: raw,
                })?;
        }
        if let Some(raw) = lookup(LOG_FORMAT_VAR) {
            config.format = raw.parse()?;
        }
        config.env_filter = lookup(LOG_FILTER_VAR).filter(|filter| !filter.trim().is_empty());

        Ok(config)
    }

    /// Sets the level for the batchwise crates.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Replaces the default directives with a custom filter.
    ///
    /// Format: `target=level,target=level,...`
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Writes through libtest's captured output instead of stdout.
    #[must_use]
    pub fn with_test_writer(mut self, enabled: bool) -> Self {
        self.test_writer = enabled;
        self
    }

    /// The configured level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// The configured output format.
    #[must_use]
    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// Filter used when no explicit one is set: `warn` for everything, the
    /// configured level for [`BATCHWISE_TARGETS`].
    #[must_use]
    pub fn default_directives(&self) -> String {
        let level = self.level.as_str().to_ascii_lowercase();
        let mut directives = String::from("warn");
        for target in BATCHWISE_TARGETS {
            directives.push_str(&format!(",{target}={level}"));
        }
        directives
    }

    /// Builds the filter, returning the parse error of a rejected custom
    /// filter alongside the fallback.
    fn build_filter(&self) -> (EnvFilter, Option<ParseError>) {
        let fallback = || EnvFilter::new(self.default_directives());
        match self.env_filter.as_deref().map(EnvFilter::try_new) {
            Some(Ok(filter)) => (filter, None),
            Some(Err(err)) => (fallback(), Some(err)),
            None => (fallback(), None),
        }
    }

    fn fmt_layer(&self) -> Box<dyn Layer<FilteredRegistry> + Send + Sync> {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };
        let writer = if self.test_writer {
            BoxMakeWriter::new(TestWriter::new())
        } else {
            BoxMakeWriter::new(std::io::stdout)
        };
        let layer = tracing_subscriber::fmt::layer().with_writer(writer);

        match self.format {
            LogFormat::Pretty => layer.pretty().with_span_events(span_events).boxed(),
            LogFormat::Compact => layer.compact().with_span_events(span_events).boxed(),
            LogFormat::Json => layer.json().with_span_events(span_events).boxed(),
        }
    }

    /// Installs the global subscriber.
    ///
    /// Returns `false` if a subscriber was already installed, in which case
    /// the existing one is left in place.
    pub fn init(&self) -> bool {
        let (filter, rejected) = self.build_filter();
        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(self.fmt_layer())
            .try_init()
            .is_ok();

        if installed {
            tracing::debug!(
                level = %self.level,
                format = %self.format,
                "logging initialized"
            );
            if let Some(err) = rejected {
                tracing::warn!(
                    filter = self.env_filter.as_deref().unwrap_or_default(),
                    error = %err,
                    "invalid log filter, using defaults"
                );
            }
        }
        installed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_owned())
        }
    }

    #[test]
    fn defaults_scope_info_to_batchwise_crates() {
        let config = LoggingConfig::default();

        assert_eq!(config.level(), Level::INFO);
        assert_eq!(config.format(), LogFormat::Pretty);
        assert_eq!(
            config.default_directives(),
            "warn,batchwise_iter=info,batchwise_features=info,batchwise_host=info,batchwise_hooks=info"
        );
        assert_eq!(
            config.build_filter().0.max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }

    #[test]
    fn explicit_filter_wins() {
        let config = LoggingConfig::new().with_env_filter("batchwise_iter=trace");
        let (filter, rejected) = config.build_filter();

        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
        assert!(rejected.is_none());
    }

    #[test]
    fn invalid_filter_falls_back_to_defaults() {
        let config = LoggingConfig::new()
            .with_level(Level::DEBUG)
            .with_env_filter("batchwise_iter=loudest");

        let (filter, rejected) = config.build_filter();

        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
        assert!(rejected.is_some());
    }

    #[test]
    fn lookup_reads_level_format_and_filter() {
        let config = LoggingConfig::from_lookup(env(&[
            (LOG_LEVEL_VAR, "debug"),
            (LOG_FORMAT_VAR, "JSON"),
            (LOG_FILTER_VAR, "batchwise_host=trace"),
        ]))
        .unwrap();

        assert_eq!(config.level(), Level::DEBUG);
        assert_eq!(config.format(), LogFormat::Json);
        assert_eq!(config.env_filter.as_deref(), Some("batchwise_host=trace"));
    }

    #[test]
    fn lookup_rejects_unknown_names() {
        assert_eq!(
            LoggingConfig::from_lookup(env(&[(LOG_FORMAT_VAR, "xml")])).unwrap_err(),
            LoggingError::InvalidValue {
                key: LOG_FORMAT_VAR,
                value: "xml".to_owned(),
            }
        );
        assert!(matches!(
            LoggingConfig::from_lookup(env(&[(LOG_LEVEL_VAR, "loud")])),
            Err(LoggingError::InvalidValue {
                key: LOG_LEVEL_VAR,
                ..
            })
        ));
    }

    #[test]
    fn empty_filter_variable_is_ignored() {
        let config = LoggingConfig::from_lookup(env(&[(LOG_FILTER_VAR, "  ")])).unwrap();
        assert_eq!(config.env_filter, None);
    }

    #[test]
    fn second_init_keeps_first_subscriber() {
        let config = LoggingConfig::new()
            .with_format(LogFormat::Compact)
            .with_test_writer(true);
        config.init();
        assert!(!config.init());
    }
}
