use crate::env::{parse_flag, CONSOLE_LOG_COLORIZE_ENV, NO_COLOR_ENV};
use crate::level::LogLevel;
use crate::writer::ConsoleWriter;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::sync::Arc;

/// Configuration for [`ConsoleLogger`](crate::console::ConsoleLogger).
///
/// **Fields**
/// - `colorize`: emit ANSI colors. Defaults to `true`.
/// - `writers`: per-level writer overrides. Levels without an override
///   go to standard output.
/// - `stdout_fallback`: when `false`, levels without an override get no
///   writer at all and logging at them fails with
///   [`LoggerError::UnsupportedLevel`](crate::error::LoggerError::UnsupportedLevel).
#[derive(Clone)]
pub struct ConsoleLoggerConfig {
    pub colorize: bool,
    pub writers: HashMap<LogLevel, Arc<dyn ConsoleWriter>>,
    pub stdout_fallback: bool,
}

impl Default for ConsoleLoggerConfig {
    fn default() -> Self {
        Self {
            colorize: true,
            writers: HashMap::new(),
            stdout_fallback: true,
        }
    }
}

impl fmt::Debug for ConsoleLoggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut levels: Vec<_> = self.writers.keys().collect();
        levels.sort();
        f.debug_struct("ConsoleLoggerConfig")
            .field("colorize", &self.colorize)
            .field("writers", &levels)
            .field("stdout_fallback", &self.stdout_fallback)
            .finish()
    }
}

impl ConsoleLoggerConfig {
    /// Default configuration adjusted by `CONSOLE_LOG_COLORIZE` and `NO_COLOR`.
    ///
    /// `NO_COLOR` wins over `CONSOLE_LOG_COLORIZE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        let colorize = env::var(CONSOLE_LOG_COLORIZE_ENV).ok();
        let no_color = env::var(NO_COLOR_ENV).ok();
        config.colorize = colorize_setting(config.colorize, colorize.as_deref(), no_color.as_deref());
        config
    }

    pub fn with_colorize(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    /// Route `level` to `writer` instead of standard output.
    pub fn with_writer(mut self, level: LogLevel, writer: Arc<dyn ConsoleWriter>) -> Self {
        self.writers.insert(level, writer);
        self
    }

    /// Only levels with an explicit writer are routable.
    pub fn without_stdout_fallback(mut self) -> Self {
        self.stdout_fallback = false;
        self
    }
}

/// Resolve colorization from raw `CONSOLE_LOG_COLORIZE` and `NO_COLOR` values.
///
/// A non-empty `NO_COLOR` always disables color. An unrecognized
/// `CONSOLE_LOG_COLORIZE` keeps `default`.
fn colorize_setting(default: bool, colorize: Option<&str>, no_color: Option<&str>) -> bool {
    if no_color.is_some_and(|v| !v.is_empty()) {
        return false;
    }
    colorize.and_then(parse_flag).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colorize_flag_overrides_default() {
        assert!(!colorize_setting(true, Some("false"), None));
        assert!(colorize_setting(false, Some("on"), None));
        assert!(colorize_setting(true, None, None));
        assert!(colorize_setting(true, Some("sometimes"), None));
    }

    #[test]
    fn no_color_wins_over_colorize() {
        assert!(!colorize_setting(true, Some("true"), Some("1")));
        assert!(colorize_setting(true, Some("true"), Some("")));
    }

    #[test]
    fn builders() {
        let cfg = ConsoleLoggerConfig::default()
            .with_colorize(false)
            .with_writer(LogLevel::Error, Arc::new(crate::writer::StderrWriter))
            .without_stdout_fallback();
        assert!(!cfg.colorize);
        assert!(!cfg.stdout_fallback);
        assert!(cfg.writers.contains_key(&LogLevel::Error));
    }
}
