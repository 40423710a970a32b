//! Environment variable names used by this crate for convenient
//! configuration of console loggers from services.
//!
//! These are purely helpers; the logger types themselves never read the
//! environment unless `from_env` is called.

/// Overrides colorization, e.g. `CONSOLE_LOG_COLORIZE=false`.
pub const CONSOLE_LOG_COLORIZE_ENV: &str = "CONSOLE_LOG_COLORIZE";

/// Minimum level dispatched by a [`Base`](crate::base::Base), e.g. `warning`.
pub const CONSOLE_LOG_LEVEL_ENV: &str = "CONSOLE_LOG_LEVEL";

/// Any non-empty value disables colors (see <https://no-color.org>).
pub const NO_COLOR_ENV: &str = "NO_COLOR";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a boolean flag such as `true`, `0` or `off`.
pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
