//! ANSI color styles per severity level.

use crate::level::LogLevel;
use ansi_term::{Colour, Style};

/// Turns a piece of text into its (possibly) colored form.
pub type ColorFn = fn(&str) -> String;

/// Style used to paint `level`.
pub fn level_style(level: LogLevel) -> Style {
    match level {
        LogLevel::Debug => Colour::Cyan.normal(),
        LogLevel::Info => Colour::Green.normal(),
        LogLevel::Warning => Colour::Yellow.normal(),
        LogLevel::Error => Colour::Red.normal(),
        LogLevel::Fatal => Colour::Red.bold(),
    }
}

/// Escape sequence that starts the color of `level`.
pub fn level_code(level: LogLevel) -> String {
    level_style(level).prefix().to_string()
}

/// Escape sequence that ends the color of `level`.
pub fn reset_code(level: LogLevel) -> String {
    level_style(level).suffix().to_string()
}

fn plain(msg: &str) -> String {
    msg.to_string()
}

fn debug(msg: &str) -> String {
    level_style(LogLevel::Debug).paint(msg).to_string()
}

fn info(msg: &str) -> String {
    level_style(LogLevel::Info).paint(msg).to_string()
}

fn warning(msg: &str) -> String {
    level_style(LogLevel::Warning).paint(msg).to_string()
}

fn error(msg: &str) -> String {
    level_style(LogLevel::Error).paint(msg).to_string()
}

fn fatal(msg: &str) -> String {
    level_style(LogLevel::Fatal).paint(msg).to_string()
}

/// Color function for `level`, or the identity when `colorize` is off.
pub fn color_fn(level: LogLevel, colorize: bool) -> ColorFn {
    if !colorize {
        return plain;
    }
    match level {
        LogLevel::Debug => debug,
        LogLevel::Info => info,
        LogLevel::Warning => warning,
        LogLevel::Error => error,
        LogLevel::Fatal => fatal,
    }
}
