//! Console logger for structured log records.
//!
//! A [`ConsoleLogger`] receives records that are already timestamped and
//! leveled, merges the attributes of its [`Base`] with the call-site ones,
//! renders the result through a [`Template`] (optionally with ANSI colors
//! per level) and prints one line per record.

pub mod base;
pub mod color;
pub mod config;
pub mod console;
pub mod env;
pub mod error;
pub mod level;
pub mod logger;
pub mod record;
pub mod template;
pub mod writer;

#[cfg(feature = "layer")]
pub mod init;
#[cfg(feature = "layer")]
pub mod layer;

pub use base::{Base, LogAdapter, SharedAttrs};
pub use config::ConsoleLoggerConfig;
pub use console::ConsoleLogger;
pub use error::LoggerError;
pub use level::LogLevel;
pub use logger::Logger;
pub use record::{Attrs, LogRecord};
pub use template::{Template, TemplateError};
pub use writer::{ConsoleWriter, IoWriter, MemoryWriter, StderrWriter, StdoutWriter};
