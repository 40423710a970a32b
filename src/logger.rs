use crate::base::SharedAttrs;
use crate::error::LoggerError;
use crate::level::LogLevel;
use crate::record::Attrs;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Output adapter driven by a [`Base`](crate::base::Base).
///
/// The host only ever talks to loggers through this trait. Implementations
/// receive records that are already timestamped and leveled, with a message
/// that is already formatted.
pub trait Logger: Send + Sync {
    /// Attach the host's shared attribute store, replacing any previous one.
    fn set_base(&mut self, base: Arc<SharedAttrs>);

    fn init_logger(&mut self) -> Result<(), LoggerError>;

    fn is_initialized(&self) -> bool;

    fn shutdown_logger(&mut self) -> Result<(), LoggerError>;

    /// Emit one record.
    ///
    /// **Parameters**
    /// - `timestamp`: when the event happened.
    /// - `level`: severity of the event.
    /// - `attrs`: call-site attributes; they override base attributes with
    ///   the same key.
    /// - `msg`: the pre-formatted message.
    fn logm(
        &self,
        timestamp: DateTime<Utc>,
        level: LogLevel,
        attrs: Option<&Attrs>,
        msg: &str,
    ) -> Result<(), LoggerError>;
}
