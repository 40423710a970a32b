use crate::env::{env_or, CONSOLE_LOG_LEVEL_ENV};
use crate::error::LoggerError;
use crate::level::LogLevel;
use crate::logger::Logger;
use crate::record::{merge_attrs, Attrs};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Attributes shared by every logger attached to a [`Base`].
///
/// The host mutates them; loggers only take snapshots.
#[derive(Debug, Default)]
pub struct SharedAttrs {
    inner: RwLock<Attrs>,
}

impl SharedAttrs {
    pub fn set(&self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.write().insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.read().get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<serde_json::Value> {
        self.write().remove(key)
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// Copy of the current attributes.
    pub fn snapshot(&self) -> Attrs {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Attrs> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Attrs> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Logging host: owns the shared attributes, fans lifecycle calls out to
/// its loggers and dispatches log calls to all of them.
///
/// Attaching loggers and the lifecycle fan-out take `&self`, so a base
/// shared through an `Arc` (for instance with a
/// [`ConsoleLayer`](crate::layer::ConsoleLayer)) can still be shut down.
pub struct Base {
    attrs: Arc<SharedAttrs>,
    loggers: RwLock<Vec<Box<dyn Logger>>>,
    level: LogLevel,
    is_initialized: AtomicBool,
}

impl Default for Base {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Base")
            .field("attrs", &self.attrs)
            .field("loggers", &self.logger_count())
            .field("level", &self.level)
            .field("is_initialized", &self.is_initialized())
            .finish()
    }
}

impl Base {
    pub fn new() -> Self {
        Base {
            attrs: Arc::new(SharedAttrs::default()),
            loggers: RwLock::new(Vec::new()),
            level: LogLevel::Debug,
            is_initialized: AtomicBool::new(false),
        }
    }

    /// Like [`Base::new`], with the level filter taken from `CONSOLE_LOG_LEVEL`.
    ///
    /// An unparsable value is reported on stderr and the default kept.
    pub fn from_env() -> Self {
        let mut base = Self::new();
        let raw = env_or(CONSOLE_LOG_LEVEL_ENV, "");
        base.level = level_setting(base.level, &raw);
        base
    }

    pub fn set_attr(&self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.attrs.set(key, value);
    }

    pub fn remove_attr(&self, key: &str) -> Option<serde_json::Value> {
        self.attrs.remove(key)
    }

    pub fn clear_attrs(&self) {
        self.attrs.clear();
    }

    /// The shared attribute store handed to every attached logger.
    pub fn attrs(&self) -> Arc<SharedAttrs> {
        Arc::clone(&self.attrs)
    }

    /// Attach `logger`. It is initialized right away if the base already is.
    pub fn add_logger(&self, mut logger: Box<dyn Logger>) -> Result<(), LoggerError> {
        logger.set_base(self.attrs());
        let mut loggers = self.write_loggers();
        if self.is_initialized() && !logger.is_initialized() {
            logger.init_logger()?;
        }
        loggers.push(logger);
        Ok(())
    }

    pub fn logger_count(&self) -> usize {
        self.read_loggers().len()
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized.load(Ordering::Acquire)
    }

    /// Whether every attached logger reports itself initialized.
    pub fn loggers_initialized(&self) -> bool {
        self.read_loggers().iter().all(|l| l.is_initialized())
    }

    /// Initialize every attached logger. Stops at the first failure.
    pub fn init_loggers(&self) -> Result<(), LoggerError> {
        let mut loggers = self.write_loggers();
        self.is_initialized.store(true, Ordering::Release);
        for logger in loggers.iter_mut() {
            logger.init_logger()?;
        }
        Ok(())
    }

    /// Shut down every attached logger. Stops at the first failure.
    pub fn shutdown_loggers(&self) -> Result<(), LoggerError> {
        let mut loggers = self.write_loggers();
        self.is_initialized.store(false, Ordering::Release);
        for logger in loggers.iter_mut() {
            logger.shutdown_logger()?;
        }
        Ok(())
    }

    pub fn set_log_level(&mut self, level: LogLevel) {
        self.level = level;
    }

    pub fn log_level(&self) -> LogLevel {
        self.level
    }

    pub fn log(&self, level: LogLevel, msg: impl fmt::Display) -> Result<(), LoggerError> {
        self.logm(level, None, msg)
    }

    pub fn logm(
        &self,
        level: LogLevel,
        attrs: Option<&Attrs>,
        msg: impl fmt::Display,
    ) -> Result<(), LoggerError> {
        self.logm_at(Utc::now(), level, attrs, msg)
    }

    /// Dispatch a record stamped with `timestamp` to every logger.
    ///
    /// Records below the level filter are dropped. All loggers are tried
    /// and the first error is returned.
    pub fn logm_at(
        &self,
        timestamp: DateTime<Utc>,
        level: LogLevel,
        attrs: Option<&Attrs>,
        msg: impl fmt::Display,
    ) -> Result<(), LoggerError> {
        if level < self.level {
            return Ok(());
        }
        let msg = msg.to_string();
        let mut first_err = None;
        for logger in self.read_loggers().iter() {
            if let Err(e) = logger.logm(timestamp, level, attrs, &msg) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    pub fn debug(&self, msg: impl fmt::Display) -> Result<(), LoggerError> {
        self.log(LogLevel::Debug, msg)
    }

    pub fn info(&self, msg: impl fmt::Display) -> Result<(), LoggerError> {
        self.log(LogLevel::Info, msg)
    }

    pub fn warn(&self, msg: impl fmt::Display) -> Result<(), LoggerError> {
        self.log(LogLevel::Warning, msg)
    }

    pub fn error(&self, msg: impl fmt::Display) -> Result<(), LoggerError> {
        self.log(LogLevel::Error, msg)
    }

    pub fn fatal(&self, msg: impl fmt::Display) -> Result<(), LoggerError> {
        self.log(LogLevel::Fatal, msg)
    }

    /// Handle that adds `attrs` to every call made through it.
    pub fn new_log_adapter(&self, attrs: Attrs) -> LogAdapter<'_> {
        LogAdapter { base: self, attrs }
    }

    fn read_loggers(&self) -> RwLockReadGuard<'_, Vec<Box<dyn Logger>>> {
        self.loggers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_loggers(&self) -> RwLockWriteGuard<'_, Vec<Box<dyn Logger>>> {
        self.loggers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Level filter from a raw `CONSOLE_LOG_LEVEL` value. Empty keeps `default`;
/// an unknown name is reported on stderr and also keeps `default`.
fn level_setting(default: LogLevel, raw: &str) -> LogLevel {
    if raw.trim().is_empty() {
        return default;
    }
    match raw.parse() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("ignoring {CONSOLE_LOG_LEVEL_ENV}: {e}");
            default
        }
    }
}

/// Logging handle carrying its own attributes on top of the base's.
///
/// Precedence on key conflicts: call-site, then adapter, then base.
#[derive(Debug)]
pub struct LogAdapter<'a> {
    base: &'a Base,
    attrs: Attrs,
}

impl LogAdapter<'_> {
    pub fn log(&self, level: LogLevel, msg: impl fmt::Display) -> Result<(), LoggerError> {
        self.logm(level, None, msg)
    }

    pub fn logm(
        &self,
        level: LogLevel,
        attrs: Option<&Attrs>,
        msg: impl fmt::Display,
    ) -> Result<(), LoggerError> {
        let merged = merge_attrs(Some(&self.attrs), attrs);
        self.base.logm(level, Some(&merged), msg)
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingLogger {
        init: bool,
        calls: Arc<AtomicUsize>,
        base: Option<Arc<SharedAttrs>>,
    }

    impl Logger for CountingLogger {
        fn set_base(&mut self, base: Arc<SharedAttrs>) {
            self.base = Some(base);
        }

        fn init_logger(&mut self) -> Result<(), LoggerError> {
            self.init = true;
            Ok(())
        }

        fn is_initialized(&self) -> bool {
            self.init
        }

        fn shutdown_logger(&mut self) -> Result<(), LoggerError> {
            self.init = false;
            Ok(())
        }

        fn logm(
            &self,
            _timestamp: DateTime<Utc>,
            _level: LogLevel,
            _attrs: Option<&Attrs>,
            _msg: &str,
        ) -> Result<(), LoggerError> {
            assert!(self.base.is_some());
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    #[test]
    fn level_filter_drops_lower_levels() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut base = Base::new();
        base.add_logger(Box::new(CountingLogger {
            calls: calls.clone(),
            ..Default::default()
        }))
        .unwrap();
        base.set_log_level(LogLevel::Warning);

        base.debug("no").unwrap();
        base.info("no").unwrap();
        base.warn("yes").unwrap();
        base.fatal("yes").unwrap();

        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn late_logger_is_initialized_on_add() {
        let base = Base::new();
        base.init_loggers().unwrap();
        base.add_logger(Box::new(CountingLogger::default())).unwrap();
        assert!(base.loggers_initialized());

        base.shutdown_loggers().unwrap();
        assert!(!base.loggers_initialized());
        assert!(!base.is_initialized());
    }

    #[test]
    fn lifecycle_through_shared_handle() {
        let base = Arc::new(Base::new());
        base.add_logger(Box::new(CountingLogger::default())).unwrap();
        let other = Arc::clone(&base);

        other.init_loggers().unwrap();
        assert!(base.loggers_initialized());
        other.shutdown_loggers().unwrap();
        assert!(!base.loggers_initialized());
        assert_eq!(base.logger_count(), 1);
    }

    #[test]
    fn level_setting_from_raw_values() {
        assert_eq!(level_setting(LogLevel::Debug, "warn"), LogLevel::Warning);
        assert_eq!(level_setting(LogLevel::Debug, "FATAL"), LogLevel::Fatal);
        assert_eq!(level_setting(LogLevel::Debug, "bogus"), LogLevel::Debug);
        assert_eq!(level_setting(LogLevel::Info, ""), LogLevel::Info);
    }

    #[test]
    fn shared_attrs_roundtrip() {
        let base = Base::new();
        base.set_attr("a", 1);
        base.set_attr("b", "two");
        assert_eq!(base.attrs().get("a"), Some(serde_json::json!(1)));
        assert_eq!(base.remove_attr("a"), Some(serde_json::json!(1)));
        assert_eq!(base.attrs().snapshot().len(), 1);
        base.clear_attrs();
        assert!(base.attrs().snapshot().is_empty());
    }
}
