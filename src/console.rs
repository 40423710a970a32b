use crate::base::SharedAttrs;
use crate::config::ConsoleLoggerConfig;
use crate::error::LoggerError;
use crate::level::LogLevel;
use crate::logger::Logger;
use crate::record::{merge_attrs, Attrs, LogRecord};
use crate::template::Template;
use crate::writer::{ConsoleWriter, StdoutWriter};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Logger that renders each record through a [`Template`] and prints the
/// result, followed by a newline, to the writer of the record's level.
pub struct ConsoleLogger {
    base: Option<Arc<SharedAttrs>>,
    writers: HashMap<LogLevel, Arc<dyn ConsoleWriter>>,
    tpl: Template,
    is_initialized: bool,
    config: ConsoleLoggerConfig,
}

impl ConsoleLogger {
    /// Create a logger. `None` uses [`ConsoleLoggerConfig::default`].
    ///
    /// The logger starts uninitialized, with the default template
    /// `[{{color}}{{ucase .LevelName}}{{reset}}] {{.Message}}`.
    pub fn new(config: Option<ConsoleLoggerConfig>) -> Self {
        let config = config.unwrap_or_default();
        let writers = populate_writers(&config);
        ConsoleLogger {
            base: None,
            writers,
            tpl: Template::default(),
            is_initialized: false,
            config,
        }
    }

    /// Replace the active template. `None` is rejected and the current
    /// template stays in place.
    pub fn set_template(&mut self, tpl: Option<Template>) -> Result<(), LoggerError> {
        let tpl = tpl.ok_or(LoggerError::InvalidTemplate)?;
        self.tpl = tpl;
        Ok(())
    }

    pub fn template(&self) -> &Template {
        &self.tpl
    }

    /// Send every level to `writer`.
    pub fn set_writer(&mut self, writer: Arc<dyn ConsoleWriter>) {
        for level in LogLevel::ALL {
            self.writers.insert(level, Arc::clone(&writer));
        }
    }

    pub fn config(&self) -> &ConsoleLoggerConfig {
        &self.config
    }
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new(None)
    }
}

impl fmt::Debug for ConsoleLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleLogger")
            .field("template", &self.tpl.source())
            .field("is_initialized", &self.is_initialized)
            .field("has_base", &self.base.is_some())
            .field("config", &self.config)
            .finish()
    }
}

fn populate_writers(config: &ConsoleLoggerConfig) -> HashMap<LogLevel, Arc<dyn ConsoleWriter>> {
    let stdout: Arc<dyn ConsoleWriter> = Arc::new(StdoutWriter);
    LogLevel::ALL
        .into_iter()
        .filter_map(|level| {
            let writer = match config.writers.get(&level) {
                Some(writer) => Arc::clone(writer),
                None if config.stdout_fallback => Arc::clone(&stdout),
                None => return None,
            };
            Some((level, writer))
        })
        .collect()
}

impl Logger for ConsoleLogger {
    fn set_base(&mut self, base: Arc<SharedAttrs>) {
        self.base = Some(base);
    }

    fn init_logger(&mut self) -> Result<(), LoggerError> {
        self.is_initialized = true;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    fn shutdown_logger(&mut self) -> Result<(), LoggerError> {
        self.is_initialized = false;
        Ok(())
    }

    fn logm(
        &self,
        timestamp: DateTime<Utc>,
        level: LogLevel,
        attrs: Option<&Attrs>,
        msg: &str,
    ) -> Result<(), LoggerError> {
        let base_attrs = self.base.as_ref().map(|base| base.snapshot());
        let merged = merge_attrs(base_attrs.as_ref(), attrs);

        let record = LogRecord::new(timestamp, level, merged, msg);
        let out = self.tpl.execute(&record, self.config.colorize)?;

        let writer = self
            .writers
            .get(&level)
            .ok_or(LoggerError::UnsupportedLevel(level))?;
        writer.print(&format!("{out}\n"));

        Ok(())
    }
}
