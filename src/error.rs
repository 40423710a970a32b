use crate::level::LogLevel;
use crate::template::TemplateError;

/// Error type returned by [`Logger`](crate::logger::Logger) operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoggerError {
    #[error("a template must be provided")]
    InvalidTemplate,

    #[error(transparent)]
    Render(#[from] TemplateError),

    #[error("unsupported log level: {0}")]
    UnsupportedLevel(LogLevel),
}
