use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Destination for rendered log lines.
///
/// A writer accepts text and reports nothing back: console output is
/// best-effort, so implementations swallow I/O errors of their sink.
pub trait ConsoleWriter: Send + Sync {
    /// Emit `msg` exactly as given (it already carries its trailing newline).
    fn print(&self, msg: &str);
}

/// Writes to the process's standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutWriter;

impl ConsoleWriter for StdoutWriter {
    fn print(&self, msg: &str) {
        let _ = io::stdout().lock().write_all(msg.as_bytes());
    }
}

/// Writes to the process's standard error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrWriter;

impl ConsoleWriter for StderrWriter {
    fn print(&self, msg: &str) {
        let _ = io::stderr().lock().write_all(msg.as_bytes());
    }
}

/// Adapts any [`io::Write`] (a file, a socket, a `Vec<u8>`) into a writer.
#[derive(Debug, Default)]
pub struct IoWriter<W> {
    inner: Mutex<W>,
}

impl<W: Write + Send> IoWriter<W> {
    pub fn new(inner: W) -> Self {
        IoWriter {
            inner: Mutex::new(inner),
        }
    }

    /// Give back the wrapped sink.
    pub fn into_inner(self) -> W {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> ConsoleWriter for IoWriter<W> {
    fn print(&self, msg: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = inner.write_all(msg.as_bytes());
    }
}

/// Keeps every printed string in memory.
///
/// Useful as a test double: share it through an `Arc` with the logger and
/// inspect [`MemoryWriter::output`] afterwards.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    output: Mutex<Vec<String>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything printed so far, one entry per call.
    pub fn output(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.output.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConsoleWriter for MemoryWriter {
    fn print(&self, msg: &str) {
        self.lock().push(msg.to_string());
    }
}
