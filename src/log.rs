//! Logging collaborator for the migration runner
//!
//! The runner takes its log sink at construction instead of reaching for a
//! global logger, so tests can substitute a capturing sink and assert on the
//! exact step transitions that were reported.

use parking_lot::Mutex;

/// A sink accepting leveled text messages.
pub trait MigrationLog: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Default sink forwarding to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl MigrationLog for TracingLog {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// Capturing sink for deterministic tests.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured messages in emission order, regardless of level.
    pub fn messages(&self) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .map(|(_, line)| line.clone())
            .collect()
    }

    /// Captured error-level messages only.
    pub fn errors(&self) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|(level, _)| *level == LogLevel::Error)
            .map(|(_, line)| line.clone())
            .collect()
    }

    /// Whether any captured message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|(_, line)| line.contains(needle))
    }
}

impl MigrationLog for MemoryLog {
    fn info(&self, message: &str) {
        self.lines
            .lock()
            .push((LogLevel::Info, message.to_string()));
    }

    fn error(&self, message: &str) {
        self.lines
            .lock()
            .push((LogLevel::Error, message.to_string()));
    }
}
