//! In-memory logger.
//!
//! Keeps every emitted line in a buffer shared by the root logger and all of
//! its children, so the lines of a request can be inspected after the fact.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::logger::{AtomicLevel, Bindings, DynLogger, Level, Logger};

/// One emitted log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    pub bindings: Bindings,
}

impl LogRecord {
    /// Value bound under `key` on the emitting logger.
    pub fn binding(&self, key: &str) -> Option<&str> {
        self.bindings.get(key)
    }
}

/// Logger that records lines instead of writing them out.
#[derive(Debug)]
pub struct MemoryLogger {
    level: AtomicLevel,
    bindings: Bindings,
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemoryLogger {
    pub fn new(level: Level) -> Self {
        Self {
            level: AtomicLevel::new(level),
            bindings: Bindings::new(),
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of every recorded line, in emission order.
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    /// Messages recorded at exactly `level`.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|r| r.level == level)
            .map(|r| r.message.clone())
            .collect()
    }

    /// Whether a line with `level` and `message` was recorded.
    pub fn contains(&self, level: Level, message: &str) -> bool {
        self.lock()
            .iter()
            .any(|r| r.level == level && r.message == message)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Default for MemoryLogger {
    fn default() -> Self {
        Self::new(Level::Info)
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: Level, message: &str) {
        if !self.is_enabled(level) {
            return;
        }
        self.lock().push(LogRecord {
            level,
            message: message.to_string(),
            bindings: self.bindings.clone(),
        });
    }

    fn level(&self) -> Level {
        self.level.get()
    }

    fn set_level(&self, level: Level) {
        self.level.set(level);
    }

    fn child(&self, bindings: Bindings) -> DynLogger {
        Arc::new(Self {
            level: AtomicLevel::new(self.level()),
            bindings: self.bindings.merged(bindings),
            records: Arc::clone(&self.records),
        })
    }
}
