//! Logger capability.
//!
//! The plugin never talks to a concrete sink. It is handed a [`Logger`]
//! that supports leveled emission, a settable active level and child
//! loggers carrying extra [`Bindings`]. [`TracingLogger`] is the default
//! implementation and forwards every line to `tracing`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tracing target used by [`TracingLogger`].
pub const TRACING_TARGET: &str = "octofhir_graphql_logger";

/// Shared logger handle.
pub type DynLogger = Arc<dyn Logger>;

/// Log severity, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    /// Lowercase name of the level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Trace,
            1 => Self::Debug,
            2 => Self::Info,
            3 => Self::Warn,
            4 => Self::Error,
            _ => Self::Fatal,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a level name is not recognized.
#[derive(Debug, Error)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

impl From<Level> for tracing::level_filters::LevelFilter {
    fn from(level: Level) -> Self {
        match level {
            Level::Trace => Self::TRACE,
            Level::Debug => Self::DEBUG,
            Level::Info => Self::INFO,
            Level::Warn => Self::WARN,
            Level::Error | Level::Fatal => Self::ERROR,
        }
    }
}

/// Active level that can be changed through a shared reference.
#[derive(Debug)]
pub(crate) struct AtomicLevel(AtomicU8);

impl AtomicLevel {
    pub(crate) fn new(level: Level) -> Self {
        Self(AtomicU8::new(level as u8))
    }

    pub(crate) fn get(&self) -> Level {
        Level::from_u8(self.0.load(Ordering::Relaxed))
    }

    pub(crate) fn set(&self, level: Level) {
        self.0.store(level as u8, Ordering::Relaxed);
    }
}

/// Key/value pairs attached to every line a child logger emits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings(Vec<(String, String)>);

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binding, returning the updated set.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    /// Returns the last value bound under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the parent bindings followed by `other`.
    #[must_use]
    pub fn merged(&self, other: Bindings) -> Self {
        let mut merged = self.clone();
        merged.0.extend(other.0);
        merged
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// Leveled logging sink consumed by the plugin.
///
/// Implementations filter by their own active level: a line below
/// [`Logger::level`] is dropped. Children start with the parent's level
/// and bindings plus their own, and changing a child's level never affects
/// the parent.
pub trait Logger: Send + Sync {
    /// Emits `message` at `level` if the level is enabled.
    fn log(&self, level: Level, message: &str);

    /// Currently active level.
    fn level(&self) -> Level;

    /// Changes the active level for subsequent lines and children.
    fn set_level(&self, level: Level);

    /// Creates a logger that attaches `bindings` to every line.
    fn child(&self, bindings: Bindings) -> DynLogger;

    fn is_enabled(&self, level: Level) -> bool {
        level >= self.level()
    }

    fn trace(&self, message: &str) {
        self.log(Level::Trace, message);
    }

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    fn fatal(&self, message: &str) {
        self.log(Level::Fatal, message);
    }
}

/// Callback run when a root [`TracingLogger`] changes level.
pub type LevelHook = Arc<dyn Fn(Level) + Send + Sync>;

/// Logger that writes through the `tracing` facade.
///
/// The active level is kept here in addition to whatever filter the
/// installed subscriber applies, so raising it to `debug` only has a
/// visible effect when the subscriber lets debug events through. Attach
/// an [`on_set_level`](Self::on_set_level) hook to move the subscriber's
/// filter along with it:
///
/// ```ignore
/// let (filter, handle) = reload::Layer::new(LevelFilter::INFO);
/// tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
///
/// let logger = TracingLogger::default().on_set_level(move |level| {
///     let _ = handle.modify(|filter| *filter = level.into());
/// });
/// ```
pub struct TracingLogger {
    level: AtomicLevel,
    bindings: Bindings,
    on_set_level: Option<LevelHook>,
}

impl fmt::Debug for TracingLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracingLogger")
            .field("level", &self.level)
            .field("bindings", &self.bindings)
            .field("on_set_level", &self.on_set_level.is_some())
            .finish()
    }
}

impl TracingLogger {
    pub fn new(level: Level) -> Self {
        Self {
            level: AtomicLevel::new(level),
            bindings: Bindings::new(),
            on_set_level: None,
        }
    }

    /// Runs `hook` with the new level whenever [`Logger::set_level`] is
    /// called on this logger. Children are created without the hook, so
    /// their level changes stay local.
    #[must_use]
    pub fn on_set_level(mut self, hook: impl Fn(Level) + Send + Sync + 'static) -> Self {
        self.on_set_level = Some(Arc::new(hook));
        self
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new(Level::Info)
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: &str) {
        if !self.is_enabled(level) {
            return;
        }

        let bindings = &self.bindings;
        match level {
            Level::Trace => tracing::trace!(target: TRACING_TARGET, %bindings, "{message}"),
            Level::Debug => tracing::debug!(target: TRACING_TARGET, %bindings, "{message}"),
            Level::Info => tracing::info!(target: TRACING_TARGET, %bindings, "{message}"),
            Level::Warn => tracing::warn!(target: TRACING_TARGET, %bindings, "{message}"),
            Level::Error => tracing::error!(target: TRACING_TARGET, %bindings, "{message}"),
            Level::Fatal => {
                tracing::error!(target: TRACING_TARGET, %bindings, fatal = true, "{message}")
            }
        }
    }

    fn level(&self) -> Level {
        self.level.get()
    }

    fn set_level(&self, level: Level) {
        self.level.set(level);
        if let Some(hook) = &self.on_set_level {
            hook(level);
        }
    }

    fn child(&self, bindings: Bindings) -> DynLogger {
        Arc::new(Self {
            level: AtomicLevel::new(self.level()),
            bindings: self.bindings.merged(bindings),
            on_set_level: None,
        })
    }
}
