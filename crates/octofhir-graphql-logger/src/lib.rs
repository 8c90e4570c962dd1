//! # octofhir-graphql-logger
//!
//! Request-lifecycle logging for the OctoFHIR GraphQL layer.
//!
//! The plugin observes the lifecycle of the GraphQL server and of every
//! operation it executes, and writes one log line per phase:
//!
//! - Server start and stop, with the path GraphQL is served on
//! - Request start, parsing, validation and execution (debug)
//! - Operation start with redacted variables, and completion with elapsed time (info)
//! - Every error the engine reports (error, with the raw error at debug)
//!
//! All lines of one request carry the same correlation id (`request_id`),
//! so the start and completion of an operation can be matched on a busy
//! server.
//!
//! ## Debug output
//!
//! Setting `DEBUG=graphql:*` before the server starts raises the logger to
//! `debug` for the rest of the process.
//!
//! ## Modules
//!
//! - [`config`] - Configuration options
//! - [`plugin`] - Server and request hooks
//! - [`extension`] - async-graphql extension driving the hooks
//! - [`logger`] - Logger capability and the `tracing` backed default
//! - [`memory`] - In-memory logger
//! - [`id`] - Correlation id generation
//! - [`redact`] - Variable redaction
//! - [`operation`] - Operation payloads
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod extension;
pub mod id;
pub mod logger;
pub mod memory;
pub mod operation;
pub mod plugin;
pub mod redact;

// Re-export main types
pub use config::RequestLoggerConfig;
pub use error::{ConfigError, RequestError};
pub use extension::RequestLogger;
pub use id::{HexIdGenerator, IdGenerator};
pub use logger::{Bindings, DynLogger, Level, LevelHook, Logger, TracingLogger};
pub use memory::{LogRecord, MemoryLogger};
pub use operation::{OperationDescriptor, OperationKind};
pub use plugin::{
    REQUEST_ID_KEY, RequestHooks, RequestLoggerPlugin, RequestLoggerPluginBuilder, ServerHooks,
};
pub use redact::{REDACTED, Variables, redact};

/// Result type for plugin construction.
pub type Result<T> = std::result::Result<T, ConfigError>;
