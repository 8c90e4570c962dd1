//! Request logger plugin.
//!
//! [`RequestLoggerPlugin`] exposes the two hook families a GraphQL engine
//! drives: server hooks (start/stop, once per process) and request hooks
//! (once per operation). Each request gets its own correlation id and a
//! child logger bound to it; that state lives in the returned
//! [`RequestHooks`] and is never shared between requests.
//!
//! # Example
//!
//! ```ignore
//! use octofhir_graphql_logger::{RequestLoggerConfig, RequestLoggerPlugin};
//!
//! let plugin = RequestLoggerPlugin::builder()
//!     .config(RequestLoggerConfig::default())
//!     .logger(logger.clone())
//!     .build()?;
//!
//! let server = plugin.server_will_start();
//! let hooks = plugin.request_did_start().await;
//! hooks.did_resolve_operation(&operation);
//! hooks.will_send_response(&operation);
//! server.server_will_stop();
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use regex::Regex;
use serde_json::Value;

use crate::config::RequestLoggerConfig;
use crate::error::{ConfigError, RequestError};
use crate::id::{HexIdGenerator, IdGenerator};
use crate::logger::{Bindings, DynLogger, Level, Logger, TracingLogger};
use crate::operation::OperationDescriptor;
use crate::redact::redact;

/// Binding key carrying the correlation id on request log lines.
pub const REQUEST_ID_KEY: &str = "request_id";

/// Factory for server and request hooks.
pub struct RequestLoggerPlugin {
    config: Arc<RequestLoggerConfig>,
    logger: DynLogger,
    id_generator: Arc<dyn IdGenerator>,
    debug_pattern: Regex,
}

impl std::fmt::Debug for RequestLoggerPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestLoggerPlugin")
            .field("config", &self.config)
            .field("level", &self.logger.level())
            .finish_non_exhaustive()
    }
}

impl RequestLoggerPlugin {
    /// Creates a plugin with the given configuration, a fresh
    /// [`TracingLogger`] and a [`HexIdGenerator`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: RequestLoggerConfig) -> crate::Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> RequestLoggerPluginBuilder {
        RequestLoggerPluginBuilder::default()
    }

    pub fn config(&self) -> &RequestLoggerConfig {
        &self.config
    }

    /// The parent logger every request logger is derived from.
    pub fn logger(&self) -> &DynLogger {
        &self.logger
    }

    /// Server start hook.
    ///
    /// Reads the configured debug variable from the environment once and
    /// hands it to [`Self::server_will_start_with`].
    pub fn server_will_start(&self) -> ServerHooks {
        let debug_flag = std::env::var(&self.config.debug_env).ok();
        self.server_will_start_with(debug_flag.as_deref())
    }

    /// Server start hook with an explicit debug flag value.
    ///
    /// When the flag matches the debug selector the parent logger is raised
    /// to `debug`, which every request logger created afterwards inherits.
    /// With a [`TracingLogger`] the installed subscriber must also let debug
    /// events through; see [`TracingLogger::on_set_level`].
    pub fn server_will_start_with(&self, debug_flag: Option<&str>) -> ServerHooks {
        self.logger
            .info(&format!("Starting GraphQL on \"{}\"...", self.config.path));

        if debug_flag.is_some_and(|flag| self.debug_pattern.is_match(flag)) {
            self.logger.set_level(Level::Debug);
        }

        ServerHooks {
            logger: Arc::clone(&self.logger),
            path: self.config.path.clone(),
        }
    }

    /// Request start hook.
    ///
    /// Generates the correlation id, derives the request logger and starts
    /// the clock before anything is logged for the request.
    pub async fn request_did_start(&self) -> RequestHooks {
        let request_id = self.id_generator.generate().await;
        let logger = self
            .logger
            .child(Bindings::new().with(REQUEST_ID_KEY, request_id.clone()));
        let started = Instant::now();

        logger.debug("Starting GraphQL request...");

        RequestHooks {
            request_id,
            logger,
            started,
            config: Arc::clone(&self.config),
        }
    }
}

/// Builder for [`RequestLoggerPlugin`].
#[derive(Default)]
pub struct RequestLoggerPluginBuilder {
    config: Option<RequestLoggerConfig>,
    logger: Option<DynLogger>,
    id_generator: Option<Arc<dyn IdGenerator>>,
}

impl RequestLoggerPluginBuilder {
    pub fn config(mut self, config: RequestLoggerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Logger to derive request loggers from. Defaults to a new
    /// [`TracingLogger`] at `info`.
    pub fn logger(mut self, logger: DynLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Correlation id generator. Defaults to a [`HexIdGenerator`] of the
    /// configured length.
    pub fn id_generator(mut self, generator: impl IdGenerator + 'static) -> Self {
        self.id_generator = Some(Arc::new(generator));
        self
    }

    /// Builds the plugin.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation or the debug
    /// selector is not a valid pattern.
    pub fn build(self) -> crate::Result<RequestLoggerPlugin> {
        let config = self.config.unwrap_or_default();
        config.validate().map_err(ConfigError::Invalid)?;
        let debug_pattern = config.debug_pattern()?;

        let logger = self
            .logger
            .unwrap_or_else(|| Arc::new(TracingLogger::default()));
        let id_generator = self
            .id_generator
            .unwrap_or_else(|| Arc::new(HexIdGenerator::new(config.id_length)));

        Ok(RequestLoggerPlugin {
            config: Arc::new(config),
            logger,
            id_generator,
            debug_pattern,
        })
    }
}

/// Handle returned by the server start hook.
#[must_use = "call server_will_stop when the server shuts down"]
pub struct ServerHooks {
    logger: DynLogger,
    path: String,
}

impl ServerHooks {
    /// Server stop hook. Consumes the handle.
    pub fn server_will_stop(self) {
        self.logger
            .info(&format!("Stopping GraphQL on \"{}\"", self.path));
    }
}

/// Per-request hooks.
///
/// Holds the request's correlation id, its bound logger and the start time.
/// Dropped once the response is sent.
pub struct RequestHooks {
    request_id: String,
    logger: DynLogger,
    started: Instant,
    config: Arc<RequestLoggerConfig>,
}

impl RequestHooks {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Logger bound to this request's correlation id.
    pub fn logger(&self) -> &DynLogger {
        &self.logger
    }

    /// Time since the request started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn did_resolve_source(&self, source: &str) {
        if self.logger.is_enabled(Level::Trace) {
            self.logger.trace(&format!("Source:\n{source}"));
        }
    }

    /// Returns the callback to invoke when parsing ends.
    pub fn parsing_did_start(&self) -> impl FnOnce(Option<&RequestError>) + Send + '_ {
        self.logger.debug("Parsing source...");

        move |error: Option<&RequestError>| match error {
            Some(error) => {
                self.logger.error("Failed to parse source");
                self.log_errors([error]);
            }
            None => self.logger.debug("Parsing complete"),
        }
    }

    /// Returns the callback to invoke when validation ends.
    pub fn validation_did_start(&self) -> impl FnOnce(Option<&RequestError>) + Send + '_ {
        self.logger.debug("Validating GraphQL document...");

        move |error: Option<&RequestError>| match error {
            Some(error) => {
                self.logger.error("Failed to validate GraphQL document");
                self.log_errors([error]);
            }
            None => self.logger.debug("Validation complete. Document cached."),
        }
    }

    pub fn did_resolve_operation(&self, operation: &OperationDescriptor) {
        let kind = operation.kind_or("");
        let name = operation.name_or_empty();
        let params = Value::Object(redact(
            self.config.redacted_variables.as_slice(),
            operation.variables.as_ref(),
        ));

        self.logger.info(&format!("Started {kind} {name}"));
        self.logger.info(&format!("Parameters: {params}"));
    }

    pub fn execution_did_start(&self, operation: &OperationDescriptor) {
        let kind = operation.kind_or("operation");
        let name = operation.name_or_empty();

        self.logger.debug(&format!("Executing {kind} {name}..."));
    }

    pub fn did_encounter_errors(&self, errors: &[RequestError]) {
        self.log_errors(errors);
    }

    pub fn will_send_response(&self, operation: &OperationDescriptor) {
        let kind = operation.kind_or("operation");
        let name = operation.name_or_empty();

        if self.config.log_duration {
            let elapsed = self.elapsed().as_millis();
            self.logger
                .info(&format!("Completed {kind} {name} in {elapsed}ms"));
        } else {
            self.logger.info(&format!("Completed {kind} {name}"));
        }
    }

    fn log_errors<'e>(&self, errors: impl IntoIterator<Item = &'e RequestError>) {
        for error in errors {
            self.logger
                .error(&format!("{}: {}", error.name(), error.message()));
            self.logger.debug(&format!("{error:?}"));
        }
    }
}
