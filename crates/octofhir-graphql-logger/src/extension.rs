//! async-graphql integration.
//!
//! [`RequestLogger`] is an [`ExtensionFactory`]: async-graphql creates one
//! extension per request, and that extension drives the request hooks of
//! the wrapped [`RequestLoggerPlugin`] from the engine's own phases.
//!
//! ```ignore
//! let plugin = Arc::new(RequestLoggerPlugin::new(config.logging.clone())?);
//! let server = plugin.server_will_start();
//!
//! let schema = Schema::build(Query, EmptyMutation, EmptySubscription)
//!     .extension(RequestLogger::new(plugin.clone()))
//!     .finish();
//! ```
//!
//! The operation is reported as resolved from the `execute` phase: the
//! engine picks the operation named by the request only after validation,
//! and fails the request before `execute` when no operation matches.
//!
//! Subscriptions run through `execute_stream`, which skips the `request`
//! phase, so they are not logged.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use async_graphql::extensions::{
    Extension, ExtensionContext, ExtensionFactory, NextExecute, NextParseQuery,
    NextPrepareRequest, NextRequest, NextValidation,
};
use async_graphql::parser::types::ExecutableDocument;
use async_graphql::{Request, Response, ServerError, ServerResult, ValidationResult, Variables};
use serde_json::Value;

use crate::error::RequestError;
use crate::operation::OperationDescriptor;
use crate::plugin::{RequestHooks, RequestLoggerPlugin};
use crate::redact;

/// Extension factory logging every request executed by a schema.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    plugin: Arc<RequestLoggerPlugin>,
}

impl RequestLogger {
    pub fn new(plugin: Arc<RequestLoggerPlugin>) -> Self {
        Self { plugin }
    }

    pub fn plugin(&self) -> &Arc<RequestLoggerPlugin> {
        &self.plugin
    }
}

impl From<RequestLoggerPlugin> for RequestLogger {
    fn from(plugin: RequestLoggerPlugin) -> Self {
        Self::new(Arc::new(plugin))
    }
}

impl ExtensionFactory for RequestLogger {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(RequestLoggerExtension {
            plugin: Arc::clone(&self.plugin),
            hooks: OnceLock::new(),
            operation: Mutex::new(OperationDescriptor::default()),
        })
    }
}

/// State of one request as seen by the engine.
struct RequestLoggerExtension {
    plugin: Arc<RequestLoggerPlugin>,
    hooks: OnceLock<RequestHooks>,
    operation: Mutex<OperationDescriptor>,
}

impl RequestLoggerExtension {
    fn lock(&self) -> MutexGuard<'_, OperationDescriptor> {
        self.operation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn operation(&self) -> OperationDescriptor {
        self.lock().clone()
    }

    fn record_request(&self, request: &Request) {
        let mut operation = self.lock();
        operation.name = request.operation_name.clone();
        operation.variables = variables_to_json(&request.variables);
        operation.source = Some(request.query.clone());
    }

    fn record_document(&self, document: &ExecutableDocument) {
        self.lock().resolve(document);
    }
}

fn variables_to_json(variables: &Variables) -> Option<redact::Variables> {
    match serde_json::to_value(variables).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

#[async_trait::async_trait]
impl Extension for RequestLoggerExtension {
    async fn request(&self, ctx: &ExtensionContext<'_>, next: NextRequest<'_>) -> Response {
        let hooks = self.plugin.request_did_start().await;
        let hooks = self.hooks.get_or_init(|| hooks);

        let response = next.run(ctx).await;

        if !response.errors.is_empty() {
            let errors: Vec<RequestError> =
                response.errors.iter().map(RequestError::from).collect();
            hooks.did_encounter_errors(&errors);
        }
        hooks.will_send_response(&self.operation());

        response
    }

    async fn prepare_request(
        &self,
        ctx: &ExtensionContext<'_>,
        request: Request,
        next: NextPrepareRequest<'_>,
    ) -> ServerResult<Request> {
        self.record_request(&request);
        if let Some(hooks) = self.hooks.get() {
            hooks.did_resolve_source(&request.query);
        }
        next.run(ctx, request).await
    }

    async fn parse_query(
        &self,
        ctx: &ExtensionContext<'_>,
        query: &str,
        variables: &Variables,
        next: NextParseQuery<'_>,
    ) -> ServerResult<ExecutableDocument> {
        let Some(hooks) = self.hooks.get() else {
            return next.run(ctx, query, variables).await;
        };

        let end = hooks.parsing_did_start();
        let result = next.run(ctx, query, variables).await;
        match &result {
            Ok(document) => {
                self.record_document(document);
                end(None);
            }
            Err(err) => end(Some(
                &RequestError::parse(err.message.clone()).with_locations(err.locations.clone()),
            )),
        }
        result
    }

    async fn validation(
        &self,
        ctx: &ExtensionContext<'_>,
        next: NextValidation<'_>,
    ) -> Result<ValidationResult, Vec<ServerError>> {
        let Some(hooks) = self.hooks.get() else {
            return next.run(ctx).await;
        };

        let end = hooks.validation_did_start();
        let result = next.run(ctx).await;
        match &result {
            Ok(_) => end(None),
            Err(errors) => {
                let error = errors.first().map_or_else(
                    || RequestError::validation("Validation failed"),
                    |err| {
                        RequestError::validation(err.message.clone())
                            .with_locations(err.locations.clone())
                    },
                );
                end(Some(&error));
            }
        }
        result
    }

    async fn execute(
        &self,
        ctx: &ExtensionContext<'_>,
        operation_name: Option<&str>,
        next: NextExecute<'_>,
    ) -> Response {
        // Only reached once the engine has selected the operation to run.
        if let Some(hooks) = self.hooks.get() {
            let operation = self.operation();
            hooks.did_resolve_operation(&operation);
            hooks.execution_did_start(&operation);
        }
        next.run(ctx, operation_name).await
    }
}
