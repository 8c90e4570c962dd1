//! Integration tests running real async-graphql requests through the
//! request logger extension.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_graphql::{EmptySubscription, Object, Request, Schema, Variables};
use octofhir_graphql_logger::{
    Level, MemoryLogger, REQUEST_ID_KEY, RequestLogger, RequestLoggerPlugin,
};
use serde_json::json;

// =============================================================================
// Test schema
// =============================================================================

struct Query;

#[Object]
impl Query {
    async fn hello(&self, name: Option<String>) -> String {
        format!("Hello, {}!", name.as_deref().unwrap_or("world"))
    }

    async fn fail(&self) -> async_graphql::Result<String> {
        Err("Something went wrong".into())
    }
}

struct Mutation;

#[Object]
impl Mutation {
    async fn login(&self, username: String, password: String) -> bool {
        !username.is_empty() && !password.is_empty()
    }
}

type TestSchema = Schema<Query, Mutation, EmptySubscription>;

fn schema(logger: &Arc<MemoryLogger>) -> TestSchema {
    let counter = AtomicUsize::new(0);
    let plugin = RequestLoggerPlugin::builder()
        .logger(logger.clone())
        .id_generator(move || format!("req-{}", counter.fetch_add(1, Ordering::SeqCst)))
        .build()
        .unwrap();

    Schema::build(Query, Mutation, EmptySubscription)
        .extension(RequestLogger::from(plugin))
        .finish()
}

fn messages(logger: &MemoryLogger) -> Vec<String> {
    logger.records().into_iter().map(|r| r.message).collect()
}

// =============================================================================
// Happy path
// =============================================================================

#[tokio::test]
async fn test_query_lifecycle() {
    let logger = Arc::new(MemoryLogger::new(Level::Debug));
    let schema = schema(&logger);

    let request = Request::new("query TestQuery($foo: String) { hello(name: $foo) }")
        .operation_name("TestQuery")
        .variables(Variables::from_json(json!({ "foo": "bar" })));
    let response = schema.execute(request).await;
    assert!(response.errors.is_empty());

    let lines = messages(&logger);
    let expected_prefix = [
        "Starting GraphQL request...",
        "Parsing source...",
        "Parsing complete",
        "Validating GraphQL document...",
        "Validation complete. Document cached.",
        "Started query TestQuery",
        r#"Parameters: {"foo":"bar"}"#,
        "Executing query TestQuery...",
    ];
    assert_eq!(&lines[..expected_prefix.len()], &expected_prefix[..]);
    assert_eq!(lines.len(), expected_prefix.len() + 1);
    assert!(lines[expected_prefix.len()].starts_with("Completed query TestQuery in "));
}

#[tokio::test]
async fn test_info_level_lifecycle() {
    let logger = Arc::new(MemoryLogger::default());
    let schema = schema(&logger);

    schema.execute("{ hello }").await;

    let lines = messages(&logger);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Started query ");
    assert_eq!(lines[1], "Parameters: {}");
    assert!(lines[2].starts_with("Completed query  in "));
}

#[tokio::test]
async fn test_source_is_traced() {
    let logger = Arc::new(MemoryLogger::new(Level::Trace));
    let schema = schema(&logger);

    schema.execute("{ hello }").await;

    assert!(logger.contains(Level::Trace, "Source:\n{ hello }"));
}

#[tokio::test]
async fn test_mutation_variables_are_redacted() {
    let logger = Arc::new(MemoryLogger::default());
    let schema = schema(&logger);

    let request = Request::new(
        "mutation Login($username: String!, $password: String!) { login(username: $username, password: $password) }",
    )
    .variables(Variables::from_json(
        json!({ "username": "alice", "password": "hunter2" }),
    ));
    let response = schema.execute(request).await;
    assert!(response.errors.is_empty());

    assert!(logger.contains(Level::Info, "Started mutation Login"));
    let params = &logger.messages(Level::Info)[1];
    assert!(params.contains(r#""username":"alice""#));
    assert!(params.contains(r#""password":"[REDACTED]""#));
    assert!(!params.contains("hunter2"));
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_parse_failure() {
    let logger = Arc::new(MemoryLogger::new(Level::Debug));
    let schema = schema(&logger);

    let response = schema.execute("{ hello").await;
    assert!(!response.errors.is_empty());

    let errors = logger.messages(Level::Error);
    assert_eq!(errors[0], "Failed to parse source");
    assert!(errors[1].starts_with("SyntaxError: "));
    assert!(errors[2].starts_with("GraphQLError: "));
    assert!(!logger.contains(Level::Debug, "Validating GraphQL document..."));

    let info = logger.messages(Level::Info);
    assert_eq!(info.len(), 1);
    assert!(info[0].starts_with("Completed operation  in "));
}

#[tokio::test]
async fn test_validation_failure() {
    let logger = Arc::new(MemoryLogger::new(Level::Debug));
    let schema = schema(&logger);

    let response = schema.execute("{ missing }").await;
    assert!(!response.errors.is_empty());

    let errors = logger.messages(Level::Error);
    assert_eq!(errors[0], "Failed to validate GraphQL document");
    assert!(errors[1].starts_with("ValidationError: "));
    assert!(errors[1].contains("missing"));
    assert!(!logger.contains(Level::Info, "Started query "));
}

#[tokio::test]
async fn test_resolver_error() {
    let logger = Arc::new(MemoryLogger::default());
    let schema = schema(&logger);

    let response = schema.execute("query Broken { fail }").await;
    assert_eq!(response.errors.len(), 1);

    assert_eq!(
        logger.messages(Level::Error),
        vec!["GraphQLError: Something went wrong".to_string()]
    );
    let info = logger.messages(Level::Info);
    assert!(info.last().unwrap().starts_with("Completed query Broken in "));
}

#[tokio::test]
async fn test_unknown_operation_name_is_not_started() {
    let logger = Arc::new(MemoryLogger::new(Level::Debug));
    let schema = schema(&logger);

    let request = Request::new("query A { hello } query B { hello }").operation_name("C");
    let response = schema.execute(request).await;
    assert_eq!(response.errors.len(), 1);

    assert!(logger.contains(Level::Debug, "Validation complete. Document cached."));
    let lines = messages(&logger);
    assert!(!lines.iter().any(|line| line.starts_with("Started")));
    assert!(!lines.iter().any(|line| line.starts_with("Parameters")));
    assert!(!lines.iter().any(|line| line.starts_with("Executing")));

    let errors = logger.messages(Level::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("GraphQLError: "));
    assert!(errors[0].contains("C"));

    let info = logger.messages(Level::Info);
    assert_eq!(info.len(), 1);
    assert!(info[0].starts_with("Completed operation C in "));
}

// =============================================================================
// Correlation
// =============================================================================

#[tokio::test]
async fn test_each_request_has_its_own_id() {
    let logger = Arc::new(MemoryLogger::default());
    let schema = schema(&logger);

    let (a, b) = tokio::join!(
        schema.execute("query A { hello }"),
        schema.execute("query B { hello }"),
    );
    assert!(a.errors.is_empty());
    assert!(b.errors.is_empty());

    let records = logger.records();
    assert_eq!(records.len(), 6);

    let id_of = |name: &str| {
        records
            .iter()
            .find(|r| r.message == format!("Started query {name}"))
            .and_then(|r| r.binding(REQUEST_ID_KEY))
            .map(str::to_string)
            .unwrap()
    };
    let id_a = id_of("A");
    let id_b = id_of("B");
    assert_ne!(id_a, id_b);

    for record in &records {
        let id = record.binding(REQUEST_ID_KEY).unwrap();
        if record.message.contains("query A") {
            assert_eq!(id, id_a);
        }
        if record.message.contains("query B") {
            assert_eq!(id, id_b);
        }
    }
}
