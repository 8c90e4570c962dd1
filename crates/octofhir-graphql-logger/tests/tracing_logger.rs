//! Tests for the `tracing` backed default logger.

use std::io;
use std::sync::{Arc, Mutex};

use octofhir_graphql_logger::{Bindings, Level, Logger, RequestLoggerPlugin, TracingLogger};

/// Writer collecting formatted output in memory.
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn output(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture<F: FnOnce()>(f: F) -> String {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, f);
    capture.output()
}

#[test]
fn test_lines_below_level_are_dropped() {
    let output = capture(|| {
        let logger = TracingLogger::default();
        logger.debug("hidden line");
        logger.info("visible line");
    });

    assert!(!output.contains("hidden line"));
    assert!(output.contains("INFO"));
    assert!(output.contains("visible line"));
}

#[test]
fn test_child_bindings_are_emitted() {
    let output = capture(|| {
        let logger = TracingLogger::new(Level::Debug);
        let child = logger.child(Bindings::new().with("request_id", "abc123"));
        child.debug("Parsing source...");
    });

    assert!(output.contains("DEBUG"));
    assert!(output.contains("bindings=request_id=abc123"));
    assert!(output.contains("Parsing source..."));
    assert!(output.contains("octofhir_graphql_logger"));
}

#[test]
fn test_fatal_is_flagged() {
    let output = capture(|| {
        TracingLogger::default().fatal("giving up");
    });

    assert!(output.contains("ERROR"));
    assert!(output.contains("fatal=true"));
}

#[tokio::test]
async fn test_default_plugin_logger() {
    let plugin = RequestLoggerPlugin::builder().build().unwrap();
    let _server = plugin.server_will_start_with(Some("graphql:server"));
    let hooks = plugin.request_did_start().await;

    assert_eq!(plugin.logger().level(), Level::Debug);
    assert_eq!(hooks.logger().level(), Level::Debug);
    assert_eq!(hooks.request_id().len(), 10);

    let output = capture(|| {
        let parsing_did_end = hooks.parsing_did_start();
        parsing_did_end(None);
    });
    assert!(output.contains(&format!("request_id={}", hooks.request_id())));
    assert!(output.contains("Parsing complete"));
}

#[test]
fn test_debug_switch_raises_subscriber_filter() {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, reload};

    let capture = Capture::default();
    let writer = capture.clone();
    let (filter, handle) = reload::Layer::new(LevelFilter::INFO);
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(move || writer.clone()));

    let logger = TracingLogger::default().on_set_level(move |level| {
        let _ = handle.modify(|filter| *filter = level.into());
    });
    let plugin = RequestLoggerPlugin::builder()
        .logger(Arc::new(logger))
        .build()
        .unwrap();

    tracing::subscriber::with_default(subscriber, || {
        let _server = plugin.server_will_start_with(Some("graphql:*"));
        let hooks = tokio_test::block_on(plugin.request_did_start());
        let parsing_did_end = hooks.parsing_did_start();
        parsing_did_end(None);
    });

    let output = capture.output();
    assert!(output.contains("Starting GraphQL on \"/graphql\"..."));
    assert!(output.contains("Starting GraphQL request..."));
    assert!(output.contains("Parsing complete"));
}
