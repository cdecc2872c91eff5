//! Edge case and end-to-end tests
//!
//! These tests drive the public API through real backends: a console on an
//! in-memory terminal, JSONL files in a temporary directory, and the tracing
//! bridge.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Screen, TestBackend};
use livelog_core::backend::file::strip_ansi;
use livelog_core::backend::JsonLogEntry;
use livelog_core::{
    evaluate, BackendLayer, ConsoleBackend, FilterBackend, HttpRequestTracker, Level, Log,
    LogConfig, Logger, Predicate, Terminal,
};
use tempfile::TempDir;
use tracing_subscriber::prelude::*;

fn console() -> (Arc<ConsoleBackend>, Terminal, Screen) {
    let screen = Screen::default();
    let terminal = Terminal::new(screen.clone());
    let console = Arc::new(ConsoleBackend::new(terminal.clone()).with_colors(false));
    (console, terminal, screen)
}

fn rules(rules: &[&str]) -> Vec<Predicate> {
    rules.iter().map(|r| Predicate::parse(r).unwrap()).collect()
}

// ============================================================================
// Filter Scenarios
// ============================================================================

/// `[api/*]` matches nested api keys and nothing else
#[test]
fn test_namespace_glob_scenario() {
    let list = rules(&["[api/*]"]);

    assert!(evaluate(&list, Some("api/users"), Level::Debug, true));
    assert!(evaluate(&list, Some("api/orders/5"), Level::Fatal, true));
    assert!(!evaluate(&list, Some("web/home"), Level::Info, true));
    assert!(!evaluate(&list, None, Level::Info, true));
}

/// Rule order changes the outcome of the toggle chain
#[test]
fn test_rule_order_matters() {
    let exclude_then_include = rules(&["!>=debug[db]", ">=error"]);
    let include_then_exclude = rules(&[">=error", "!>=debug[db]"]);

    assert!(evaluate(&exclude_then_include, Some("db"), Level::Error, true));
    assert!(!evaluate(&include_then_exclude, Some("db"), Level::Error, true));
}

/// Malformed rules are rejected as syntax errors
#[test]
fn test_malformed_rules() {
    for text in ["", "   ", ">=loud", "[unterminated", ">=warn[a b]", "warn extra"] {
        let err = Predicate::parse(text).unwrap_err();
        assert!(err.is_syntax(), "{text:?} should be a syntax error");
    }
}

// ============================================================================
// Console Rendering
// ============================================================================

/// Overlapping polls occupy a single live line that shows the latest state
#[tokio::test(start_paused = true)]
async fn test_polls_render_as_one_live_line() {
    let (console, terminal, screen) = console();
    let http = HttpRequestTracker::http(Logger::with_prefix(console, "http"));
    http.register_pattern(r"^/poll/(\w+)$", None, Some(Duration::from_secs(5)))
        .unwrap();

    let first = http.begin_request("GET", "/poll/abc");
    let second = http.begin_request("GET", "/poll/abc");
    http.finish_request(first, 200);

    let live: Vec<_> = terminal.live_lines().iter().map(|l| strip_ansi(l)).collect();
    assert_eq!(live, vec!["info  [http] GET /poll/abc 200 0µs"]);

    http.finish_request(second, 200);
    tokio::time::sleep(Duration::from_secs(6)).await;

    assert_eq!(terminal.region_count(), 0);
    assert!(screen.text().ends_with("info  [http] GET /poll/abc 200 0µs\n"));
}

/// An unpooled request is committed to the output when it ends
#[tokio::test(start_paused = true)]
async fn test_adhoc_request_committed_on_end() {
    let (console, terminal, screen) = console();
    let http = HttpRequestTracker::http(Logger::new(console));

    let request = http.begin_request("delete", "/users/7");
    assert_eq!(terminal.region_count(), 1);
    http.finish_request(request, 404);

    assert_eq!(terminal.region_count(), 0);
    assert!(screen.text().ends_with("info  DELETE /users/7 404 0µs\n"));
}

/// Plain lines print above the live block
#[test]
fn test_plain_lines_print_above_live_block() {
    let (console, terminal, _) = console();
    let logger = Logger::new(console);

    let live = logger.live();
    live.info("working...");
    logger.warn("side note");

    assert_eq!(terminal.live_lines(), vec!["info  working..."]);
    live.close();
    assert!(terminal.live_lines().is_empty());
}

// ============================================================================
// Live Session Edge Cases
// ============================================================================

/// Closing with open scopes hands output back to plain writes
#[test]
fn test_close_with_open_scopes() {
    let backend = TestBackend::new();
    let live = Logger::new(backend.clone()).live();

    live.begin();
    live.info("inside");
    live.close();
    live.end();
    live.info("after close");

    let written = backend.written.lock();
    assert_eq!(written[0].region, Some(0));
    assert_eq!(written[1].region, None);
    assert_eq!(backend.region(0).closes(), 1);
    assert_eq!(backend.ends(), 1);
}

/// A filter in front of a live backend still routes kept writes live
#[test]
fn test_filter_preserves_live_routing() {
    let backend = TestBackend::new();
    let filter = Arc::new(FilterBackend::new(backend.clone(), rules(&[">=warn"])));
    let live = Logger::new(filter).live();

    live.update(|| {
        live.info("dropped");
        live.error("kept");
    });

    assert_eq!(backend.messages(), vec!["kept"]);
    assert_eq!(backend.region(0).lines(), vec!["kept"]);
}

// ============================================================================
// Configuration and Files
// ============================================================================

/// A file-only configuration writes filtered JSONL with escapes stripped
#[test]
fn test_config_file_backend() {
    let temp = TempDir::new().unwrap();
    let pattern = temp.path().join("logs/app-{YYYY}-{MM}.jsonl");
    let json = serde_json::json!({
        "filters": [">=info", "!>=debug[noise]", ">=error"],
        "console": { "enabled": false },
        "file": { "path_pattern": pattern.to_string_lossy() }
    });
    let config = LogConfig::from_json_str(&json.to_string()).unwrap();
    let logger = Logger::new(config.build_backend().unwrap());

    logger.service("app").info("\x1b[32mstarted\x1b[0m");
    logger.service("app").debug("hidden");
    logger.service("noise").warn("muted");
    logger.service("noise").error("loud");

    let dir = temp.path().join("logs");
    let files: Vec<_> = std::fs::read_dir(&dir).unwrap().collect();
    assert_eq!(files.len(), 1);

    let content = std::fs::read_to_string(files[0].as_ref().unwrap().path()).unwrap();
    let entries: Vec<_> = content
        .lines()
        .map(|line| JsonLogEntry::from_json_line(line).unwrap())
        .collect();

    let messages: Vec<_> = entries.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["started", "loud"]);
    assert_eq!(entries[0].key.as_deref(), Some("app"));
    assert_eq!(entries[1].level, Level::Error);
}

/// The tracing bridge writes through the same filtered destinations
#[test]
fn test_tracing_events_reach_backend() {
    let backend = TestBackend::new();
    let filter = Arc::new(FilterBackend::new(backend.clone(), rules(&[">=info"])));
    let subscriber = tracing_subscriber::registry().with(BackendLayer::new(filter));

    tracing::subscriber::with_default(subscriber, || {
        tracing::debug!(target: "svc::db", "skipped");
        tracing::info!(target: "svc::db", rows = 3, "query done");
    });

    let written = backend.written.lock();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].key.as_deref(), Some("svc/db"));
    assert_eq!(written[0].data, Some(serde_json::json!({ "rows": 3 })));
}
