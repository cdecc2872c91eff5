//! livelog demo
//!
//! Drives simulated HTTP traffic through an activity tracker so the live
//! rendering can be watched in a terminal: a few clients hammer polling
//! endpoints (pooled into one live line per client) while one-off requests
//! get a line each.
//!
//! ## Usage
//!
//! ```bash
//! # Default console output
//! livelog-demo
//!
//! # With a configuration file and a filter override
//! LIVELOG_FILTER='>=info,!>=debug[http/*]' livelog-demo --config livelog.json
//!
//! # More pollers, longer run
//! livelog-demo --pollers 6 --duration 15
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use livelog_core::config::PatternConfig;
use livelog_core::{BackendLayer, HttpActivity, HttpRequestTracker, Log, LogConfig, Logger};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const STATUSES: [u16; 6] = [200, 200, 200, 201, 404, 500];

/// livelog demo - simulated HTTP traffic
#[derive(Parser, Debug)]
#[command(name = "livelog-demo")]
#[command(about = "Render simulated HTTP traffic with pooled live regions")]
struct Args {
    /// JSON configuration file
    #[arg(short, long, env = "LIVELOG_CONFIG")]
    config: Option<PathBuf>,

    /// Number of clients polling `/poll/<client>`
    #[arg(short, long, default_value_t = 3)]
    pollers: usize,

    /// Number of one-off requests spread over the run
    #[arg(short, long, default_value_t = 20)]
    requests: usize,

    /// Length of the run in seconds
    #[arg(short, long, default_value_t = 5)]
    duration: u64,
}

fn load_config(args: &Args) -> Result<LogConfig> {
    let mut config = match &args.config {
        Some(path) => LogConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => LogConfig::default(),
    };
    config.apply_env();

    if config.high_frequency.patterns.is_empty() {
        config.high_frequency.patterns.push(PatternConfig {
            pattern: r"^/poll/(\w+)$".to_string(),
            max_idle_secs: None,
        });
    }
    Ok(config)
}

fn spawn_poller(http: Arc<HttpRequestTracker>, client: usize, until: Instant) -> JoinHandle<()> {
    tokio::spawn(async move {
        let url = format!("/poll/client{}", client);
        while Instant::now() < until {
            let request = http.begin_request("GET", &url);
            sleep(Duration::from_millis(rand::random_range(30..300))).await;
            http.finish_request(request, 200);
            sleep(Duration::from_millis(rand::random_range(100..400))).await;
        }
    })
}

fn spawn_request(http: Arc<HttpRequestTracker>, n: usize, run: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = rand::random_range(0..run.as_millis().max(1) as u64);
        sleep(Duration::from_millis(start)).await;

        let (method, url) = match n % 4 {
            0 => ("POST", format!("/api/items/{}", n)),
            1 => ("DELETE", format!("/api/items/{}", n)),
            2 => ("GET", "/health".to_string()),
            _ => ("GET", format!("/api/items/{}", n)),
        };

        let request = http.begin_request(method, &url);
        sleep(Duration::from_millis(rand::random_range(20..1500))).await;
        let status = STATUSES[rand::random_range(0..STATUSES.len())];
        http.finish_request(request, status);
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    let backend = config.build_backend()?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(BackendLayer::new(backend.clone()).with_filter(env_filter))
        .init();

    let logger = Logger::new(backend);
    let app = logger.service("demo");
    app.info(&format!(
        "{} pollers, {} requests over {}s",
        args.pollers, args.requests, args.duration
    ));

    let http = HttpRequestTracker::http(logger.service("http"))
        .with_skip(|activity: &HttpActivity| activity.url == "/health");
    let descriptors = config
        .apply_patterns(&http)
        .context("Invalid high-frequency pattern")?;
    tracing::info!(patterns = descriptors.len(), "Registered high-frequency patterns");
    let http = Arc::new(http);

    let run = Duration::from_secs(args.duration);
    let until = Instant::now() + run;

    let mut tasks: Vec<JoinHandle<()>> = Vec::new();
    for client in 0..args.pollers {
        tasks.push(spawn_poller(Arc::clone(&http), client, until));
    }
    for n in 0..args.requests {
        tasks.push(spawn_request(Arc::clone(&http), n, run));
    }

    for task in tasks {
        task.await.context("Traffic task panicked")?;
    }

    app.info("traffic finished");
    Ok(())
}
