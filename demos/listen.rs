//! Listen to the configured feed and print every lifecycle event.
//!
//! Demonstrates:
//! - Building an orchestrator with the default resolver and engine
//! - Mapping events to a status line and notifications
//! - Graceful stop on Ctrl+C
//!
//! Usage:
//!   cargo run --example listen
//!   cargo run --example listen -- --debug
//!   cargo run --example listen -- --config https://example.com/config.json

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use listener_service::observer::presentation;
use listener_service::{
    DEFAULT_CONFIG_URL, LifecycleEvent, Notice, Observer, Result, SessionOrchestrator,
};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone)]
struct Args {
    debug: bool,
    config_url: String,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let config_url = args
            .iter()
            .position(|a| a == "--config")
            .and_then(|i| args.get(i + 1))
            .cloned()
            .unwrap_or_else(|| DEFAULT_CONFIG_URL.to_string());

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            config_url,
        }
    }
}

/// Prints a status line per event and a notice when one is due.
struct ConsoleObserver;

impl Observer for ConsoleObserver {
    fn on_event(&self, event: LifecycleEvent) {
        println!("[status] {}", presentation(event.kind()).status);

        if let Some(notice) = Notice::for_event(&event) {
            let marker = if notice.interruptive { "!" } else { "-" };
            println!("  {marker} {}: {}", notice.title, notice.body);
        }
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== Listener ===\n");
    println!("Config: {}\n", args.config_url);

    let observer = Arc::new(ConsoleObserver);
    let orchestrator = SessionOrchestrator::builder()
        .config_url(args.config_url)
        .observer(&observer)
        .build()?;

    let outcome = orchestrator.start();
    println!("Session: {}", outcome.session_id());
    println!("Press Ctrl+C to exit...\n");

    tokio::signal::ctrl_c().await?;

    orchestrator.stop().await;
    println!("\nDone.");

    Ok(())
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "listener_service=debug"
    } else {
        "listener_service=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}
