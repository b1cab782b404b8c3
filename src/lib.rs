//! Listener service - supervised websocket streaming with lifecycle events.
//!
//! This library resolves a websocket endpoint from a remote JSON document,
//! keeps a streaming connection to it alive, and reports everything that
//! happens to a single host-supplied observer.
//!
//! # Architecture
//!
//! - **Resolver**: fetches the configuration document, picks the endpoint
//! - **Engine**: connects, reads frames, reconnects after failures
//! - **Orchestrator**: owns the session, serializes events to the observer
//!
//! Key design principles:
//!
//! - One session at a time; `start()` while running is a no-op
//! - Engine callbacks carry a session ID, stale ones are dropped
//! - The observer is referenced weakly and never called concurrently
//! - Nothing is delivered after `stop()` returns
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use listener_service::{LifecycleEvent, Notice, Result, SessionOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let observer = Arc::new(|event: LifecycleEvent| {
//!         if let Some(notice) = Notice::for_event(&event) {
//!             println!("{}: {}", notice.title, notice.body);
//!         }
//!     });
//!
//!     let orchestrator = SessionOrchestrator::builder()
//!         .observer(&observer)
//!         .build()?;
//!
//!     orchestrator.start();
//!     tokio::signal::ctrl_c().await?;
//!     orchestrator.stop().await;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Endpoint resolution: [`ConfigResolver`], [`Endpoint`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`event`] | [`LifecycleEvent`] and [`EventKind`] |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`observer`] | [`Observer`] trait and presentation table |
//! | [`session`] | [`SessionOrchestrator`] and its builder |
//! | [`transport`] | Engine contract and websocket engine |

// ============================================================================
// Modules
// ============================================================================

/// Endpoint resolution.
///
/// Fetch the configuration document and extract a validated endpoint.
pub mod config;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Lifecycle events delivered to the observer.
pub mod event;

/// Type-safe identifiers.
pub mod identifiers;

/// Observer trait and presentation metadata.
pub mod observer;

/// Session orchestration.
///
/// Use [`SessionOrchestrator::builder()`] to create a configured instance.
pub mod session;

/// Streaming transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Config types
pub use config::{
    ConfigResolver, DEFAULT_CONFIG_KEYS, DEFAULT_CONFIG_URL, Endpoint, ResolveEndpoint,
};

// Error types
pub use error::{Error, Result};

// Event types
pub use event::{EventKind, LifecycleEvent};

// Identifier types
pub use identifiers::SessionId;

// Observer types
pub use observer::{Notice, Observer, Presentation};

// Session types
pub use session::{OrchestratorBuilder, SessionOrchestrator, SessionPhase, StartOutcome};

// Transport types
pub use transport::{EventTarget, TransportEngine, TransportSink, WsEngine, WsEngineOptions};
