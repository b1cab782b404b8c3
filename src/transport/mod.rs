//! Streaming transport layer.
//!
//! The orchestrator talks to transports only through [`TransportEngine`];
//! engines report back through a session-bound [`TransportSink`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐   start/stop    ┌──────────────────────┐
//! │ SessionOrchestrator  │────────────────►│  TransportEngine     │
//! │                      │                 │  (WsEngine)          │
//! │  on_transport_event  │◄────────────────│  connect/read/retry  │
//! └──────────────────────┘  TransportSink  └──────────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `engine` | Engine trait, sink and callback target |
//! | `frame` | Incoming frame decoding |
//! | `websocket` | `tokio-tungstenite` engine |

// ============================================================================
// Submodules
// ============================================================================

/// Engine contract and callback plumbing.
pub mod engine;

/// Frame decoding.
pub mod frame;

/// Reconnecting websocket engine.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use engine::{EventTarget, TransportEngine, TransportSink};
pub use frame::decode_message;
pub use websocket::{WsEngine, WsEngineOptions};
