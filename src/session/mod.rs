//! Session orchestration.
//!
//! A session runs from `start()` to its final event: resolution, transport
//! start, streamed callbacks, and stop.
//!
//! # Guarantees
//!
//! - At most one session exists per orchestrator.
//! - The observer sees `Started` first and is never called concurrently.
//! - Events reach the observer in the order the engine emitted them.
//! - Once `stop()` returns, the stopped session delivers nothing more.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `builder` | [`OrchestratorBuilder`] |
//! | `dispatch` | Serialized observer delivery (internal) |
//! | `orchestrator` | [`SessionOrchestrator`] |
//! | `phase` | [`SessionPhase`], [`StartOutcome`] |

// ============================================================================
// Submodules
// ============================================================================

/// Orchestrator builder.
pub mod builder;

/// Per-session dispatch task.
mod dispatch;

/// Session lifecycle supervisor.
pub mod orchestrator;

/// Phase and outcome types.
pub mod phase;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::OrchestratorBuilder;
pub use orchestrator::SessionOrchestrator;
pub use phase::{SessionPhase, StartOutcome};
