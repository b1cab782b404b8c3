//! Observer side of the event stream.
//!
//! An [`Observer`] receives every [`LifecycleEvent`] of a session, one at a
//! time, in emission order. It never touches transport state.
//!
//! How events are shown to a user is decided here, not by the
//! orchestrator: see [`presentation`].

// ============================================================================
// Submodules
// ============================================================================

/// Static presentation metadata per event kind.
pub mod presentation;

// ============================================================================
// Imports
// ============================================================================

use crate::event::LifecycleEvent;

// ============================================================================
// Re-exports
// ============================================================================

pub use presentation::{Notice, Presentation, presentation};

// ============================================================================
// Observer
// ============================================================================

/// Sink for lifecycle events.
///
/// Calls are serialized by the orchestrator, so implementations need no
/// synchronization of their own beyond `Send + Sync`. Do not block for long
/// inside [`on_event`](Self::on_event): the next event waits for it.
pub trait Observer: Send + Sync {
    /// Handles one event.
    fn on_event(&self, event: LifecycleEvent);
}

impl<F> Observer for F
where
    F: Fn(LifecycleEvent) + Send + Sync,
{
    fn on_event(&self, event: LifecycleEvent) {
        self(event);
    }
}

// ============================================================================
// Tests
// ============================================================================
