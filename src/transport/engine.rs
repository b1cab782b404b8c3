//! Transport engine contract.
//!
//! A transport engine owns the socket, its framing and its reconnect policy.
//! The orchestrator only starts and stops it; the engine reports back
//! through a [`TransportSink`] bound to one session.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use tracing::trace;

use crate::config::Endpoint;
use crate::error::Result;
use crate::event::LifecycleEvent;
use crate::identifiers::SessionId;

// ============================================================================
// TransportEngine
// ============================================================================

/// A streaming transport with its own connect/retry loop.
///
/// # Contract
///
/// - [`start`](Self::start) returns without waiting for the connection and
///   emits callbacks through the sink until stopped.
/// - [`stop`](Self::stop) is idempotent and eventually leads to a terminal
///   `Stopped` callback.
/// - Callbacks may arrive on any thread, including synchronously from
///   inside `start`.
pub trait TransportEngine: Send + Sync {
    /// Begins connecting to `endpoint`, reporting through `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop could not be launched at all.
    fn start(&self, endpoint: &Endpoint, sink: TransportSink) -> Result<()>;

    /// Requests termination of the active loop.
    fn stop(&self);
}

// ============================================================================
// EventTarget
// ============================================================================

/// Receiver of transport callbacks, keyed by session.
///
/// Implemented by the session orchestrator.
pub trait EventTarget: Send + Sync {
    /// Handles one callback emitted for `session_id`.
    fn on_transport_event(&self, session_id: SessionId, event: LifecycleEvent);
}

// ============================================================================
// TransportSink
// ============================================================================

/// Callback handle given to a transport engine for one session.
///
/// Holds only a weak reference to its target, so an engine that outlives
/// the orchestrator emits into the void instead of keeping it alive.
#[derive(Clone)]
pub struct TransportSink {
    /// Session the callbacks belong to.
    session_id: SessionId,
    /// Non-owning reference to the receiver.
    target: Weak<dyn EventTarget>,
}

impl fmt::Debug for TransportSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSink")
            .field("session_id", &self.session_id)
            .field("attached", &(self.target.strong_count() > 0))
            .finish()
    }
}

impl TransportSink {
    /// Creates a sink that forwards to `target` tagged with `session_id`.
    #[must_use]
    pub fn new<T>(session_id: SessionId, target: &Arc<T>) -> Self
    where
        T: EventTarget + 'static,
    {
        let target = Arc::downgrade(target) as Weak<dyn EventTarget>;
        Self { session_id, target }
    }

    /// Creates a sink from an already-erased weak reference.
    pub(crate) fn from_weak(session_id: SessionId, target: Weak<dyn EventTarget>) -> Self {
        Self { session_id, target }
    }

    /// Returns the session this sink reports for.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Emits one lifecycle callback.
    pub fn emit(&self, event: LifecycleEvent) {
        match self.target.upgrade() {
            Some(target) => target.on_transport_event(self.session_id, event),
            None => trace!(session_id = %self.session_id, kind = %event.kind(), "Sink target gone"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
