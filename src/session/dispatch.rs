//! Observer dispatch task.
//!
//! Each session owns one task that drains its FIFO queue into the observer.
//! A new session's task waits for the previous one to finish, so the
//! observer is never called concurrently.
//!
//! The opening event is delivered before anything else, cancelled or not.
//! On cancellation the task discards whatever is still queued, delivers a
//! final `Stopped` and exits. When the queue closes without cancellation
//! (session ended on its own) the task delivers everything and exits.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Weak;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use crate::event::LifecycleEvent;
use crate::identifiers::SessionId;
use crate::observer::Observer;

// ============================================================================
// Types
// ============================================================================

/// Completion signal of a dispatch task; awaitable by many.
pub(crate) type DispatchDone = Shared<BoxFuture<'static, ()>>;

// ============================================================================
// Spawning
// ============================================================================

/// Spawns the dispatch task for one session.
///
/// `opening` is delivered first, after `previous` completes, even if the
/// session is cancelled before the task gets to run.
///
/// Must be called within a tokio runtime.
pub(crate) fn spawn(
    session_id: SessionId,
    opening: LifecycleEvent,
    events: mpsc::UnboundedReceiver<LifecycleEvent>,
    cancel: CancellationToken,
    observer: Weak<dyn Observer>,
    previous: Option<DispatchDone>,
) -> DispatchDone {
    tokio::spawn(run(session_id, opening, events, cancel, observer, previous))
        .map(move |result| {
            if let Err(e) = result {
                error!(session_id = %session_id, error = %e, "Dispatch task failed");
            }
        })
        .boxed()
        .shared()
}

/// Dispatch loop.
async fn run(
    session_id: SessionId,
    opening: LifecycleEvent,
    mut events: mpsc::UnboundedReceiver<LifecycleEvent>,
    cancel: CancellationToken,
    observer: Weak<dyn Observer>,
    previous: Option<DispatchDone>,
) {
    if let Some(previous) = previous {
        previous.await;
    }

    deliver(&observer, session_id, opening);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                let dropped = events.len();
                if dropped > 0 {
                    debug!(session_id = %session_id, dropped, "Discarding queued events");
                }
                deliver(&observer, session_id, LifecycleEvent::stopped("Service stopped"));
                break;
            }

            next = events.recv() => match next {
                Some(event) => deliver(&observer, session_id, event),
                None => break,
            }
        }
    }

    debug!(session_id = %session_id, "Dispatch loop terminated");
}

/// Hands one event to the observer if it is still alive.
fn deliver(observer: &Weak<dyn Observer>, session_id: SessionId, event: LifecycleEvent) {
    match observer.upgrade() {
        Some(observer) => {
            trace!(session_id = %session_id, kind = %event.kind(), "Dispatching event");
            observer.on_event(event);
        }
        None => {
            debug!(session_id = %session_id, kind = %event.kind(), "Observer gone, dropping event");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
