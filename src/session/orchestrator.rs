//! Session lifecycle orchestration.
//!
//! The orchestrator owns a single session slot. It resolves the endpoint,
//! starts the transport engine, forwards engine callbacks to the observer
//! and tears everything down on `stop()` or drop.
//!
//! # Locking
//!
//! - `slot` guards every phase transition and every enqueue.
//! - `engine_gate` serializes `engine.start` against `engine.stop`.
//! - `engine_gate` may be taken before `slot`, never the other way round.
//!   Neither lock is held while calling the observer.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ResolveEndpoint;
use crate::event::{EventKind, LifecycleEvent};
use crate::identifiers::SessionId;
use crate::observer::Observer;
use crate::transport::{EventTarget, TransportEngine, TransportSink};

use super::builder::OrchestratorBuilder;
use super::dispatch::{self, DispatchDone};
use super::phase::{SessionPhase, StartOutcome};

// ============================================================================
// Types
// ============================================================================

/// One orchestration run.
struct Session {
    /// Identity token.
    id: SessionId,
    /// Current phase.
    phase: SessionPhase,
    /// Cancels resolution and dispatch.
    cancel: CancellationToken,
    /// Dispatch queue.
    events: mpsc::UnboundedSender<LifecycleEvent>,
    /// Completion of this session's dispatch task.
    dispatch: DispatchDone,
}

/// The single session slot.
#[derive(Default)]
struct Slot {
    /// Current session, if any.
    session: Option<Session>,
    /// Dispatch task of the most recent session.
    last_dispatch: Option<DispatchDone>,
}

impl Slot {
    /// Returns the session if it is `session_id` and still live.
    fn live_mut(&mut self, session_id: SessionId) -> Option<&mut Session> {
        self.session
            .as_mut()
            .filter(|session| session.id == session_id && !session.cancel.is_cancelled())
    }
}

/// Shared state behind a [`SessionOrchestrator`].
pub(crate) struct OrchestratorInner {
    /// Configuration document URL.
    config_url: String,
    /// Endpoint source.
    resolver: Arc<dyn ResolveEndpoint>,
    /// Transport engine.
    engine: Arc<dyn TransportEngine>,
    /// Non-owning reference to the host's observer.
    observer: Weak<dyn Observer>,
    /// Session slot.
    slot: Mutex<Slot>,
    /// Serializes engine start/stop.
    engine_gate: Mutex<()>,
}

// ============================================================================
// SessionOrchestrator
// ============================================================================

/// Supervises one streaming session at a time.
///
/// Dropping the orchestrator stops the active session (the observer still
/// receives the final `Stopped` if it is alive).
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use listener_service::{LifecycleEvent, SessionOrchestrator};
///
/// # async fn example() -> listener_service::Result<()> {
/// let observer = Arc::new(|event: LifecycleEvent| println!("{event}"));
///
/// let orchestrator = SessionOrchestrator::builder()
///     .config_url("https://example.com/config.json")
///     .observer(&observer)
///     .build()?;
///
/// orchestrator.start();
/// // ...
/// orchestrator.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct SessionOrchestrator {
    /// Shared inner state.
    inner: Arc<OrchestratorInner>,
}

impl fmt::Debug for SessionOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOrchestrator")
            .field("config_url", &self.inner.config_url)
            .field("phase", &self.phase())
            .field("session_id", &self.session_id())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SessionOrchestrator - Constructor
// ============================================================================

impl SessionOrchestrator {
    /// Creates a new builder.
    #[inline]
    #[must_use]
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Creates an orchestrator from validated parts.
    pub(crate) fn new(
        config_url: String,
        resolver: Arc<dyn ResolveEndpoint>,
        engine: Arc<dyn TransportEngine>,
        observer: Weak<dyn Observer>,
    ) -> Self {
        Self {
            inner: Arc::new(OrchestratorInner {
                config_url,
                resolver,
                engine,
                observer,
                slot: Mutex::new(Slot::default()),
                engine_gate: Mutex::new(()),
            }),
        }
    }
}

// ============================================================================
// SessionOrchestrator - Accessors
// ============================================================================

impl SessionOrchestrator {
    /// Returns the configuration document URL.
    #[inline]
    #[must_use]
    pub fn config_url(&self) -> &str {
        &self.inner.config_url
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.inner
            .slot
            .lock()
            .session
            .as_ref()
            .map_or(SessionPhase::Idle, |session| session.phase)
    }

    /// Returns the current session ID, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.inner.slot.lock().session.as_ref().map(|session| session.id)
    }

    /// Returns `true` if a session exists in any phase.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.slot.lock().session.is_some()
    }
}

// ============================================================================
// SessionOrchestrator - Lifecycle
// ============================================================================

impl SessionOrchestrator {
    /// Starts a new session unless one already exists.
    ///
    /// Returns immediately; resolution runs on a spawned task. The observer
    /// receives `Started` first, then either the transport's callbacks or a
    /// single `Error` if resolution fails.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(&self) -> StartOutcome {
        let (session_id, cancel) = {
            let mut slot = self.inner.slot.lock();

            if let Some(session) = &slot.session {
                debug!(session_id = %session.id, phase = %session.phase, "Session already running");
                return StartOutcome::AlreadyRunning(session.id);
            }

            let session_id = SessionId::new();
            let cancel = CancellationToken::new();
            let (events, rx) = mpsc::unbounded_channel();

            let dispatch = dispatch::spawn(
                session_id,
                LifecycleEvent::Started(None),
                rx,
                cancel.clone(),
                self.inner.observer.clone(),
                slot.last_dispatch.take(),
            );

            slot.last_dispatch = Some(dispatch.clone());
            slot.session = Some(Session {
                id: session_id,
                phase: SessionPhase::Resolving,
                cancel: cancel.clone(),
                events,
                dispatch,
            });

            (session_id, cancel)
        };

        info!(session_id = %session_id, config_url = %self.inner.config_url, "Session started");

        tokio::spawn(Arc::clone(&self.inner).resolve_and_launch(session_id, cancel));

        StartOutcome::Started(session_id)
    }

    /// Stops the current session.
    ///
    /// Idempotent: without a session this only waits for the last session's
    /// remaining events to be delivered. When it returns, the observer has
    /// received `Stopped` and no further event of the stopped session will
    /// reach it.
    ///
    /// Must not be awaited from inside [`Observer::on_event`].
    pub async fn stop(&self) {
        let pending = {
            let mut guard = self.inner.slot.lock();
            let slot = &mut *guard;

            match slot.session.as_mut() {
                None => Err(slot.last_dispatch.clone()),
                Some(session) if session.phase == SessionPhase::Stopping => {
                    Ok((session.id, false, session.dispatch.clone()))
                }
                Some(session) => {
                    let stop_engine = session.phase.has_transport();
                    debug!(session_id = %session.id, phase = %session.phase, "Session stopping");
                    session.phase = SessionPhase::Stopping;
                    session.cancel.cancel();
                    Ok((session.id, stop_engine, session.dispatch.clone()))
                }
            }
        };

        let (session_id, stop_engine, dispatch) = match pending {
            Ok(pending) => pending,
            Err(Some(previous)) => {
                debug!("No session to stop, draining last dispatch");
                previous.await;
                return;
            }
            Err(None) => {
                debug!("No session to stop");
                return;
            }
        };

        if stop_engine {
            let _gate = self.inner.engine_gate.lock();
            self.inner.engine.stop();
        }

        dispatch.await;

        let mut slot = self.inner.slot.lock();
        if slot.session.as_ref().is_some_and(|session| session.id == session_id) {
            slot.session = None;
            info!(session_id = %session_id, "Session stopped");
        }
    }

    /// Callback entry point for the transport engine.
    ///
    /// Safe to call from any thread. Events for a session that is not
    /// current, or that is stopping, are dropped.
    pub fn on_transport_event(&self, session_id: SessionId, event: LifecycleEvent) {
        self.inner.on_transport_event(session_id, event);
    }
}

impl Drop for SessionOrchestrator {
    fn drop(&mut self) {
        self.inner.teardown();
    }
}

// ============================================================================
// OrchestratorInner - Session Tasks
// ============================================================================

impl OrchestratorInner {
    /// Resolves the endpoint and starts the engine for `session_id`.
    async fn resolve_and_launch(self: Arc<Self>, session_id: SessionId, cancel: CancellationToken) {
        let resolved = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(session_id = %session_id, "Resolution abandoned");
                return;
            }
            resolved = self.resolver.resolve(&self.config_url) => resolved,
        };

        let endpoint = match resolved {
            Ok(endpoint) => endpoint,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Endpoint resolution failed");
                self.fail(session_id, e.to_string());
                return;
            }
        };

        let _gate = self.engine_gate.lock();

        {
            let mut slot = self.slot.lock();
            let Some(session) = slot.live_mut(session_id) else {
                debug!(session_id = %session_id, "Session ended during resolution, discarding endpoint");
                return;
            };
            session.phase = SessionPhase::StartingTransport;
        }

        let target = Arc::downgrade(&self) as Weak<dyn EventTarget>;
        let sink = TransportSink::from_weak(session_id, target);

        match self.engine.start(&endpoint, sink) {
            Ok(()) => info!(session_id = %session_id, endpoint = %endpoint, "Transport started"),
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Transport failed to start");
                self.fail(session_id, format!("Transport start failed: {e}"));
            }
        }
    }

    /// Ends `session_id` with a single `Error` event.
    fn fail(&self, session_id: SessionId, detail: String) {
        let mut slot = self.slot.lock();
        if slot.live_mut(session_id).is_none() {
            return;
        }

        if let Some(session) = slot.session.take() {
            let _ = session.events.send(LifecycleEvent::error(detail));
            debug!(session_id = %session_id, "Session failed, back to idle");
        }
    }

    /// Stops the session without waiting; used on drop.
    fn teardown(&self) {
        let stop_engine = {
            let mut slot = self.slot.lock();
            match slot.session.take() {
                Some(session) => {
                    session.cancel.cancel();
                    session.phase.has_transport()
                }
                None => return,
            }
        };

        debug!("Orchestrator dropped, tearing down session");

        if stop_engine {
            let _gate = self.engine_gate.lock();
            self.engine.stop();
        }
    }
}

// ============================================================================
// OrchestratorInner - Transport Callbacks
// ============================================================================

impl EventTarget for OrchestratorInner {
    fn on_transport_event(&self, session_id: SessionId, event: LifecycleEvent) {
        let mut slot = self.slot.lock();

        let Some(session) = slot.live_mut(session_id) else {
            debug!(session_id = %session_id, kind = %event.kind(), "Dropping event for inactive session");
            return;
        };

        let kind = event.kind();
        if kind == EventKind::Started {
            debug!(session_id = %session_id, "Ignoring engine Started, already reported");
            return;
        }

        if session.phase == SessionPhase::StartingTransport
            && matches!(kind, EventKind::Connecting | EventKind::Connected)
        {
            session.phase = SessionPhase::Active;
            debug!(session_id = %session_id, "Session active");
        }

        if session.events.send(event).is_err() {
            debug!(session_id = %session_id, "Dispatch queue closed");
        }

        if kind == EventKind::Stopped {
            slot.session = None;
            info!(session_id = %session_id, "Transport stopped, session ended");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::{sleep, timeout};

    use crate::config::Endpoint;
    use crate::error::{Error, Result};

    const WAIT: Duration = Duration::from_secs(5);

    // ------------------------------------------------------------------------
    // Test doubles
    // ------------------------------------------------------------------------

    enum Resolution {
        Endpoint(&'static str),
        Failure(&'static str),
        Never,
    }

    struct StubResolver {
        resolution: Resolution,
        calls: AtomicUsize,
    }

    impl StubResolver {
        fn new(resolution: Resolution) -> Self {
            Self {
                resolution,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ResolveEndpoint for StubResolver {
        async fn resolve(&self, _config_url: &str) -> Result<Endpoint> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.resolution {
                Resolution::Endpoint(url) => Endpoint::parse(url),
                Resolution::Failure(message) => Err(Error::config_fetch("stub", message)),
                Resolution::Never => std::future::pending().await,
            }
        }
    }

    #[derive(Default)]
    struct ScriptedEngine {
        sink: Mutex<Option<TransportSink>>,
        starts: AtomicUsize,
        stops: AtomicUsize,
        fail_start: AtomicBool,
        stopped_on_stop: AtomicBool,
    }

    impl ScriptedEngine {
        fn sink(&self) -> Option<TransportSink> {
            self.sink.lock().clone()
        }
    }

    impl TransportEngine for ScriptedEngine {
        fn start(&self, _endpoint: &Endpoint, sink: TransportSink) -> Result<()> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            if self.fail_start.load(Ordering::SeqCst) {
                return Err(Error::connection("no route"));
            }
            *self.sink.lock() = Some(sink);
            Ok(())
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
            if self.stopped_on_stop.load(Ordering::SeqCst)
                && let Some(sink) = self.sink()
            {
                sink.emit(LifecycleEvent::stopped("engine acknowledged"));
            }
        }
    }

    struct Recorder(mpsc::UnboundedSender<LifecycleEvent>);

    impl Observer for Recorder {
        fn on_event(&self, event: LifecycleEvent) {
            let _ = self.0.send(event);
        }
    }

    struct Harness {
        orchestrator: SessionOrchestrator,
        engine: Arc<ScriptedEngine>,
        resolver: Arc<StubResolver>,
        observer: Arc<Recorder>,
        events: mpsc::UnboundedReceiver<LifecycleEvent>,
    }

    impl Harness {
        fn new(resolution: Resolution) -> Self {
            let engine = Arc::new(ScriptedEngine::default());
            let resolver = Arc::new(StubResolver::new(resolution));
            let (tx, events) = mpsc::unbounded_channel();
            let observer = Arc::new(Recorder(tx));

            let orchestrator = SessionOrchestrator::builder()
                .config_url("http://config.test/config.json")
                .shared_resolver(resolver.clone())
                .shared_engine(engine.clone())
                .observer(&observer)
                .build()
                .expect("build");

            Self {
                orchestrator,
                engine,
                resolver,
                observer,
                events,
            }
        }

        fn connected() -> Self {
            Self::new(Resolution::Endpoint("wss://x/y"))
        }

        async fn next_event(&mut self) -> LifecycleEvent {
            timeout(WAIT, self.events.recv())
                .await
                .expect("event within timeout")
                .expect("observer channel open")
        }

        async fn wait_for_sink(&self) -> TransportSink {
            timeout(WAIT, async {
                loop {
                    if let Some(sink) = self.engine.sink() {
                        return sink;
                    }
                    sleep(Duration::from_millis(5)).await;
                }
            })
            .await
            .expect("engine started")
        }

        async fn assert_silent(&mut self) {
            sleep(Duration::from_millis(50)).await;
            assert!(self.events.try_recv().is_err(), "unexpected event");
        }
    }

    // ------------------------------------------------------------------------
    // Start
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_forwards_transport_events_in_order() {
        let mut h = Harness::connected();

        assert!(h.orchestrator.start().is_started());
        let sink = h.wait_for_sink().await;
        assert_eq!(h.orchestrator.phase(), SessionPhase::StartingTransport);

        sink.emit(LifecycleEvent::Connecting(None));
        sink.emit(LifecycleEvent::Connected(None));
        sink.emit(LifecycleEvent::message("a"));
        sink.emit(LifecycleEvent::message("b"));
        sink.emit(LifecycleEvent::disconnected("net"));

        assert_eq!(h.next_event().await, LifecycleEvent::Started(None));
        assert_eq!(h.next_event().await, LifecycleEvent::Connecting(None));
        assert_eq!(h.next_event().await, LifecycleEvent::Connected(None));
        assert_eq!(h.next_event().await, LifecycleEvent::message("a"));
        assert_eq!(h.next_event().await, LifecycleEvent::message("b"));
        assert_eq!(h.next_event().await, LifecycleEvent::disconnected("net"));

        // Transient disconnects do not end the session.
        assert_eq!(h.orchestrator.phase(), SessionPhase::Active);
        h.assert_silent().await;
    }

    #[tokio::test]
    async fn test_start_while_running_is_noop() {
        let h = Harness::connected();

        let first = h.orchestrator.start();
        let second = h.orchestrator.start();

        assert!(first.is_started());
        assert_eq!(second, StartOutcome::AlreadyRunning(first.session_id()));

        h.wait_for_sink().await;
        assert_eq!(h.resolver.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.engine.starts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolution_failure_reports_error_and_returns_idle() {
        let mut h = Harness::new(Resolution::Failure("connection refused"));

        h.orchestrator.start();

        assert_eq!(h.next_event().await, LifecycleEvent::Started(None));
        let error = h.next_event().await;
        assert!(matches!(error, LifecycleEvent::Error(ref detail) if detail.contains("connection refused")));

        assert_eq!(h.orchestrator.phase(), SessionPhase::Idle);
        assert_eq!(h.engine.starts.load(Ordering::SeqCst), 0);
        h.assert_silent().await;
    }

    #[tokio::test]
    async fn test_engine_start_failure_reports_error() {
        let mut h = Harness::connected();
        h.engine.fail_start.store(true, Ordering::SeqCst);

        h.orchestrator.start();

        assert_eq!(h.next_event().await, LifecycleEvent::Started(None));
        let error = h.next_event().await;
        assert!(matches!(error, LifecycleEvent::Error(ref detail) if detail.contains("no route")));
        assert!(!h.orchestrator.is_running());
    }

    #[tokio::test]
    async fn test_restart_after_failure() {
        let mut h = Harness::new(Resolution::Failure("boom"));

        h.orchestrator.start();
        let _started = h.next_event().await;
        let _error = h.next_event().await;

        assert!(h.orchestrator.start().is_started());
        assert_eq!(h.next_event().await, LifecycleEvent::Started(None));
        assert_eq!(h.resolver.calls.load(Ordering::SeqCst), 2);
    }

    // ------------------------------------------------------------------------
    // Stop
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let mut h = Harness::connected();

        h.orchestrator.start();
        h.wait_for_sink().await;

        h.orchestrator.stop().await;
        h.orchestrator.stop().await;

        assert_eq!(h.next_event().await, LifecycleEvent::Started(None));
        assert_eq!(h.next_event().await, LifecycleEvent::stopped("Service stopped"));
        h.assert_silent().await;

        assert_eq!(h.engine.stops.load(Ordering::SeqCst), 1);
        assert_eq!(h.orchestrator.phase(), SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_stop_without_session_is_noop() {
        let mut h = Harness::connected();

        h.orchestrator.stop().await;

        assert_eq!(h.engine.stops.load(Ordering::SeqCst), 0);
        h.assert_silent().await;
    }

    #[tokio::test]
    async fn test_stop_during_resolution() {
        let mut h = Harness::new(Resolution::Never);

        h.orchestrator.start();
        assert_eq!(h.orchestrator.phase(), SessionPhase::Resolving);

        h.orchestrator.stop().await;

        assert_eq!(h.next_event().await, LifecycleEvent::Started(None));
        assert_eq!(h.next_event().await, LifecycleEvent::stopped("Service stopped"));
        assert_eq!(h.engine.starts.load(Ordering::SeqCst), 0);
        assert_eq!(h.engine.stops.load(Ordering::SeqCst), 0);
        assert_eq!(h.orchestrator.phase(), SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_synchronous_engine_acknowledgement_is_tolerated() {
        let mut h = Harness::connected();
        h.engine.stopped_on_stop.store(true, Ordering::SeqCst);

        h.orchestrator.start();
        h.wait_for_sink().await;
        h.orchestrator.stop().await;

        assert_eq!(h.next_event().await, LifecycleEvent::Started(None));
        assert_eq!(h.next_event().await, LifecycleEvent::stopped("Service stopped"));
        h.assert_silent().await;
    }

    #[tokio::test]
    async fn test_engine_stopping_on_its_own_ends_session() {
        let mut h = Harness::connected();

        h.orchestrator.start();
        let sink = h.wait_for_sink().await;
        sink.emit(LifecycleEvent::Connected(None));
        sink.emit(LifecycleEvent::stopped("gave up"));

        assert_eq!(h.next_event().await, LifecycleEvent::Started(None));
        assert_eq!(h.next_event().await, LifecycleEvent::Connected(None));
        assert_eq!(h.next_event().await, LifecycleEvent::stopped("gave up"));
        assert_eq!(h.orchestrator.phase(), SessionPhase::Idle);

        h.orchestrator.stop().await;
        h.assert_silent().await;
    }

    #[tokio::test]
    async fn test_no_events_after_stop_returns() {
        let mut h = Harness::connected();

        h.orchestrator.start();
        let sink = h.wait_for_sink().await;
        sink.emit(LifecycleEvent::Connected(None));

        let halt = Arc::new(AtomicBool::new(false));
        let emitter = {
            let halt = Arc::clone(&halt);
            thread::spawn(move || {
                let mut n = 0_u64;
                while !halt.load(Ordering::SeqCst) {
                    sink.emit(LifecycleEvent::message(n.to_string()));
                    n += 1;
                    thread::yield_now();
                }
                n
            })
        };

        sleep(Duration::from_millis(10)).await;
        h.orchestrator.stop().await;

        // Keep emitting for a while after stop() returned.
        sleep(Duration::from_millis(20)).await;
        halt.store(true, Ordering::SeqCst);
        let emitted = emitter.join().expect("emitter thread");
        assert!(emitted > 0);

        let mut received = Vec::new();
        while let Ok(event) = h.events.try_recv() {
            received.push(event);
        }

        assert_eq!(received.first(), Some(&LifecycleEvent::Started(None)));
        assert_eq!(received.last(), Some(&LifecycleEvent::stopped("Service stopped")));
        assert_eq!(
            received.iter().filter(|e| e.kind() == EventKind::Stopped).count(),
            1
        );
        h.assert_silent().await;
    }

    #[tokio::test]
    async fn test_late_callback_from_previous_session_is_dropped() {
        let mut h = Harness::connected();

        let first = h.orchestrator.start().session_id();
        let old_sink = h.wait_for_sink().await;
        h.orchestrator.stop().await;
        *h.engine.sink.lock() = None;

        let second = h.orchestrator.start().session_id();
        assert_ne!(first, second);
        let new_sink = h.wait_for_sink().await;

        old_sink.emit(LifecycleEvent::message("old"));
        new_sink.emit(LifecycleEvent::message("new"));

        assert_eq!(h.next_event().await, LifecycleEvent::Started(None));
        assert_eq!(h.next_event().await, LifecycleEvent::stopped("Service stopped"));
        assert_eq!(h.next_event().await, LifecycleEvent::Started(None));
        assert_eq!(h.next_event().await, LifecycleEvent::message("new"));
        h.assert_silent().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_after_failure_waits_for_pending_delivery() {
        struct SlowObserver {
            returned: AtomicBool,
            late: Mutex<Vec<String>>,
        }

        impl Observer for SlowObserver {
            fn on_event(&self, event: LifecycleEvent) {
                if event.kind() == EventKind::Started {
                    thread::sleep(Duration::from_millis(300));
                }
                if self.returned.load(Ordering::SeqCst) {
                    self.late.lock().push(event.to_string());
                }
            }
        }

        let observer = Arc::new(SlowObserver {
            returned: AtomicBool::new(false),
            late: Mutex::new(Vec::new()),
        });
        let orchestrator = SessionOrchestrator::builder()
            .config_url("http://config.test/config.json")
            .resolver(StubResolver::new(Resolution::Failure("refused")))
            .engine(ScriptedEngine::default())
            .observer(&observer)
            .build()
            .expect("build");

        orchestrator.start();
        timeout(WAIT, async {
            while orchestrator.is_running() {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("session failed");

        orchestrator.stop().await;
        observer.returned.store(true, Ordering::SeqCst);

        sleep(Duration::from_millis(400)).await;
        assert!(observer.late.lock().is_empty(), "late: {:?}", observer.late.lock());
    }

    #[tokio::test]
    async fn test_engine_started_is_not_repeated() {
        let mut h = Harness::connected();

        h.orchestrator.start();
        let sink = h.wait_for_sink().await;
        sink.emit(LifecycleEvent::Started(Some("engine up".to_string())));
        sink.emit(LifecycleEvent::message("a"));

        assert_eq!(h.next_event().await, LifecycleEvent::Started(None));
        assert_eq!(h.next_event().await, LifecycleEvent::message("a"));
        h.assert_silent().await;
    }

    // ------------------------------------------------------------------------
    // Ownership
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_dropped_observer_is_not_revived() {
        let h = Harness::connected();
        let Harness {
            orchestrator,
            engine,
            observer,
            ..
        } = h;

        orchestrator.start();
        let sink = timeout(WAIT, async {
            loop {
                if let Some(sink) = engine.sink() {
                    return sink;
                }
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("engine started");

        let weak = Arc::downgrade(&observer);
        drop(observer);
        sink.emit(LifecycleEvent::message("nobody listening"));
        orchestrator.stop().await;

        assert!(weak.upgrade().is_none());
    }

    #[tokio::test]
    async fn test_drop_tears_down_session() {
        let h = Harness::connected();

        h.orchestrator.start();
        h.wait_for_sink().await;

        let Harness {
            orchestrator,
            engine,
            mut events,
            observer: _observer,
            ..
        } = h;
        drop(orchestrator);

        assert_eq!(engine.stops.load(Ordering::SeqCst), 1);
        let mut last = timeout(WAIT, events.recv()).await.expect("event").expect("open");
        while last.kind() != EventKind::Stopped {
            last = timeout(WAIT, events.recv()).await.expect("event").expect("open");
        }
    }

    #[test]
    fn test_debug_shows_phase() {
        let h = Harness::connected();
        let debug = format!("{:?}", h.orchestrator);
        assert!(debug.contains("Idle"));
        assert!(debug.contains("config.test"));
    }
}
