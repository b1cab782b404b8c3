//! WebSocket transport engine.
//!
//! [`WsEngine`] implements [`TransportEngine`] on top of `tokio-tungstenite`.
//!
//! # Connect Loop
//!
//! The engine spawns a tokio task that:
//!
//! - Emits `Connecting` with an attempt counter, then `Connected`
//! - Forwards text and UTF-8 binary frames as `Message`
//! - Emits `Disconnected` when the server closes or the stream drops
//! - Waits `reconnect_delay` and tries again until stopped
//! - Emits `Stopped` once the loop exits

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Endpoint;
use crate::error::{Error, Result};
use crate::event::LifecycleEvent;

use super::engine::{TransportEngine, TransportSink};
use super::frame::decode_message;

// ============================================================================
// Constants
// ============================================================================

/// Delay between reconnect attempts.
const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Timeout for a single connect + handshake attempt.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum characters forwarded per message.
const DEFAULT_MAX_MESSAGE_CHARS: usize = 128;

// ============================================================================
// Types
// ============================================================================

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// WsEngineOptions
// ============================================================================

/// Tuning knobs for [`WsEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WsEngineOptions {
    /// Pause after a failed attempt or a dropped connection.
    pub reconnect_delay: Duration,

    /// Upper bound for TCP connect plus websocket handshake.
    pub connect_timeout: Duration,

    /// Payloads longer than this are cut, in characters.
    pub max_message_chars: usize,
}

impl Default for WsEngineOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl WsEngineOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
        }
    }

    /// Sets the reconnect delay.
    #[inline]
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets the connect timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Sets the message length cap.
    #[inline]
    #[must_use]
    pub fn with_max_message_chars(mut self, max_chars: usize) -> Self {
        self.max_message_chars = max_chars;
        self
    }
}

// ============================================================================
// WsEngine
// ============================================================================

/// Running loop handle.
struct RunningLoop {
    /// Cancels the loop.
    cancel: CancellationToken,
    /// Loop task, detached on drop.
    task: JoinHandle<()>,
}

/// Reconnecting websocket client.
///
/// # Example
///
/// ```ignore
/// let engine = WsEngine::with_options(
///     WsEngineOptions::new().with_reconnect_delay(Duration::from_secs(1)),
/// );
/// engine.start(&endpoint, sink)?;
/// // ...
/// engine.stop();
/// ```
#[derive(Default)]
pub struct WsEngine {
    /// Engine settings.
    options: WsEngineOptions,
    /// Active loop, if any.
    running: Mutex<Option<RunningLoop>>,
}

impl WsEngine {
    /// Creates an engine with default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with custom options.
    #[inline]
    #[must_use]
    pub fn with_options(options: WsEngineOptions) -> Self {
        Self {
            options,
            running: Mutex::new(None),
        }
    }

    /// Returns the engine options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &WsEngineOptions {
        &self.options
    }

    /// Returns `true` while a loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }
}

impl TransportEngine for WsEngine {
    fn start(&self, endpoint: &Endpoint, sink: TransportSink) -> Result<()> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::connection(format!("no tokio runtime for the connect loop: {e}")))?;

        let cancel = CancellationToken::new();
        let task = runtime.spawn(run_loop(
            endpoint.clone(),
            sink,
            self.options.clone(),
            cancel.clone(),
        ));

        let previous = self.running.lock().replace(RunningLoop { cancel, task });
        if let Some(previous) = previous {
            debug!("Replacing running connect loop");
            previous.cancel.cancel();
        }

        debug!(endpoint = %endpoint, "Connect loop spawned");
        Ok(())
    }

    fn stop(&self) {
        if let Some(running) = self.running.lock().take() {
            debug!("Stopping connect loop");
            running.cancel.cancel();
        }
    }
}

// ============================================================================
// Connect Loop
// ============================================================================

/// Connect/read/reconnect loop; emits `Stopped` on exit.
async fn run_loop(
    endpoint: Endpoint,
    sink: TransportSink,
    options: WsEngineOptions,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    while !cancel.is_cancelled() {
        attempt += 1;
        sink.emit(LifecycleEvent::connecting(format!(
            "Connecting (attempt {attempt})..."
        )));

        let connect = timeout(options.connect_timeout, connect_async(endpoint.as_str()));
        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = connect => result,
        };

        match result {
            Ok(Ok((socket, _))) => {
                attempt = 0;
                info!(endpoint = %endpoint, "WebSocket connection established");
                sink.emit(LifecycleEvent::connected(endpoint.as_str()));

                match read_frames(socket, &sink, &options, &cancel).await {
                    Some(reason) => {
                        debug!(endpoint = %endpoint, reason, "WebSocket disconnected");
                        sink.emit(LifecycleEvent::disconnected(reason));
                    }
                    None => break,
                }
            }
            Ok(Err(e)) => {
                let error = Error::from(e);
                warn!(endpoint = %endpoint, attempt, error = %error, "Connect failed");
                sink.emit(LifecycleEvent::error(format!("Connect failed: {error}")));
            }
            Err(_) => {
                let timeout_ms = options.connect_timeout.as_millis() as u64;
                warn!(endpoint = %endpoint, attempt, timeout_ms, "Connect timed out");
                sink.emit(LifecycleEvent::error(format!(
                    "Connect failed: timed out after {timeout_ms}ms"
                )));
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(options.reconnect_delay) => {}
        }
    }

    sink.emit(LifecycleEvent::stopped("Service stopped"));
    debug!(endpoint = %endpoint, "Connect loop terminated");
}

/// Forwards frames until the connection ends.
///
/// Returns the disconnect reason, or `None` if the loop was cancelled.
async fn read_frames(
    mut socket: Socket,
    sink: &TransportSink,
    options: &WsEngineOptions,
    cancel: &CancellationToken,
) -> Option<&'static str> {
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                if let Err(e) = socket.close(None).await {
                    debug!(error = %e, "Close on cancel failed");
                }
                return None;
            }
            next = socket.next() => next,
        };

        match next {
            Some(Ok(message)) => match decode_message(message, options.max_message_chars) {
                Ok(Some(text)) if text.is_empty() => {}
                Ok(Some(text)) => sink.emit(LifecycleEvent::message(text)),
                Ok(None) => return Some("Server closed connection"),
                Err(e) => {
                    warn!(error = %e, "Dropping undecodable frame");
                    sink.emit(LifecycleEvent::error(e.to_string()));
                }
            },
            Some(Err(e)) => {
                warn!(error = %e, "WebSocket read error");
                sink.emit(LifecycleEvent::error(format!("Read error: {e}")));
                return Some("Connection lost");
            }
            None => return Some("Connection lost"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
