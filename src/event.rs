//! Connection lifecycle events.
//!
//! Events are produced by a transport engine (or synthesized by the
//! orchestrator for `Started`/`Stopped`) and consumed exactly once by the
//! registered observer.
//!
//! # Event Kinds
//!
//! | Kind | Producer | Detail |
//! |------|----------|--------|
//! | `Started` | orchestrator | optional |
//! | `Connecting` | engine | optional (attempt counter) |
//! | `Connected` | engine | optional (endpoint) |
//! | `Message` | engine | payload text |
//! | `Disconnected` | engine | reason |
//! | `Error` | engine / orchestrator | failure detail |
//! | `Stopped` | orchestrator / engine | optional |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

// ============================================================================
// EventKind
// ============================================================================

/// Fieldless discriminant of a [`LifecycleEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// Session created, transport not yet involved.
    Started,
    /// Transport is attempting a connection.
    Connecting,
    /// Transport connection is open.
    Connected,
    /// A payload arrived.
    Message,
    /// Transport connection dropped.
    Disconnected,
    /// Something failed.
    Error,
    /// Session finished.
    Stopped,
}

impl EventKind {
    /// All kinds in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Started,
        Self::Connecting,
        Self::Connected,
        Self::Message,
        Self::Disconnected,
        Self::Error,
        Self::Stopped,
    ];

    /// Returns the kind name as used on the wire.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Message => "message",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// LifecycleEvent
// ============================================================================

/// A single lifecycle notification.
///
/// # Format
///
/// ```json
/// { "kind": "message", "detail": "payload text" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum LifecycleEvent {
    /// Session created.
    Started(Option<String>),
    /// Connection attempt in progress.
    Connecting(Option<String>),
    /// Connection established.
    Connected(Option<String>),
    /// Opaque payload received.
    Message(String),
    /// Connection dropped, with reason.
    Disconnected(String),
    /// Failure detail.
    Error(String),
    /// Session finished.
    Stopped(Option<String>),
}

// ============================================================================
// LifecycleEvent - Constructors
// ============================================================================

impl LifecycleEvent {
    /// Creates a `Message` event.
    #[inline]
    #[must_use]
    pub fn message(payload: impl Into<String>) -> Self {
        Self::Message(payload.into())
    }

    /// Creates a `Disconnected` event.
    #[inline]
    #[must_use]
    pub fn disconnected(reason: impl Into<String>) -> Self {
        Self::Disconnected(reason.into())
    }

    /// Creates an `Error` event.
    #[inline]
    #[must_use]
    pub fn error(detail: impl Into<String>) -> Self {
        Self::Error(detail.into())
    }

    /// Creates a `Connecting` event with a detail line.
    #[inline]
    #[must_use]
    pub fn connecting(detail: impl Into<String>) -> Self {
        Self::Connecting(Some(detail.into()))
    }

    /// Creates a `Connected` event with a detail line.
    #[inline]
    #[must_use]
    pub fn connected(detail: impl Into<String>) -> Self {
        Self::Connected(Some(detail.into()))
    }

    /// Creates a `Stopped` event with a detail line.
    #[inline]
    #[must_use]
    pub fn stopped(detail: impl Into<String>) -> Self {
        Self::Stopped(Some(detail.into()))
    }
}

// ============================================================================
// LifecycleEvent - Accessors
// ============================================================================

impl LifecycleEvent {
    /// Returns the event kind.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Started(_) => EventKind::Started,
            Self::Connecting(_) => EventKind::Connecting,
            Self::Connected(_) => EventKind::Connected,
            Self::Message(_) => EventKind::Message,
            Self::Disconnected(_) => EventKind::Disconnected,
            Self::Error(_) => EventKind::Error,
            Self::Stopped(_) => EventKind::Stopped,
        }
    }

    /// Returns the free-text detail, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Started(detail)
            | Self::Connecting(detail)
            | Self::Connected(detail)
            | Self::Stopped(detail) => detail.as_deref(),
            Self::Message(text) | Self::Disconnected(text) | Self::Error(text) => Some(text),
        }
    }

    /// Returns `true` for events a host should surface interruptively.
    ///
    /// Only `Error` and `Stopped` qualify; everything else is a passive
    /// status update.
    #[inline]
    #[must_use]
    pub const fn is_interruptive(&self) -> bool {
        matches!(self, Self::Error(_) | Self::Stopped(_))
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail() {
            Some(detail) => write!(f, "{}: {}", self.kind(), detail),
            None => write!(f, "{}", self.kind()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
