//! Session phases and start outcomes.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::identifiers::SessionId;

// ============================================================================
// SessionPhase
// ============================================================================

/// Phase of the orchestrator's session slot.
///
/// ```text
/// Idle ─start()─► Resolving ─endpoint─► StartingTransport ─connecting─► Active
///                     │                                                 │
///                     └─failure (Error)─► Idle          stop() ─► Stopping ─► Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// No session.
    Idle,
    /// Fetching the configuration document.
    Resolving,
    /// Engine started, no connection callback yet.
    StartingTransport,
    /// Engine reported connecting or connected.
    Active,
    /// `stop()` in progress.
    Stopping,
}

impl SessionPhase {
    /// Returns `true` if the transport engine may be running.
    #[inline]
    #[must_use]
    pub const fn has_transport(&self) -> bool {
        matches!(self, Self::StartingTransport | Self::Active)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::StartingTransport => "starting_transport",
            Self::Active => "active",
            Self::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

// ============================================================================
// StartOutcome
// ============================================================================

/// Result of `SessionOrchestrator::start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new session was created.
    Started(SessionId),
    /// A session already exists; nothing changed.
    AlreadyRunning(SessionId),
}

impl StartOutcome {
    /// Returns the ID of the session that is now current.
    #[inline]
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        match self {
            Self::Started(id) | Self::AlreadyRunning(id) => *id,
        }
    }

    /// Returns `true` if a new session was created.
    #[inline]
    #[must_use]
    pub const fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }
}

// ============================================================================
// Tests
// ============================================================================
