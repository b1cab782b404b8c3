//! Presentation metadata for lifecycle events.
//!
//! A host with a persistent status line and transient notifications looks
//! up each event kind here.
//!
//! | Kind | Title | Status line | Notify |
//! |------|-------|-------------|--------|
//! | Started | Started | Starting listener | no |
//! | Connecting | Connecting | Connecting… | no |
//! | Connected | Connected | Connected | no |
//! | Message | Message | Connected | yes |
//! | Disconnected | Disconnected | Disconnected | yes |
//! | Error | Error | Connection error | yes |
//! | Stopped | Stopped | Stopped | yes |

// ============================================================================
// Imports
// ============================================================================

use crate::event::{EventKind, LifecycleEvent};

// ============================================================================
// Presentation
// ============================================================================

/// How one kind of event is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    /// Notification title.
    pub title: &'static str,
    /// Text for the persistent status line.
    pub status: &'static str,
    /// Whether a separate notification should be posted.
    pub notify_user: bool,
}

/// Lookup table, indexed in [`EventKind::ALL`] order.
static TABLE: [Presentation; 7] = [
    Presentation {
        title: "Started",
        status: "Starting listener",
        notify_user: false,
    },
    Presentation {
        title: "Connecting",
        status: "Connecting…",
        notify_user: false,
    },
    Presentation {
        title: "Connected",
        status: "Connected",
        notify_user: false,
    },
    Presentation {
        title: "Message",
        status: "Connected",
        notify_user: true,
    },
    Presentation {
        title: "Disconnected",
        status: "Disconnected",
        notify_user: true,
    },
    Presentation {
        title: "Error",
        status: "Connection error",
        notify_user: true,
    },
    Presentation {
        title: "Stopped",
        status: "Stopped",
        notify_user: true,
    },
];

/// Returns the presentation of `kind`.
#[must_use]
pub fn presentation(kind: EventKind) -> &'static Presentation {
    &TABLE[kind as usize]
}

// ============================================================================
// Notice
// ============================================================================

/// A ready-to-post notification built from an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Notification title.
    pub title: &'static str,
    /// Notification body: the event detail, or the status line.
    pub body: String,
    /// Whether the notification should interrupt the user.
    pub interruptive: bool,
}

impl Notice {
    /// Builds a notice for `event`, or `None` if the kind is status-only.
    #[must_use]
    pub fn for_event(event: &LifecycleEvent) -> Option<Self> {
        let presentation = presentation(event.kind());
        if !presentation.notify_user {
            return None;
        }

        Some(Self {
            title: presentation.title,
            body: event.detail().unwrap_or(presentation.status).to_string(),
            interruptive: event.is_interruptive(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_kind_order() {
        for kind in EventKind::ALL {
            let title = presentation(kind).title.to_lowercase();
            assert_eq!(title, kind.as_str());
        }
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(presentation(EventKind::Started).status, "Starting listener");
        assert_eq!(presentation(EventKind::Error).status, "Connection error");
        assert_eq!(presentation(EventKind::Message).status, "Connected");
    }

    #[test]
    fn test_status_only_kinds_have_no_notice() {
        assert_eq!(Notice::for_event(&LifecycleEvent::Started(None)), None);
        assert_eq!(Notice::for_event(&LifecycleEvent::connecting("attempt 1")), None);
        assert_eq!(Notice::for_event(&LifecycleEvent::Connected(None)), None);
    }

    #[test]
    fn test_notice_uses_detail() {
        let notice = Notice::for_event(&LifecycleEvent::message("tick")).expect("notice");
        assert_eq!(notice.title, "Message");
        assert_eq!(notice.body, "tick");
        assert!(!notice.interruptive);
    }

    #[test]
    fn test_notice_falls_back_to_status() {
        let notice = Notice::for_event(&LifecycleEvent::Stopped(None)).expect("notice");
        assert_eq!(notice.body, "Stopped");
        assert!(notice.interruptive);
    }
}
