//! Throttle lifecycle events.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag:
//!
//! ```json
//! { "type": "armed", "sessionId": 3, "remainingMs": 800 }
//! ```
//!
//! Events never carry the throttled value itself; observers read that from
//! the controller's watch channel.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique id of one throttle session (one controller instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocate the next id from the process-wide counter.
    pub fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What caused a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishTrigger {
    /// Enough time had passed; the input was published on arrival.
    Immediate,
    /// A pending timer fired at the end of the window.
    Deferred,
}

/// Lifecycle events emitted by a `ThrottleController`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThrottleEvent {
    /// A new value became the published value.
    Published {
        #[serde(rename = "sessionId")]
        session_id: SessionId,
        trigger: PublishTrigger,
    },

    /// A deferred publish was scheduled.
    Armed {
        #[serde(rename = "sessionId")]
        session_id: SessionId,
        /// Time left until the deferred publish fires.
        #[serde(rename = "remainingMs")]
        remaining_ms: u64,
    },

    /// A pending deferred publish was retired before firing.
    Canceled {
        #[serde(rename = "sessionId")]
        session_id: SessionId,
        timer: u64,
    },

    /// The session ended; no further publishes will happen.
    TornDown {
        #[serde(rename = "sessionId")]
        session_id: SessionId,
    },
}

impl ThrottleEvent {
    /// Session the event belongs to.
    pub const fn session_id(&self) -> SessionId {
        match self {
            Self::Published { session_id, .. }
            | Self::Armed { session_id, .. }
            | Self::Canceled { session_id, .. }
            | Self::TornDown { session_id } => *session_id,
        }
    }

    /// Event name for logging/debugging.
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Published { .. } => "published",
            Self::Armed { .. } => "armed",
            Self::Canceled { .. } => "canceled",
            Self::TornDown { .. } => "torn_down",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionId::next();
        let b = SessionId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_armed_wire_format() {
        let event = ThrottleEvent::Armed {
            session_id: SessionId::new(3),
            remaining_ms: 800,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"armed\""));
        assert!(json.contains("\"sessionId\":3"));
        assert!(json.contains("\"remainingMs\":800"));
    }

    #[test]
    fn test_published_wire_format() {
        let json = r#"{"type":"published","sessionId":9,"trigger":"deferred"}"#;
        let event: ThrottleEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            ThrottleEvent::Published {
                session_id: SessionId::new(9),
                trigger: PublishTrigger::Deferred,
            }
        );
        assert_eq!(event.event_name(), "published");
        assert_eq!(event.session_id().get(), 9);
    }
}
