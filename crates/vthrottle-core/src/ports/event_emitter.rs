//! Event emitter port for throttle lifecycle events.
//!
//! Implementations handle transport details (channels, logs, UI bridges).

use crate::events::ThrottleEvent;

/// Trait for emitting throttle lifecycle events.
///
/// # Implementations
///
/// - `NoopEmitter` - the default when nobody listens
/// - `RecordingEmitter` (`test-utils`) - captures events for assertions
pub trait ThrottleEventEmitter: Send + Sync {
    /// Emit an event.
    ///
    /// Called while the controller holds its internal lock, so this must not
    /// block and must not call back into the controller.
    fn emit(&self, event: ThrottleEvent);
}

/// A no-op event emitter.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    /// Create a new no-op emitter.
    pub const fn new() -> Self {
        Self
    }
}

impl ThrottleEventEmitter for NoopEmitter {
    fn emit(&self, _event: ThrottleEvent) {
        // Intentionally do nothing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SessionId;
    use std::sync::Arc;

    #[test]
    fn test_noop_emitter() {
        let emitter = NoopEmitter::new();

        // Should not panic
        emitter.emit(ThrottleEvent::TornDown {
            session_id: SessionId::new(1),
        });
    }

    #[test]
    fn test_arc_emitter() {
        let emitter: Arc<dyn ThrottleEventEmitter> = Arc::new(NoopEmitter::new());
        emitter.emit(ThrottleEvent::TornDown {
            session_id: SessionId::new(1),
        });
    }
}
