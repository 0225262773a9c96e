//! Common test utilities.
//!
//! Virtual-time fixtures shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use vthrottle::{ThrottleController, ThrottleDeps};
use vthrottle_core::testing::{ManualClock, RecordingEmitter, VirtualTimers};

pub const fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// A controller running on virtual time.
pub struct VirtualSession<T> {
    pub controller: ThrottleController<T>,
    pub clock: Arc<ManualClock>,
    pub timers: Arc<VirtualTimers>,
    pub events: Arc<RecordingEmitter>,
}

impl<T> VirtualSession<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn start(initial: T) -> Self {
        let clock = Arc::new(ManualClock::new());
        let timers = Arc::new(VirtualTimers::new(Arc::clone(&clock)));
        let events = Arc::new(RecordingEmitter::new());
        let deps = ThrottleDeps::new(timers.clone())
            .with_clock(clock.clone())
            .with_events(events.clone());
        Self {
            controller: ThrottleController::new(initial, deps),
            clock,
            timers,
            events,
        }
    }

    /// Move the clock to `at` (relative to session start), firing due timers.
    pub fn run_until(&self, at: Duration) {
        let elapsed = self.clock.elapsed();
        assert!(at >= elapsed, "cannot run backwards: at {at:?}, now {elapsed:?}");
        self.timers.advance(at - elapsed);
    }

    /// Feed `value` at `at` (relative to session start).
    pub fn input_at(&self, at: Duration, value: T, delay: Duration) -> vthrottle::Transition {
        self.run_until(at);
        self.controller
            .on_input_changed_now(value, delay)
            .expect("virtual timers never fail unless told to")
    }
}
