use std::time::Instant;

use vthrottle_core::Clock;

/// Clock reading `tokio::time::Instant`.
///
/// Under a paused test runtime this follows the virtual tokio clock, so it
/// stays consistent with the fire instants `TokioTimerService` reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}
