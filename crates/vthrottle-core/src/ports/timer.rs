//! Time service port.
//!
//! The controller never sleeps or polls. It asks a time service to run a
//! task once a delay has elapsed and keeps the returned handle so the task
//! can be retired when a newer input supersedes it.

use std::fmt;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Identifier of a scheduled task, unique within one time service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Wrap a raw id handed out by a time service.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Work run by the time service when a timer fires.
///
/// Receives the instant at which the timer actually fired, which becomes the
/// new last-publish timestamp.
pub type TimerTask = Box<dyn FnOnce(Instant) + Send + 'static>;

/// Failure to register a timer.
///
/// These indicate a broken environment (no runtime, runtime shutting down),
/// never a throttling decision.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("no async runtime available to schedule timers")]
    NoRuntime,

    #[error("time service has been shut down")]
    ShutDown,

    #[error("failed to schedule timer: {0}")]
    Other(String),
}

/// Push-based scheduler: "call this after `delay`, give me a cancelable handle".
///
/// # Implementations
///
/// - `TokioTimerService` in `vthrottle-runtime`
/// - `VirtualTimers` in `crate::testing` for deterministic tests
pub trait TimerService: Send + Sync {
    /// Schedule `task` to run once `delay` has elapsed.
    ///
    /// Must return without running the task inline.
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> Result<TimerHandle, TimerError>;

    /// Cancel a scheduled task.
    ///
    /// Returns `true` if the task was still pending. Canceling an unknown or
    /// already fired handle is a no-op.
    fn cancel(&self, handle: TimerHandle) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_handle_display() {
        assert_eq!(TimerHandle::new(7).to_string(), "timer-7");
        assert_eq!(TimerHandle::new(7).id(), 7);
    }

    #[test]
    fn test_timer_error_messages() {
        assert_eq!(
            TimerError::NoRuntime.to_string(),
            "no async runtime available to schedule timers"
        );
        assert_eq!(
            TimerError::Other("queue full".to_string()).to_string(),
            "failed to schedule timer: queue full"
        );
    }
}
