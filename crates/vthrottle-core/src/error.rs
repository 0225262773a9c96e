//! Error type for controller and session operations.

use thiserror::Error;

use crate::ports::TimerError;
use crate::settings::SettingsError;

/// Errors surfaced by throttle operations.
///
/// Throttling itself is total over its inputs; these only report a broken
/// environment or rejected configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ThrottleError {
    /// The time service refused to arm a deferred publish.
    #[error("time service rejected deferred publish: {0}")]
    Scheduler(#[from] TimerError),

    #[error("invalid throttle settings: {0}")]
    Settings(#[from] SettingsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_timer_error() {
        let err: ThrottleError = TimerError::ShutDown.into();
        assert_eq!(
            err.to_string(),
            "time service rejected deferred publish: time service has been shut down"
        );
    }
}
