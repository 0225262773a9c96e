//! # vthrottle
//!
//! Trailing-edge value throttling for reactive hosts.
//!
//! This crate is a convenience re-export layer. Import workspace crates
//! directly when only one side is needed:
//!
//! - `vthrottle_core` - State machine, controller, ports and settings
//! - `vthrottle_runtime` - Tokio time service, clock and host session
//!
//! ```ignore
//! use vthrottle::{ThrottleSettings, ThrottledValue};
//!
//! let mut search = ThrottledValue::new(String::new(), ThrottleSettings::with_defaults())?;
//! let mut rx = search.subscribe();
//! search.set("ru".to_string())?;
//! search.set("rust".to_string())?;
//! rx.changed().await?; // "rust", once the window closes
//! ```

// =============================================================================
// Workspace Crate Re-exports
// =============================================================================

pub use vthrottle_core::{
    Clock, DEFAULT_DELAY_MS, MAX_DELAY_MS, NoopEmitter, Phase, PublishTrigger, SessionId,
    SettingsError, Step, SystemClock, ThrottleController, ThrottleDeps, ThrottleError,
    ThrottleEvent, ThrottleEventEmitter, ThrottleSettings, ThrottleSettingsUpdate, ThrottleState,
    Ticket, TimerError, TimerHandle, TimerService, TimerTask, Transition, delay_from_millis,
    validate_settings,
};
pub use vthrottle_runtime::{ThrottledValue, TokioClock, TokioTimerService, init_tracing};
