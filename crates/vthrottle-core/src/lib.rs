//! Core domain for `vthrottle`: a trailing-edge value throttle.
//!
//! The crate is split the same way the rest of the workspace is:
//!
//! - `state` - pure throttle state machine, no clocks or timers attached
//! - `controller` - `ThrottleController`, the state machine wired to ports
//! - `ports` - traits for the time service, clock and event emitter
//! - `events` - serializable lifecycle events
//! - `settings` - delay configuration and validation
//!
//! Adapters (tokio timers, host sessions) live in `vthrottle-runtime`.

#![deny(unused_crate_dependencies)]

pub mod controller;
pub mod error;
pub mod events;
pub mod ports;
pub mod settings;
pub mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use controller::{ThrottleController, ThrottleDeps, Transition};
pub use error::ThrottleError;
pub use events::{PublishTrigger, SessionId, ThrottleEvent};
pub use ports::{
    Clock, NoopEmitter, SystemClock, ThrottleEventEmitter, TimerError, TimerHandle, TimerService,
    TimerTask,
};
pub use settings::{
    DEFAULT_DELAY_MS, MAX_DELAY_MS, SettingsError, ThrottleSettings, ThrottleSettingsUpdate,
    delay_from_millis, validate_settings,
};
pub use state::{Phase, Step, ThrottleState, Ticket};

#[cfg(test)]
use serde_json as _;
