//! Port definitions (trait abstractions) for the throttle's collaborators.
//!
//! The controller only ever talks to time and observers through these
//! traits. Tokio-backed implementations live in `vthrottle-runtime`;
//! virtual-time implementations for tests live in `crate::testing`.

pub mod clock;
pub mod event_emitter;
pub mod timer;

pub use clock::{Clock, SystemClock};
pub use event_emitter::{NoopEmitter, ThrottleEventEmitter};
pub use timer::{TimerError, TimerHandle, TimerService, TimerTask};
