//! Tokio adapters for `vthrottle-core`.
//!
//! - `TokioTimerService` - `TimerService` backed by spawned sleeping tasks
//! - `TokioClock` - `Clock` backed by `tokio::time::Instant` (honours paused time)
//! - `ThrottledValue` - host session binding with change detection
//! - `init_tracing` - subscriber setup for binaries and examples

#![deny(unused_crate_dependencies)]

mod clock;
mod logging;
mod session;
mod timer;

pub use clock::TokioClock;
pub use logging::init_tracing;
pub use session::ThrottledValue;
pub use timer::TokioTimerService;

#[cfg(test)]
use tokio_test as _;
