//! Host-side session binding.
//!
//! UI layers usually re-run their effects only when a watched input actually
//! changed. `ThrottledValue` gives non-reactive hosts the same behaviour: it
//! remembers the latest input and delay and only feeds the controller when
//! one of them changed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;
use vthrottle_core::{
    Phase, ThrottleController, ThrottleDeps, ThrottleError, ThrottleSettings,
    ThrottleSettingsUpdate, Transition, validate_settings,
};

use crate::clock::TokioClock;
use crate::timer::TokioTimerService;

/// A throttled view of a changing value, bound to one session.
///
/// Dropping it (or calling [`ThrottledValue::close`]) tears the session down.
pub struct ThrottledValue<T> {
    controller: ThrottleController<T>,
    settings: ThrottleSettings,
    latest: T,
    delay: Duration,
}

impl<T> ThrottledValue<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Start a session on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Fails if the settings are invalid or no tokio runtime is running.
    pub fn new(initial: T, settings: ThrottleSettings) -> Result<Self, ThrottleError> {
        let timers = TokioTimerService::new()?;
        let deps = ThrottleDeps::new(Arc::new(timers)).with_clock(Arc::new(TokioClock));
        Self::with_deps(initial, settings, deps)
    }

    /// Start a session with explicit collaborators.
    pub fn with_deps(
        initial: T,
        settings: ThrottleSettings,
        deps: ThrottleDeps,
    ) -> Result<Self, ThrottleError> {
        validate_settings(&settings)?;
        let delay = settings.effective_delay();
        let controller = ThrottleController::new(initial.clone(), deps);
        debug!(
            session = %controller.session_id(),
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "Throttled value bound"
        );
        Ok(Self {
            controller,
            settings,
            latest: initial,
            delay,
        })
    }

    /// Record a new input.
    ///
    /// Returns `Ok(None)` when change detection skipped an input equal to
    /// the previous one.
    pub fn set(&mut self, value: T) -> Result<Option<Transition>, ThrottleError> {
        if self.settings.effective_skip_unchanged() && value == self.latest {
            return Ok(None);
        }
        self.latest = value;
        self.evaluate().map(Some)
    }

    /// Change the throttle window, re-evaluating the latest input against it.
    ///
    /// The delay is validated like a settings update and becomes the stored
    /// `delay_ms`. On failure the current window is kept.
    pub fn set_delay(&mut self, delay: Duration) -> Result<Option<Transition>, ThrottleError> {
        let next = ThrottleSettings {
            delay_ms: ThrottleSettings::with_delay(delay).delay_ms,
            ..self.settings.clone()
        };
        validate_settings(&next)?;
        self.settings = next;
        self.retarget(delay)
    }

    /// Apply a partial settings update.
    ///
    /// Only an update that touches the delay re-evaluates the latest input.
    /// On validation failure the current settings are kept.
    pub fn apply_settings(
        &mut self,
        update: &ThrottleSettingsUpdate,
    ) -> Result<Option<Transition>, ThrottleError> {
        let mut next = self.settings.clone();
        next.merge(update);
        validate_settings(&next)?;
        let delay = next.effective_delay();
        self.settings = next;
        if update.delay_ms.is_none() {
            return Ok(None);
        }
        self.retarget(delay)
    }

    /// Currently published value.
    pub fn get(&self) -> T {
        self.controller.published()
    }

    /// Most recent input, published or not.
    pub const fn latest(&self) -> &T {
        &self.latest
    }

    pub const fn delay(&self) -> Duration {
        self.delay
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.controller.subscribe()
    }

    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    /// End the session. Pending publishes are dropped.
    pub fn close(self) {
        self.controller.teardown();
    }

    fn retarget(&mut self, delay: Duration) -> Result<Option<Transition>, ThrottleError> {
        if delay == self.delay {
            return Ok(None);
        }
        self.delay = delay;
        self.evaluate().map(Some)
    }

    fn evaluate(&self) -> Result<Transition, ThrottleError> {
        self.controller
            .on_input_changed_now(self.latest.clone(), self.delay)
    }
}
