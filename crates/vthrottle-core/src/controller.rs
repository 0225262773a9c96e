//! `ThrottleController`: the throttle state machine wired to its ports.
//!
//! The controller owns the published value, the last publish instant and at
//! most one pending timer registered with the injected [`TimerService`].
//! Observers either poll [`ThrottleController::published`] or hold a
//! [`watch::Receiver`] from [`ThrottleController::subscribe`].
//!
//! Timer tasks only hold a `Weak` reference to the controller's shared
//! state, so an outstanding timer never keeps a dropped session alive.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, error, trace, warn};

use crate::error::ThrottleError;
use crate::events::{PublishTrigger, SessionId, ThrottleEvent};
use crate::ports::{
    Clock, NoopEmitter, SystemClock, ThrottleEventEmitter, TimerHandle, TimerService, TimerTask,
};
use crate::state::{Phase, Step, ThrottleState, Ticket};

/// Collaborators injected into a controller.
#[derive(Clone)]
pub struct ThrottleDeps {
    /// Schedules and cancels deferred publishes.
    pub timers: Arc<dyn TimerService>,
    /// Source of "now" for `on_input_changed_now` and construction.
    pub clock: Arc<dyn Clock>,
    /// Receives lifecycle events.
    pub events: Arc<dyn ThrottleEventEmitter>,
}

impl ThrottleDeps {
    /// Deps with the given time service, the system clock and no event listener.
    pub fn new(timers: Arc<dyn TimerService>) -> Self {
        Self {
            timers,
            clock: Arc::new(SystemClock),
            events: Arc::new(NoopEmitter::new()),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn ThrottleEventEmitter>) -> Self {
        self.events = events;
        self
    }
}

/// Outcome of feeding one input to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The input is now the published value.
    Published,
    /// The input will be published after `after` unless superseded.
    Armed { after: Duration },
    /// The controller is torn down; the input was dropped.
    Ignored,
}

struct Inner<T> {
    state: ThrottleState<T>,
    timer: Option<TimerHandle>,
}

struct Shared<T> {
    session_id: SessionId,
    inner: Mutex<Inner<T>>,
    published_tx: watch::Sender<T>,
    events: Arc<dyn ThrottleEventEmitter>,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel_timer(&self, inner: &mut Inner<T>, timers: &dyn TimerService) {
        if let Some(handle) = inner.timer.take() {
            let was_pending = timers.cancel(handle);
            trace!(
                session = %self.session_id,
                timer = %handle,
                was_pending,
                "Retired pending timer"
            );
            self.events.emit(ThrottleEvent::Canceled {
                session_id: self.session_id,
                timer: handle.id(),
            });
        }
    }

    /// Shared by `teardown` and `Drop`; a no-op once torn down.
    fn end_session(&self, timers: &dyn TimerService) {
        let mut inner = self.lock();
        if inner.state.is_torn_down() {
            return;
        }
        inner.state.teardown();
        self.cancel_timer(&mut inner, timers);
        debug!(session = %self.session_id, "Throttle session torn down");
        self.events.emit(ThrottleEvent::TornDown {
            session_id: self.session_id,
        });
    }
}

impl<T: Clone> Shared<T> {
    fn fire(&self, ticket: Ticket, fired_at: Instant) {
        let mut inner = self.lock();
        if inner.state.is_torn_down() {
            warn!(session = %self.session_id, "Timer fired after teardown, ignoring");
            return;
        }
        if !inner.state.on_fire(ticket, fired_at) {
            trace!(
                session = %self.session_id,
                ticket = ticket.get(),
                "Stale timer fired, ignoring"
            );
            return;
        }
        inner.timer = None;
        self.publish(&inner, PublishTrigger::Deferred);
    }

    fn publish(&self, inner: &Inner<T>, trigger: PublishTrigger) {
        self.published_tx.send_replace(inner.state.published().clone());
        debug!(session = %self.session_id, ?trigger, "Published throttled value");
        self.events.emit(ThrottleEvent::Published {
            session_id: self.session_id,
            trigger,
        });
    }
}

/// Trailing-edge throttle for a single value stream.
///
/// # Example
///
/// ```ignore
/// let controller = ThrottleController::new(String::new(), deps);
/// let mut rx = controller.subscribe();
///
/// // On every input change:
/// controller.on_input_changed_now(text.clone(), Duration::from_millis(1000))?;
///
/// // When the owning UI element goes away:
/// controller.teardown();
/// ```
pub struct ThrottleController<T> {
    shared: Arc<Shared<T>>,
    timers: Arc<dyn TimerService>,
    clock: Arc<dyn Clock>,
}

impl<T> ThrottleController<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start a session; `initial` is published immediately at the clock's now.
    pub fn new(initial: T, deps: ThrottleDeps) -> Self {
        let now = deps.clock.now();
        Self::new_at(initial, now, deps)
    }

    /// Start a session with an explicit initial publish instant.
    pub fn new_at(initial: T, now: Instant, deps: ThrottleDeps) -> Self {
        let session_id = SessionId::next();
        let (published_tx, _) = watch::channel(initial.clone());
        debug!(session = %session_id, "Throttle session started");

        let shared = Arc::new(Shared {
            session_id,
            inner: Mutex::new(Inner {
                state: ThrottleState::new(initial, now),
                timer: None,
            }),
            published_tx,
            events: deps.events,
        });

        Self {
            shared,
            timers: deps.timers,
            clock: deps.clock,
        }
    }

    /// Feed a new `(value, delay)` snapshot observed at `now`.
    ///
    /// Publishes immediately when at least `delay` has passed since the last
    /// publish; otherwise retires any pending timer and arms a new one for
    /// the rest of the window, carrying `value`.
    ///
    /// # Errors
    ///
    /// Returns [`ThrottleError::Scheduler`] if the time service refuses the
    /// timer. The controller is then left idle with the previous published
    /// value.
    pub fn on_input_changed(
        &self,
        value: T,
        delay: Duration,
        now: Instant,
    ) -> Result<Transition, ThrottleError> {
        let shared = &self.shared;
        let mut inner = shared.lock();
        let step = inner.state.on_input(value, delay, now);

        // Retire before arming so two timers are never live at once
        if step.retired().is_some() {
            shared.cancel_timer(&mut inner, self.timers.as_ref());
        }

        match step {
            Step::Ignored => {
                trace!(session = %shared.session_id, "Input after teardown, ignoring");
                Ok(Transition::Ignored)
            }
            Step::Published { .. } => {
                shared.publish(&inner, PublishTrigger::Immediate);
                Ok(Transition::Published)
            }
            Step::Armed { ticket, after, .. } => {
                let weak: Weak<Shared<T>> = Arc::downgrade(shared);
                let task: TimerTask = Box::new(move |fired_at: Instant| {
                    if let Some(shared) = weak.upgrade() {
                        shared.fire(ticket, fired_at);
                    }
                });

                match self.timers.schedule_after(after, task) {
                    Ok(handle) => {
                        inner.timer = Some(handle);
                        let remaining_ms = u64::try_from(after.as_millis()).unwrap_or(u64::MAX);
                        debug!(
                            session = %shared.session_id,
                            timer = %handle,
                            remaining_ms,
                            "Deferred publish armed"
                        );
                        shared.events.emit(ThrottleEvent::Armed {
                            session_id: shared.session_id,
                            remaining_ms,
                        });
                        Ok(Transition::Armed { after })
                    }
                    Err(e) => {
                        inner.state.abandon(ticket);
                        error!(
                            session = %shared.session_id,
                            error = %e,
                            "Failed to arm deferred publish"
                        );
                        Err(e.into())
                    }
                }
            }
        }
    }

    /// [`Self::on_input_changed`] using the injected clock for `now`.
    pub fn on_input_changed_now(
        &self,
        value: T,
        delay: Duration,
    ) -> Result<Transition, ThrottleError> {
        self.on_input_changed(value, delay, self.clock.now())
    }

    /// End the session and cancel any pending publish.
    ///
    /// Safe to call any number of times. Once this returns no publish can
    /// happen, even if a timer task is already running.
    pub fn teardown(&self) {
        self.shared.end_session(self.timers.as_ref());
    }

    /// Current published value.
    pub fn published(&self) -> T {
        self.shared.lock().state.published().clone()
    }

    /// Receiver notified on every publish.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.shared.published_tx.subscribe()
    }

    pub fn phase(&self) -> Phase {
        self.shared.lock().state.phase()
    }

    /// When the pending deferred publish is due, if one is armed.
    pub fn pending_due(&self) -> Option<Instant> {
        self.shared.lock().state.pending_due()
    }

    pub fn session_id(&self) -> SessionId {
        self.shared.session_id
    }
}

impl<T> Drop for ThrottleController<T> {
    fn drop(&mut self) {
        self.shared.end_session(self.timers.as_ref());
    }
}
