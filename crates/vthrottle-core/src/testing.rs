//! Deterministic test doubles for the throttle ports.
//!
//! Available with the `test-utils` feature. `VirtualTimers` shares a
//! `ManualClock` and fires due tasks, in due order, when time is advanced
//! through it. Nothing here sleeps.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::events::ThrottleEvent;
use crate::ports::{Clock, ThrottleEventEmitter, TimerError, TimerHandle, TimerService, TimerTask};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        let origin = Instant::now();
        Self {
            origin,
            now: Mutex::new(origin),
        }
    }

    /// Instant the clock started at ("t = 0").
    pub const fn origin(&self) -> Instant {
        self.origin
    }

    /// Time since [`Self::origin`].
    pub fn elapsed(&self) -> Duration {
        self.now().duration_since(self.origin)
    }

    /// Move the clock forward without firing any timers.
    pub fn advance(&self, by: Duration) {
        *lock(&self.now) += by;
    }

    pub fn set(&self, to: Instant) {
        *lock(&self.now) = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *lock(&self.now)
    }
}

struct Scheduled {
    handle: TimerHandle,
    /// `None` for delays past the end of representable time; never fires.
    due: Option<Instant>,
    task: TimerTask,
}

/// Virtual-time scheduler.
pub struct VirtualTimers {
    clock: Arc<ManualClock>,
    queue: Mutex<Vec<Scheduled>>,
    next_id: AtomicU64,
    scheduled: AtomicUsize,
    canceled: AtomicUsize,
    max_live: AtomicUsize,
    fail_with: Mutex<Option<TimerError>>,
}

impl VirtualTimers {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            clock,
            queue: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            scheduled: AtomicUsize::new(0),
            canceled: AtomicUsize::new(0),
            max_live: AtomicUsize::new(0),
            fail_with: Mutex::new(None),
        }
    }

    /// Advance the shared clock by `by`, firing every task that comes due.
    ///
    /// Tasks fire in due order with the clock set to their due instant, and
    /// are run without the queue locked so they may call back into the
    /// scheduler.
    pub fn advance(&self, by: Duration) {
        let target = self.clock.now() + by;
        while let Some((due, task)) = self.pop_due(target) {
            self.clock.set(due);
            task(due);
        }
        self.clock.set(target);
    }

    /// Number of scheduled tasks that have neither fired nor been canceled.
    pub fn live(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Highest number of simultaneously live tasks seen so far.
    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    /// Total tasks ever scheduled.
    pub fn scheduled(&self) -> usize {
        self.scheduled.load(Ordering::SeqCst)
    }

    /// Total successful cancellations.
    pub fn canceled(&self) -> usize {
        self.canceled.load(Ordering::SeqCst)
    }

    /// Due instant of the earliest live task.
    pub fn next_due(&self) -> Option<Instant> {
        lock(&self.queue).iter().filter_map(|s| s.due).min()
    }

    /// Make every following `schedule_after` fail with `error`.
    pub fn fail_with(&self, error: TimerError) {
        *lock(&self.fail_with) = Some(error);
    }

    fn pop_due(&self, target: Instant) -> Option<(Instant, TimerTask)> {
        let mut queue = lock(&self.queue);
        let (index, due) = queue
            .iter()
            .enumerate()
            .filter_map(|(index, s)| s.due.map(|due| (index, due, s.handle)))
            .filter(|&(_, due, _)| due <= target)
            .min_by_key(|&(_, due, handle)| (due, handle))
            .map(|(index, due, _)| (index, due))?;
        Some((due, queue.remove(index).task))
    }
}

impl TimerService for VirtualTimers {
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> Result<TimerHandle, TimerError> {
        if let Some(error) = lock(&self.fail_with).clone() {
            return Err(error);
        }

        let handle = TimerHandle::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let due = self.clock.now().checked_add(delay);
        let mut queue = lock(&self.queue);
        queue.push(Scheduled { handle, due, task });
        self.scheduled.fetch_add(1, Ordering::SeqCst);
        self.max_live.fetch_max(queue.len(), Ordering::SeqCst);
        Ok(handle)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        let mut queue = lock(&self.queue);
        let Some(index) = queue.iter().position(|s| s.handle == handle) else {
            return false;
        };
        queue.remove(index);
        self.canceled.fetch_add(1, Ordering::SeqCst);
        true
    }
}

/// Emitter that keeps every event for later assertions.
#[derive(Debug, Default)]
pub struct RecordingEmitter {
    captured: Mutex<Vec<ThrottleEvent>>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ThrottleEvent> {
        lock(&self.captured).clone()
    }
}

impl ThrottleEventEmitter for RecordingEmitter {
    fn emit(&self, event: ThrottleEvent) {
        lock(&self.captured).push(event);
    }
}
