//! `TimerService` backed by the tokio runtime.
//!
//! Each scheduled task is a spawned future that sleeps and then runs the
//! task. Cancellation aborts the future; the controller's ticket check covers
//! the window where the sleep already finished and the task is waiting on
//! the controller lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{trace, warn};
use vthrottle_core::{TimerError, TimerHandle, TimerService, TimerTask};

type TaskMap = Arc<Mutex<HashMap<TimerHandle, AbortHandle>>>;

fn lock(tasks: &TaskMap) -> MutexGuard<'_, HashMap<TimerHandle, AbortHandle>> {
    tasks.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tokio-backed time service.
///
/// Dropping the service aborts every timer it still owns.
pub struct TokioTimerService {
    runtime: Handle,
    tasks: TaskMap,
    next_id: AtomicU64,
}

impl TokioTimerService {
    /// Bind to the runtime the caller is running on.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::NoRuntime`] when called outside a tokio runtime.
    pub fn new() -> Result<Self, TimerError> {
        Handle::try_current()
            .map(Self::with_handle)
            .map_err(|_| TimerError::NoRuntime)
    }

    /// Bind to an explicit runtime handle.
    pub fn with_handle(runtime: Handle) -> Self {
        Self {
            runtime,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of timers that have neither fired nor been canceled.
    pub fn pending(&self) -> usize {
        lock(&self.tasks).len()
    }
}

impl TimerService for TokioTimerService {
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> Result<TimerHandle, TimerError> {
        let handle = TimerHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let tasks = Arc::clone(&self.tasks);

        // Hold the map while spawning so the entry exists before the task can remove it
        let mut guard = lock(&self.tasks);
        let join = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            lock(&tasks).remove(&handle);
            trace!(timer = %handle, "Timer fired");
            task(tokio::time::Instant::now().into_std());
        });

        // A live task cannot finish while we hold the map. One that already
        // has was rejected by a runtime that is shutting down.
        if join.is_finished() {
            warn!(timer = %handle, "Runtime shut down, timer not scheduled");
            return Err(TimerError::ShutDown);
        }
        guard.insert(handle, join.abort_handle());
        Ok(handle)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        let Some(abort) = lock(&self.tasks).remove(&handle) else {
            return false;
        };
        abort.abort();
        trace!(timer = %handle, "Timer aborted");
        true
    }
}

impl Drop for TokioTimerService {
    fn drop(&mut self) {
        for (_, abort) in lock(&self.tasks).drain() {
            abort.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_new_outside_runtime_fails() {
        assert_eq!(TokioTimerService::new().err(), Some(TimerError::NoRuntime));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let timers = TokioTimerService::new().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let start = tokio::time::Instant::now();

        timers
            .schedule_after(
                Duration::from_millis(100),
                Box::new(move |at: std::time::Instant| {
                    assert!(at >= start.into_std() + Duration::from_millis(100));
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();
        assert_eq!(timers.pending(), 1);

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(timers.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_fire() {
        let timers = TokioTimerService::new().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        let handle = timers
            .schedule_after(
                Duration::from_millis(50),
                Box::new(move |_: std::time::Instant| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        assert!(timers.cancel(handle));
        assert!(!timers.cancel(handle));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_schedule_on_shut_down_runtime_fails() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let handle = runtime.handle().clone();
        drop(runtime);

        let timers = TokioTimerService::with_handle(handle);
        let result = timers.schedule_after(
            Duration::from_secs(60),
            Box::new(|_: std::time::Instant| panic!("ran on a dead runtime")),
        );
        assert_eq!(result, Err(TimerError::ShutDown));
        assert_eq!(timers.pending(), 0);
    }
}
