use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Upper bound on how long a loop blocks on shared-state notifications before
/// re-checking its stop signal.
pub const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

struct Inner {
    stopped: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

/// Cooperative cancellation shared by every loop.
///
/// `sleep` doubles as the loops' only way to wait on a timer, so a stop
/// request interrupts any pending delay immediately.
#[derive(Clone)]
pub struct StopSignal {
    inner: Arc<Inner>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                stopped: AtomicBool::new(false),
                lock: Mutex::new(()),
                wake: Condvar::new(),
            }),
        }
    }

    pub fn trigger(&self) {
        self.inner.stopped.store(true, Ordering::Release);
        let _guard = self.inner.lock.lock();
        self.inner.wake.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire)
    }

    /// Sleep for `duration` unless stopped first. Returns `true` when the full
    /// duration elapsed, `false` when a stop request cut it short.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut guard = self.inner.lock.lock();
        while !self.is_stopped() {
            if self.inner.wake.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }
        !self.is_stopped()
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}
