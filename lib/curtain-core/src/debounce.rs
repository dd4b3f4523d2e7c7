//! Trailing-edge debouncing.
//!
//! A burst of calls closer together than the delay collapses into one invocation of the wrapped
//! action, carrying the arguments of the last call in the burst.

use crate::timer::{duration_from_ms, TimerSlot};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

/// Delay used when the requested one is not a finite number of milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 200;

type Action<A> = Arc<dyn Fn(A) + Send + Sync>;

struct DebounceInner<A> {
    action: Action<A>,
    delay: Duration,
    pending: Mutex<TimerSlot>,
}

/// Handle to a debounced action. Clones share the same pending invocation.
///
/// Dropping the last handle cancels whatever is still pending.
pub struct Debounced<A> {
    inner: Arc<DebounceInner<A>>,
}

impl<A> Clone for Debounced<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A> Debounced<A>
where
    A: Send + 'static,
{
    pub fn new<F>(delay: Duration, action: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(DebounceInner {
                action: Arc::new(action),
                delay,
                pending: Mutex::new(TimerSlot::new()),
            }),
        }
    }

    /// Binds `method` to a context captured now, instead of one looked up when the action fires.
    pub fn bound<C>(context: Arc<C>, delay: Duration, method: fn(&C, A)) -> Self
    where
        C: Send + Sync + 'static,
    {
        Self::new(delay, move |args| method(&context, args))
    }

    /// Schedules the action with `args`, replacing any invocation that has not fired yet.
    pub fn call(&self, args: A) {
        let weak: Weak<DebounceInner<A>> = Arc::downgrade(&self.inner);
        let mut pending = self.lock_pending();
        pending.arm(self.inner.delay, move |token| {
            let Some(inner) = weak.upgrade() else {
                return;
            };

            let live = inner
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .settle(token);

            // The slot lock is released before running the action so it may call back in.
            if live {
                (inner.action)(args);
            }
        });
    }

    /// Cancels the pending invocation. Does nothing if none is scheduled.
    pub fn cancel(&self) {
        self.lock_pending().clear();
    }

    pub fn is_pending(&self) -> bool {
        self.lock_pending().is_armed()
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, TimerSlot> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Converts a millisecond delay to a [`Duration`].
///
/// Zero and negative delays become zero (still deferred, never synchronous). Non-finite values
/// fall back to [`DEFAULT_DELAY_MS`].
pub fn delay_from_ms(delay_ms: f64) -> Duration {
    if !delay_ms.is_finite() {
        return Duration::from_millis(DEFAULT_DELAY_MS);
    }
    if delay_ms <= 0.0 {
        return Duration::ZERO;
    }
    duration_from_ms(delay_ms)
}

/// Wraps `action` so repeated calls within `delay_ms` collapse into one trailing invocation.
pub fn debounce<A, F>(action: F, delay_ms: f64) -> Debounced<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    Debounced::new(delay_from_ms(delay_ms), action)
}
