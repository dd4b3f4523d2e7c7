use log::{trace, warn};
use once_cell::sync::OnceCell;
use std::thread;
use std::time::Duration;
use tokio::runtime::{Builder, Handle};
use tokio::task::JoinHandle;

/// Runtime used for timers armed outside of any tokio runtime. Started on first use.
static TIMER_RUNTIME: OnceCell<Option<Handle>> = OnceCell::new();

/// Converts a non-negative, finite millisecond count to a [`Duration`] with microsecond precision.
pub fn duration_from_ms(ms: f64) -> Duration {
    Duration::from_micros((ms.max(0.0) * 1000.0).round() as u64)
}

/// The runtime the caller is in, or the shared timer runtime when there is none.
fn timer_handle() -> Option<Handle> {
    if let Ok(handle) = Handle::try_current() {
        return Some(handle);
    }
    TIMER_RUNTIME.get_or_init(start_timer_runtime).clone()
}

fn start_timer_runtime() -> Option<Handle> {
    let rt = match Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            warn!("Failed to start timer runtime: {}", e);
            return None;
        }
    };
    let handle = rt.handle().clone();

    let spawned = thread::Builder::new()
        .name("curtain-timers".to_string())
        .spawn(move || {
            rt.block_on(std::future::pending::<()>());
        });

    match spawned {
        Ok(_) => {
            trace!("Started timer runtime thread");
            Some(handle)
        }
        Err(e) => {
            warn!("Failed to spawn timer thread: {}", e);
            None
        }
    }
}

/// A single-shot callback scheduled on a tokio runtime.
///
/// The callback never runs synchronously from `new`, even for a zero delay. Cancelling (or
/// dropping) the timeout before it elapses guarantees the callback will not run.
pub struct Timeout {
    handle: Option<JoinHandle<()>>,
}

impl Timeout {
    /// Runs on the current tokio runtime if there is one, otherwise on a background timer thread.
    /// If no runtime can be started at all the timeout never fires.
    pub fn new<F>(delay: Duration, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = timer_handle().map(|rt| {
            rt.spawn(async move {
                tokio::time::sleep(delay).await;
                callback();
            })
        });

        Self { handle }
    }

    pub fn cancel(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Releases the timeout without aborting it. Used by a callback that is settling its own slot.
    fn detach(mut self) {
        self.handle.take();
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Identifies one arming of a [`TimerSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

/// Holds at most one live [`Timeout`]. Arming always cancels whatever was in the slot first.
///
/// Callbacks receive the [`TimerToken`] of the arming that scheduled them and must call
/// [`TimerSlot::settle`] before acting. A stale token means the timer was cancelled or superseded
/// after its task had already been woken, and the callback has to do nothing.
#[derive(Default)]
pub struct TimerSlot {
    armed: Option<(TimerToken, Timeout)>,
    next_token: u64,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm<F>(&mut self, delay: Duration, callback: F) -> TimerToken
    where
        F: FnOnce(TimerToken) + Send + 'static,
    {
        self.clear();

        self.next_token += 1;
        let token = TimerToken(self.next_token);
        let timeout = Timeout::new(delay, move || callback(token));
        self.armed = Some((token, timeout));
        token
    }

    /// Cancels the live timer, if any. Returns whether something was cancelled.
    pub fn clear(&mut self) -> bool {
        match self.armed.take() {
            Some((_, timeout)) => {
                timeout.cancel();
                true
            }
            None => false,
        }
    }

    /// Called from a firing callback. Returns true and empties the slot only if `token` is the
    /// live arming.
    pub fn settle(&mut self, token: TimerToken) -> bool {
        match self.armed.take() {
            Some((live, timeout)) if live == token => {
                timeout.detach();
                true
            }
            other => {
                self.armed = other;
                false
            }
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }
}
