//! Trailing-edge debouncing of change notifications.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

/// Quiet period before a burst of edits triggers a reformat.
pub const DEFAULT_DELAY_MS: u64 = 200;

/// Millisecond time source for the debouncer.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall-clock time since construction.
#[derive(Debug)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub const fn new() -> Self {
        Self { now: Cell::new(0) }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingTrigger {
    /// When the trigger fires unless replaced.
    due_ms: u64,
    /// When the current burst started, for the max-wait cap.
    burst_start_ms: u64,
}

/// Holds at most one pending trigger.
///
/// [`on_change`](Self::on_change) replaces whatever is pending with a
/// trigger due `delay_ms` from now. The event loop polls
/// [`take_ready`](Self::take_ready), which fires (and clears) a due trigger.
/// Without a max-wait cap an edit stream that never pauses never fires.
pub struct Debouncer {
    delay_ms: u64,
    max_wait_ms: Option<u64>,
    clock: Rc<dyn Clock>,
    pending: Cell<Option<PendingTrigger>>,
}

impl Debouncer {
    pub fn new(delay_ms: u64, clock: Rc<dyn Clock>) -> Self {
        Self {
            delay_ms,
            max_wait_ms: None,
            clock,
            pending: Cell::new(None),
        }
    }

    /// Fire anyway once a burst has been pending for `max_wait_ms`.
    #[must_use]
    pub const fn with_max_wait(mut self, max_wait_ms: Option<u64>) -> Self {
        self.max_wait_ms = max_wait_ms;
        self
    }

    pub const fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Cancel any pending trigger and schedule a fresh one.
    pub fn on_change(&self) {
        let now = self.clock.now_ms();
        let burst_start_ms = self.pending.get().map_or(now, |p| p.burst_start_ms);
        let mut due_ms = now.saturating_add(self.delay_ms);
        if let Some(max_wait) = self.max_wait_ms {
            due_ms = due_ms.min(burst_start_ms.saturating_add(max_wait));
        }
        self.pending.set(Some(PendingTrigger {
            due_ms,
            burst_start_ms,
        }));
    }

    /// True (once) when the pending trigger is due; clears it.
    pub fn take_ready(&self) -> bool {
        let Some(pending) = self.pending.get() else {
            return false;
        };
        let now = self.clock.now_ms();
        if now < pending.due_ms {
            return false;
        }
        self.pending.set(None);
        crate::perf::log_event(
            "debounce.fire",
            format!(
                "now={now} due={} burst_ms={}",
                pending.due_ms,
                now.saturating_sub(pending.burst_start_ms)
            ),
        );
        true
    }

    pub fn cancel(&self) {
        self.pending.set(None);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }

    /// Milliseconds until the pending trigger is due, if one is pending.
    pub fn time_until_due(&self) -> Option<u64> {
        self.pending
            .get()
            .map(|p| p.due_ms.saturating_sub(self.clock.now_ms()))
    }
}

impl fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay_ms", &self.delay_ms)
            .field("max_wait_ms", &self.max_wait_ms)
            .field("pending", &self.pending.get())
            .finish_non_exhaustive()
    }
}
