//! Timer utility and a virtual clock implementation.

use std::cell::RefCell;
use std::time::Duration;

use tracing::trace;

/// Handle returned by [`WindowUtils::set_timeout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeoutId(u64);

impl TimeoutId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// `setTimeout`/`clearTimeout` of the hosting window.
pub trait WindowUtils {
    fn set_timeout(&self, handler: Box<dyn FnOnce()>, delay: Duration) -> TimeoutId;

    /// Cancelling an unknown or already fired handle is a no-op.
    fn clear_timeout(&self, id: TimeoutId);
}

struct PendingTimeout {
    id: TimeoutId,
    deadline: Duration,
    handler: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct ClockState {
    now: Duration,
    next_id: u64,
    pending: Vec<PendingTimeout>,
}

/// Deterministic clock. Time only moves in [`ManualTimers::advance`]; due
/// handlers run in deadline order, first-scheduled first on ties.
#[derive(Default)]
pub struct ManualTimers {
    state: RefCell<ClockState>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    pub fn pending_count(&self) -> usize {
        self.state.borrow().pending.len()
    }

    pub fn is_pending(&self, id: TimeoutId) -> bool {
        self.state.borrow().pending.iter().any(|p| p.id == id)
    }

    /// Earliest pending deadline, on the clock's absolute timeline.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.state.borrow().pending.iter().map(|p| p.deadline).min()
    }

    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        self.advance_to(target)
    }

    /// Run every handler due at or before `target`, then set the clock to
    /// `target`. Handlers may schedule or cancel timers; newly scheduled ones
    /// that fall due before `target` also run. Returns the number run.
    pub fn advance_to(&self, target: Duration) -> usize {
        let mut fired = 0;
        while let Some(due) = self.take_due(target) {
            trace!(id = due.id.0, at = ?due.deadline, "timeout fired");
            (due.handler)();
            fired += 1;
        }
        let mut state = self.state.borrow_mut();
        if state.now < target {
            state.now = target;
        }
        fired
    }

    fn take_due(&self, target: Duration) -> Option<PendingTimeout> {
        let mut state = self.state.borrow_mut();
        let index = state
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.deadline <= target)
            .min_by_key(|(_, p)| (p.deadline, p.id))
            .map(|(i, _)| i)?;
        let due = state.pending.remove(index);
        state.now = state.now.max(due.deadline);
        Some(due)
    }
}

impl WindowUtils for ManualTimers {
    fn set_timeout(&self, handler: Box<dyn FnOnce()>, delay: Duration) -> TimeoutId {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = TimeoutId(state.next_id);
        let deadline = state.now + delay;
        state.pending.push(PendingTimeout {
            id,
            deadline,
            handler,
        });
        id
    }

    fn clear_timeout(&self, id: TimeoutId) {
        self.state.borrow_mut().pending.retain(|p| p.id != id);
    }
}
