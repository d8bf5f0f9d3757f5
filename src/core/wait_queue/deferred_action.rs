use std::fmt;

use tracing::trace;

type Action = Box<dyn FnOnce() + Send + 'static>;

/// Work produced inside a critical section that must run after the lock is
/// released: resolving waiters, scheduling listener notifications, spawning
/// a compaction pass.
///
/// Call [`DeferredAction::fire`] once the lock guard is gone. A dropped
/// action fires whatever it still holds, so no waiter is ever lost.
#[must_use = "deferred actions must be fired after the lock is released"]
#[derive(Default)]
pub struct DeferredAction {
    actions: Vec<Action>,
}

impl DeferredAction {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            actions: vec![Box::new(action)],
        }
    }

    pub fn push(
        &mut self,
        action: impl FnOnce() + Send + 'static,
    ) {
        self.actions.push(Box::new(action));
    }

    /// Appends `other`; both sets fire together, in insertion order.
    pub fn merge(
        &mut self,
        mut other: DeferredAction,
    ) {
        self.actions.append(&mut other.actions);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn fire(mut self) {
        self.run_all();
    }

    fn run_all(&mut self) {
        if self.actions.is_empty() {
            return;
        }
        trace!(count = self.actions.len(), "firing deferred actions");
        for action in self.actions.drain(..) {
            action();
        }
    }
}

impl Drop for DeferredAction {
    fn drop(&mut self) {
        self.run_all();
    }
}

impl fmt::Debug for DeferredAction {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("DeferredAction")
            .field("pending", &self.actions.len())
            .finish()
    }
}
