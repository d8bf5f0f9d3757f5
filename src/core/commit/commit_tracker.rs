use std::sync::Arc;
use std::sync::Weak;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::CommitListener;
use super::WaitForOutcome;
use super::WaitForResult;
use crate::metrics;
use crate::DeferredAction;
use crate::Error;
use crate::Guarded;
use crate::IndexWaitQueue;
use crate::LogIndex;
use crate::Scheduler;

/// Commit state guarded by a single lock. `R` carries the role-specific
/// progress the commit index is derived from.
#[derive(Debug)]
pub(crate) struct CommitState<R> {
    commit_index: LogIndex,
    waiters: IndexWaitQueue<WaitForOutcome>,

    /// Last index handed to the listener.
    notified_index: LogIndex,
    /// A notification job is queued or running.
    notification_scheduled: bool,

    resigned: bool,

    pub(crate) role: R,
}

/// Commit index, waiters and listener notification shared by the leader and
/// follower commit managers.
pub(crate) struct CommitTracker<R> {
    state: Arc<Guarded<CommitState<R>>>,
    listener: Option<Arc<dyn CommitListener>>,
    scheduler: Arc<dyn Scheduler>,
    log_id: String,
}

impl<R> CommitTracker<R>
where R: Send + 'static
{
    pub(crate) fn new(
        role: R,
        scheduler: Arc<dyn Scheduler>,
        listener: Option<Arc<dyn CommitListener>>,
        log_id: String,
    ) -> Self {
        Self {
            state: Arc::new(Guarded::new(CommitState {
                commit_index: LogIndex::ZERO,
                waiters: IndexWaitQueue::new(),
                notified_index: LogIndex::ZERO,
                notification_scheduled: false,
                resigned: false,
                role,
            })),
            listener,
            scheduler,
            log_id,
        }
    }

    pub(crate) fn commit_index(&self) -> LogIndex {
        self.state.do_under_lock(|state| state.commit_index)
    }

    pub(crate) fn with_role<T>(
        &self,
        f: impl FnOnce(&R) -> T,
    ) -> T {
        self.state.do_under_lock(|state| f(&state.role))
    }

    pub(crate) fn wait_for(
        &self,
        index: LogIndex,
    ) -> BoxFuture<'static, WaitForOutcome> {
        let mut state = self.state.lock();
        if index <= state.commit_index {
            let reached = WaitForResult {
                commit_index: state.commit_index,
            };
            return futures::future::ready(Ok(reached)).boxed();
        }
        if state.resigned {
            return futures::future::ready(Err(Error::resigned())).boxed();
        }
        trace!(%index, commit_index = %state.commit_index, "waiting for commit index");
        state.waiters.wait_for(index, || Err(Error::resigned()))
    }

    /// Lets `f` update the role progress and propose a commit index.
    ///
    /// A proposal above the current commit index is applied; the returned
    /// action resolves the waiters it reaches and schedules the listener
    /// notification if none is queued yet. An advance with no waiters
    /// therefore still yields a non-empty action when a listener is set.
    /// Proposals that do not raise the index yield an empty action.
    pub(crate) fn update(
        &self,
        f: impl FnOnce(&mut R) -> Option<LogIndex>,
    ) -> DeferredAction {
        let mut state = self.state.lock();
        if state.resigned {
            warn!("commit index update after resignation ignored");
            return DeferredAction::empty();
        }

        let Some(candidate) = f(&mut state.role) else {
            return DeferredAction::empty();
        };
        if candidate <= state.commit_index {
            trace!(%candidate, commit_index = %state.commit_index, "commit index not raised");
            return DeferredAction::empty();
        }

        debug!(old = %state.commit_index, new = %candidate, "commit index advanced");
        state.commit_index = candidate;
        metrics::record_index(&self.log_id, metrics::INDEX_COMMIT, candidate);

        let mut action = state.waiters.resolve_up_to(
            candidate,
            Ok(WaitForResult {
                commit_index: candidate,
            }),
        );
        action.merge(self.schedule_notification(&mut state));
        action
    }

    pub(crate) fn resign(&self) -> DeferredAction {
        let mut state = self.state.lock();
        if state.resigned {
            return DeferredAction::empty();
        }
        state.resigned = true;
        debug!(pending = state.waiters.len(), "commit tracker resigned");
        state.waiters.resolve_all(Err(Error::resigned()))
    }

    #[cfg(test)]
    pub(crate) fn pending_waiters(&self) -> usize {
        self.state.do_under_lock(|state| state.waiters.len())
    }

    fn schedule_notification(
        &self,
        state: &mut CommitState<R>,
    ) -> DeferredAction {
        let Some(listener) = self.listener.clone() else {
            return DeferredAction::empty();
        };
        if state.notification_scheduled {
            trace!("listener notification already scheduled");
            return DeferredAction::empty();
        }
        state.notification_scheduled = true;

        let weak = Arc::downgrade(&self.state);
        let scheduler = self.scheduler.clone();
        DeferredAction::new(move || {
            scheduler.schedule("commit-notification", Self::notify_listener(weak, listener).boxed());
        })
    }

    /// Reports the latest commit index until the listener has seen it.
    /// Runs as a single job, so the listener observes increasing indexes.
    async fn notify_listener(
        state: Weak<Guarded<CommitState<R>>>,
        listener: Arc<dyn CommitListener>,
    ) {
        let Some(state) = state.upgrade() else {
            trace!("commit tracker dropped before notification");
            return;
        };
        loop {
            let next = state.do_under_lock(|state| {
                if !state.resigned && state.commit_index > state.notified_index {
                    state.notified_index = state.commit_index;
                    Some(state.commit_index)
                } else {
                    state.notification_scheduled = false;
                    None
                }
            });
            match next {
                Some(index) => listener.on_commit_index_advanced(index),
                None => break,
            }
        }
    }
}

impl<R> Drop for CommitTracker<R> {
    fn drop(&mut self) {
        let action = {
            let mut state = self.state.lock();
            state.resigned = true;
            state.waiters.resolve_all(Err(Error::resigned()))
        };
        action.fire();
    }
}
