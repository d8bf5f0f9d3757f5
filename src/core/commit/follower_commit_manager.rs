use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::instrument;
use tracing::trace;

use super::last_stored_index;
use super::CommitListener;
use super::CommitManager;
use super::CommitTracker;
use super::WaitForOutcome;
use crate::CommitConfig;
use crate::DeferredAction;
use crate::LogIndex;
use crate::Scheduler;
use crate::StorageManager;

#[derive(Debug, Default)]
struct FollowerProgress {
    /// Largest commit index the leader reported; may run ahead of the local log.
    leader_commit_index: LogIndex,
}

/// Commit index of a follower: the leader's commit index, but never past
/// the last locally stored entry.
pub struct FollowerCommitManager<S>
where S: StorageManager
{
    storage: Arc<S>,
    tracker: CommitTracker<FollowerProgress>,
}

impl<S> FollowerCommitManager<S>
where S: StorageManager
{
    pub fn new(
        storage: Arc<S>,
        scheduler: Arc<dyn Scheduler>,
        listener: Option<Arc<dyn CommitListener>>,
        config: &CommitConfig,
    ) -> Self {
        let listener = listener.filter(|_| config.notify_listener);
        Self {
            storage,
            tracker: CommitTracker::new(
                FollowerProgress::default(),
                scheduler,
                listener,
                config.log_id.clone(),
            ),
        }
    }

    /// Records the commit index sent by the leader and advances the local
    /// commit index as far as the stored log allows.
    ///
    /// When the commit index moves, the returned action resolves the waiters
    /// that became satisfied and, with a listener configured, schedules its
    /// notification unless one is already queued. The action is empty when
    /// nothing moved.
    #[instrument(skip(self))]
    pub fn update_commit_index(
        &self,
        index: LogIndex,
    ) -> DeferredAction {
        let last_stored = last_stored_index(self.storage.as_ref());
        self.tracker.update(|progress| {
            if index > progress.leader_commit_index {
                progress.leader_commit_index = index;
            } else {
                trace!(%index, leader_commit_index = %progress.leader_commit_index, "stale leader commit index");
            }
            Some(progress.leader_commit_index.min(last_stored))
        })
    }

    /// Re-evaluates after entries were appended locally; a commit index the
    /// leader already reported may now be reachable.
    pub fn on_log_appended(&self) -> DeferredAction {
        let last_stored = last_stored_index(self.storage.as_ref());
        self.tracker
            .update(|progress| Some(progress.leader_commit_index.min(last_stored)))
    }

    pub fn leader_commit_index(&self) -> LogIndex {
        self.tracker.with_role(|progress| progress.leader_commit_index)
    }

    #[cfg(test)]
    pub(crate) fn pending_waiters(&self) -> usize {
        self.tracker.pending_waiters()
    }
}

impl<S> CommitManager for FollowerCommitManager<S>
where S: StorageManager
{
    fn commit_index(&self) -> LogIndex {
        self.tracker.commit_index()
    }

    fn wait_for(
        &self,
        index: LogIndex,
    ) -> BoxFuture<'static, WaitForOutcome> {
        self.tracker.wait_for(index)
    }

    fn resign(&self) -> DeferredAction {
        self.tracker.resign()
    }
}

impl<S> std::fmt::Debug for FollowerCommitManager<S>
where S: StorageManager
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("FollowerCommitManager")
            .field("commit_index", &self.tracker.commit_index())
            .finish_non_exhaustive()
    }
}
