use std::collections::HashMap;
use std::sync::Arc;

use config::ConfigError;
use futures::future::BoxFuture;
use tracing::debug;
use tracing::instrument;
use tracing::trace;
use tracing::warn;

use super::last_stored_index;
use super::CommitListener;
use super::CommitManager;
use super::CommitTracker;
use super::NodeId;
use super::WaitForOutcome;
use crate::CommitConfig;
use crate::DeferredAction;
use crate::Error;
use crate::LogIndex;
use crate::ReplicatedLogError;
use crate::Result;
use crate::Scheduler;
use crate::StorageManager;

#[derive(Debug)]
struct LeaderQuorum {
    /// Highest index each participant acknowledged as stored.
    acknowledged: HashMap<NodeId, LogIndex>,
    write_concern: usize,
    /// First entry of the current term. Earlier entries only commit
    /// implicitly, together with one of this term.
    term_start_index: LogIndex,
}

impl LeaderQuorum {
    /// Highest index held by at least `write_concern` participants, the
    /// leader's own log included.
    fn quorum_index(
        &self,
        last_stored: LogIndex,
    ) -> Option<LogIndex> {
        let mut matched: Vec<LogIndex> = self.acknowledged.values().copied().collect();
        matched.push(last_stored);

        // Sort in descending order
        matched.sort_unstable_by(|a, b| b.cmp(a));

        let quorum_index = (*matched.get(self.write_concern - 1)?).min(last_stored);
        trace!(?matched, %quorum_index, write_concern = self.write_concern, "quorum calculation");

        if quorum_index < self.term_start_index {
            trace!(%quorum_index, term_start_index = %self.term_start_index, "quorum below current term");
            return None;
        }
        Some(quorum_index)
    }
}

/// Commit index of a leader, derived from participant acknowledgments.
pub struct LeaderCommitManager<S>
where S: StorageManager
{
    storage: Arc<S>,
    tracker: CommitTracker<LeaderQuorum>,
}

impl<S> LeaderCommitManager<S>
where S: StorageManager
{
    /// `participants` are the followers; the leader itself always counts
    /// towards the write concern.
    pub fn new(
        storage: Arc<S>,
        scheduler: Arc<dyn Scheduler>,
        listener: Option<Arc<dyn CommitListener>>,
        config: &CommitConfig,
        participants: impl IntoIterator<Item = NodeId>,
        term_start_index: LogIndex,
    ) -> Result<Self> {
        let acknowledged: HashMap<NodeId, LogIndex> = participants
            .into_iter()
            .map(|id| (id, LogIndex::ZERO))
            .collect();

        if config.write_concern == 0 || config.write_concern > acknowledged.len() + 1 {
            return Err(Error::Config(ConfigError::Message(format!(
                "commit.write_concern {} does not fit {} participants plus the leader",
                config.write_concern,
                acknowledged.len()
            ))));
        }

        debug!(
            participants = acknowledged.len(),
            write_concern = config.write_concern,
            %term_start_index,
            "leader commit manager created"
        );
        let quorum = LeaderQuorum {
            acknowledged,
            write_concern: config.write_concern,
            term_start_index,
        };
        let listener = listener.filter(|_| config.notify_listener);
        Ok(Self {
            storage,
            tracker: CommitTracker::new(quorum, scheduler, listener, config.log_id.clone()),
        })
    }

    /// Records that participant `id` stored every entry up to `index` and
    /// advances the commit index if a quorum now holds more.
    ///
    /// Acknowledgments never move backwards; a lower `index` is ignored.
    #[instrument(skip(self))]
    pub fn update_participant_index(
        &self,
        id: NodeId,
        index: LogIndex,
    ) -> Result<DeferredAction> {
        let last_stored = last_stored_index(self.storage.as_ref());
        let mut unknown = false;
        let action = self.tracker.update(|quorum| {
            let Some(acknowledged) = quorum.acknowledged.get_mut(&id) else {
                unknown = true;
                return None;
            };
            if index <= *acknowledged {
                trace!(%index, acknowledged = %*acknowledged, "stale acknowledgment");
                return None;
            }
            *acknowledged = index;
            quorum.quorum_index(last_stored)
        });

        if unknown {
            warn!(id, "acknowledgment from unknown participant");
            return Err(ReplicatedLogError::InvalidParticipant { id }.into());
        }
        Ok(action)
    }

    /// Re-evaluates after the leader appended entries to its own log.
    pub fn on_log_appended(&self) -> DeferredAction {
        let last_stored = last_stored_index(self.storage.as_ref());
        self.tracker.update(|quorum| quorum.quorum_index(last_stored))
    }

    /// Lowest index acknowledged by every participant, the leader's own
    /// log included. Entries from here on are still needed for catch-up.
    pub fn lowest_acknowledged_index(&self) -> LogIndex {
        let last_stored = last_stored_index(self.storage.as_ref());
        self.tracker.with_role(|quorum| {
            quorum
                .acknowledged
                .values()
                .copied()
                .fold(last_stored, LogIndex::min)
        })
    }

    pub fn participant_index(
        &self,
        id: NodeId,
    ) -> Option<LogIndex> {
        self.tracker.with_role(|quorum| quorum.acknowledged.get(&id).copied())
    }

    #[cfg(test)]
    pub(crate) fn pending_waiters(&self) -> usize {
        self.tracker.pending_waiters()
    }
}

impl<S> CommitManager for LeaderCommitManager<S>
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

impl<S> std::fmt::Debug for LeaderCommitManager<S>
where S: StorageManager
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("LeaderCommitManager")
            .field("commit_index", &self.tracker.commit_index())
            .finish_non_exhaustive()
    }
}
