//! Commit index tracking.
//!
//! The commit index is the highest entry guaranteed durable under the
//! replication policy. It only moves forward. Callers wait for
//! "commit >= N"; every advance resolves the waiters it reaches and notifies
//! the registered [`CommitListener`], both outside the lock.
//!
//! Two variants share the same tracking core:
//! - [`FollowerCommitManager`] follows the commit index the leader sends,
//!   bounded by what is stored locally.
//! - [`LeaderCommitManager`] derives the commit index from participant
//!   acknowledgments.

mod commit_tracker;
mod follower_commit_manager;
mod leader_commit_manager;

pub(crate) use commit_tracker::*;
pub use follower_commit_manager::*;
pub use leader_commit_manager::*;


use futures::future::BoxFuture;
#[cfg(test)]
use mockall::automock;

use crate::DeferredAction;
use crate::LogIndex;
use crate::SharedError;
use crate::StorageManager;

/// Identifies a replication participant.
pub type NodeId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitForResult {
    /// Commit index at the time the waiter was resolved.
    pub commit_index: LogIndex,
}

pub type WaitForOutcome = std::result::Result<WaitForResult, SharedError>;

/// Read side shared by both commit manager variants.
pub trait CommitManager: Send + Sync {
    fn commit_index(&self) -> LogIndex;

    /// Resolves once the commit index reaches `index`; immediately if it
    /// already has. Resolves with a resigned error on shutdown.
    fn wait_for(
        &self,
        index: LogIndex,
    ) -> BoxFuture<'static, WaitForOutcome>;

    /// Resolves every outstanding waiter with a resigned error and ignores
    /// further updates.
    fn resign(&self) -> DeferredAction;
}

/// Downstream state handle told about commit advances.
///
/// Called from the scheduler, never under a lock, with strictly increasing
/// indexes. Back-to-back advances may be reported as one call carrying the
/// latest index.
#[cfg_attr(test, automock)]
pub trait CommitListener: Send + Sync + 'static {
    fn on_commit_index_advanced(
        &self,
        commit_index: LogIndex,
    );
}

/// Highest index the storage holds or has held before compaction.
pub(crate) fn last_stored_index<S: StorageManager>(storage: &S) -> LogIndex {
    storage.get_committed_log_bounds().to.saturating_prev()
}
