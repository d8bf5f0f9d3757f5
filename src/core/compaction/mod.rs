//! Log compaction policy.
//!
//! Two independently advancing lower bounds decide how much of the log
//! prefix may be physically removed:
//! - the *release index*, raised by the state machine once entries are applied
//! - the *largest index to keep*, raised by whoever still needs entries
//!   physically present (follower catch-up, snapshot transfer, in-flight reads)
//!
//! Everything strictly below `min(release_index, largest_index_to_keep)` that
//! is still stored can be compacted. [`CompactionManager`] runs at most one
//! physical compaction at a time and hands every waiter of a round the same
//! [`CompactResult`].

mod calculation;
mod compaction_manager;

pub use calculation::*;
pub use compaction_manager::*;


use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use serde::Serialize;

use crate::Error;
use crate::LogIndex;
use crate::LogRange;
use crate::SharedError;

/// Which side of the replication the owning log instance plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParticipantRole {
    Leader,
    Follower,
}

/// Why a compaction target fell short of the end of the stored log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompactionStopReason {
    /// The state machine has not released entries beyond `release_index`.
    NotEnoughReleasedEntries { release_index: LogIndex },

    /// A local consumer (snapshot transfer, in-flight read) still needs
    /// entries from `largest_index_to_keep` on.
    KeepIndexLimitsRange { largest_index_to_keep: LogIndex },

    /// The leader keeps entries from `largest_index_to_keep` on because a
    /// follower has not caught up yet.
    LeaderBlocksReleaseEntry { largest_index_to_keep: LogIndex },

    /// Too few entries would be removed. Compaction resumes once the target
    /// reaches `next_compaction_at`.
    CompactionThresholdNotReached { next_compaction_at: LogIndex },

    /// The target does not go past the first stored entry.
    NothingToCompact,
}

impl fmt::Display for CompactionStopReason {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::NotEnoughReleasedEntries { release_index } => {
                write!(f, "entries above release index {release_index} are not released")
            }
            Self::KeepIndexLimitsRange { largest_index_to_keep } => {
                write!(f, "entries from {largest_index_to_keep} on are still required")
            }
            Self::LeaderBlocksReleaseEntry { largest_index_to_keep } => {
                write!(f, "leader keeps entries from {largest_index_to_keep} on for followers")
            }
            Self::CompactionThresholdNotReached { next_compaction_at } => {
                write!(f, "compaction threshold not reached, next compaction at {next_compaction_at}")
            }
            Self::NothingToCompact => write!(f, "nothing to compact"),
        }
    }
}

/// Outcome of one compaction round, delivered to every waiter of that round.
#[derive(Debug, Clone)]
pub struct CompactResult {
    /// Storage failure of the physical compaction, or resignation.
    pub error: Option<SharedError>,

    /// `None` when the log was compacted as far as it extends.
    pub stop_reason: Option<CompactionStopReason>,

    /// Entries physically removed by this round. Empty when nothing ran.
    pub compacted_range: LogRange,
}

pub type SharedCompactResult = Arc<CompactResult>;

impl CompactResult {
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub(crate) fn resigned() -> Self {
        Self {
            error: Some(Error::resigned()),
            stop_reason: None,
            compacted_range: LogRange::default(),
        }
    }
}

/// The most recent physical compaction attempt.
#[derive(Debug, Clone)]
pub struct CompactionRecord {
    /// Removed range on success, requested range on failure.
    pub range: LogRange,
    pub error: Option<SharedError>,
    pub when: SystemTime,
}

/// Read-only diagnostic snapshot of a [`CompactionManager`].
#[derive(Debug, Clone, Default)]
pub struct CompactionStatus {
    pub last_compaction: Option<CompactionRecord>,
    /// Stop reason of the most recent evaluation, whether or not it ran.
    pub last_stop_reason: Option<CompactionStopReason>,
    pub release_index: LogIndex,
    pub largest_index_to_keep: LogIndex,
    pub compaction_in_progress: bool,
}
