use super::CompactionStopReason;
use super::ParticipantRole;
use crate::LogIndex;
use crate::LogRange;

/// Decision of a single compaction evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionPlan {
    /// Entries below this index may be removed.
    pub compaction_index: LogIndex,
    /// Whether a physical compaction should run for `compaction_index`.
    pub compact: bool,
    pub stop_reason: Option<CompactionStopReason>,
}

/// Inputs of [`calculate_compaction_index`].
#[derive(Debug, Clone, Copy)]
pub struct CompactionBounds {
    /// Entries currently held by storage.
    pub stored: LogRange,
    pub release_index: LogIndex,
    pub largest_index_to_keep: LogIndex,
    pub role: ParticipantRole,
}

/// Computes how far the log may be compacted.
///
/// The target is `min(release_index, largest_index_to_keep)` clamped into the
/// stored range, so it never exceeds either bound nor the storage high bound,
/// and never precedes the storage low bound.
///
/// Unless `ignore_threshold` is set, a target that would remove fewer than
/// `threshold` entries is rejected.
pub fn calculate_compaction_index(
    bounds: CompactionBounds,
    threshold: u64,
    ignore_threshold: bool,
) -> CompactionPlan {
    let CompactionBounds {
        stored,
        release_index,
        largest_index_to_keep,
        role,
    } = bounds;

    let max_compaction_index = release_index.min(largest_index_to_keep);
    let compaction_index = stored.clamp(max_compaction_index);

    if compaction_index <= stored.from {
        return CompactionPlan {
            compaction_index: stored.from,
            compact: false,
            stop_reason: Some(CompactionStopReason::NothingToCompact),
        };
    }

    let removable = compaction_index.distance_from(stored.from);
    if !ignore_threshold && removable < threshold {
        return CompactionPlan {
            compaction_index,
            compact: false,
            stop_reason: Some(CompactionStopReason::CompactionThresholdNotReached {
                next_compaction_at: stored.from + threshold,
            }),
        };
    }

    let stop_reason = if max_compaction_index >= stored.to {
        None
    } else if largest_index_to_keep < release_index {
        Some(match role {
            ParticipantRole::Leader => CompactionStopReason::LeaderBlocksReleaseEntry {
                largest_index_to_keep,
            },
            ParticipantRole::Follower => CompactionStopReason::KeepIndexLimitsRange {
                largest_index_to_keep,
            },
        })
    } else {
        Some(CompactionStopReason::NotEnoughReleasedEntries { release_index })
    };

    CompactionPlan {
        compaction_index,
        compact: true,
        stop_reason,
    }
}
