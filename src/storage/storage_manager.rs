//! Interface to the physical log storage.

#[cfg(test)]
use mockall::automock;

use super::LogIndex;
use super::LogRange;
use crate::Result;

/// Physical log storage as seen by the compaction and commit managers.
///
/// # Safety Requirements
/// Implementations MUST guarantee:
/// 1. `get_committed_log_bounds` only ever moves forward between calls,
///    except after an explicit truncate (not driven from here)
/// 2. `compact` never removes entries at or above `up_to`
///
/// The storage handle is treated as externally synchronized. Only one
/// `compact` call is issued at a time by a single `CompactionManager`.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait StorageManager: Send + Sync + 'static {
    /// Range of entries currently persisted.
    fn get_committed_log_bounds(&self) -> LogRange;

    /// Physically removes every entry below `up_to`.
    ///
    /// Returns the range actually removed, which may be smaller than
    /// requested if physical constraints (segment boundaries) apply.
    async fn compact(
        &self,
        up_to: LogIndex,
    ) -> Result<LogRange>;
}
