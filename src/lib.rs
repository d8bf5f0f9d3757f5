//! Compaction and commit tracking for a replicated write-ahead log.
//!
//! [`CompactionManager`] reconciles the release index and the keep index
//! into one monotonically advancing compaction point and drives physical
//! compaction through a [`StorageManager`]. [`FollowerCommitManager`] and
//! [`LeaderCommitManager`] advance the commit index and resolve everyone
//! waiting for "commit >= N".
//!
//! Neither component runs external work under its lock: storage calls and
//! listener callbacks go through a [`Scheduler`], waiter resolution is
//! returned to the caller as a [`DeferredAction`].

mod config;
mod core;
mod errors;
mod storage;
pub mod metrics;
pub mod utils;

pub use self::core::*;

pub use self::config::*;
pub use errors::*;
pub use storage::*;
pub use utils::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
