//! Replicated Log Core Error Hierarchy
//!
//! Errors are grouped by origin: infrastructure (storage), configuration,
//! and the replicated log's own lifecycle. Failures that must reach several
//! waiters at once travel as [`SharedError`].

use std::sync::Arc;

use config::ConfigError;

use crate::LogIndex;
use crate::LogRange;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

/// An error broadcast to every waiter of one resolution round.
pub type SharedError = Arc<Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Infrastructure-level failures (storage)
    #[error(transparent)]
    System(#[from] SystemError),

    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Replicated log lifecycle failures
    #[error(transparent)]
    Log(#[from] ReplicatedLogError),

    /// A storage call panicked; the log state behind it is unknown
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("Storage operation failed: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Disk I/O failures during physical compaction
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// Log storage subsystem failures
    #[error("Log storage failure: {0}")]
    LogStorage(String),

    /// Checksum validation failures
    #[error("Data corruption detected at {location}")]
    DataCorruption { location: String },

    /// Compaction request outside of what the storage holds
    #[error("Cannot compact up to {requested}, stored log is {bounds}")]
    InvalidCompaction { requested: LogIndex, bounds: LogRange },
}

#[derive(Debug, thiserror::Error)]
pub enum ReplicatedLogError {
    /// The log resigned (or was dropped) while the request was pending
    #[error("Replicated log resigned")]
    Resigned,

    /// Acknowledgment from a participant the leader does not know
    #[error("Unknown participant {id}")]
    InvalidParticipant { id: u32 },
}

// ============== Conversion Implementations ============== //
impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Error::System(SystemError::Storage(e))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        StorageError::IoError(e).into()
    }
}

impl Error {
    /// True if this error reports a resigned log rather than a real failure.
    pub fn is_resigned(&self) -> bool {
        matches!(self, Error::Log(ReplicatedLogError::Resigned))
    }

    pub(crate) fn resigned() -> SharedError {
        Arc::new(ReplicatedLogError::Resigned.into())
    }
}
