#![allow(dead_code)]

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use parking_lot::Mutex;
use replog_core::CommitListener;
use replog_core::LogIndex;
use replog_core::LogRange;
use replog_core::Result;
use replog_core::StorageError;
use replog_core::StorageManager;

// Physical compaction latency of the in-memory log, wide enough for
// updates to race a running pass.
pub const COMPACTION_LATENCY_IN_MS: u64 = 2;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    env_logger::init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
}

pub struct InMemoryLog {
    bounds: Mutex<LogRange>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl InMemoryLog {
    pub fn new(
        from: u64,
        to: u64,
    ) -> Self {
        Self {
            bounds: Mutex::new(LogRange::new(LogIndex(from), LogIndex(to))),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn append_to(
        &self,
        to: u64,
    ) {
        let mut bounds = self.bounds.lock();
        *bounds = LogRange::new(bounds.from, bounds.to.max(LogIndex(to)));
    }

    pub fn bounds(&self) -> LogRange {
        *self.bounds.lock()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StorageManager for InMemoryLog {
    fn get_committed_log_bounds(&self) -> LogRange {
        *self.bounds.lock()
    }

    async fn compact(
        &self,
        up_to: LogIndex,
    ) -> Result<LogRange> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(COMPACTION_LATENCY_IN_MS)).await;

        let result = {
            let mut bounds = self.bounds.lock();
            if up_to < bounds.from || up_to > bounds.to {
                Err(StorageError::InvalidCompaction {
                    requested: up_to,
                    bounds: *bounds,
                }
                .into())
            } else {
                let removed = LogRange::new(bounds.from, up_to);
                *bounds = LogRange::new(up_to, bounds.to);
                Ok(removed)
            }
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[derive(Default)]
pub struct CollectingListener {
    seen: Mutex<Vec<LogIndex>>,
}

impl CollectingListener {
    pub fn seen(&self) -> Vec<LogIndex> {
        self.seen.lock().clone()
    }

    pub fn last(&self) -> Option<LogIndex> {
        self.seen.lock().last().copied()
    }
}

impl CommitListener for CollectingListener {
    fn on_commit_index_advanced(
        &self,
        commit_index: LogIndex,
    ) {
        self.seen.lock().push(commit_index);
    }
}
