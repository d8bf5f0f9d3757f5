use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;
use tokio::sync::Semaphore;

use super::range;
use crate::LogIndex;
use crate::LogRange;
use crate::Result;
use crate::StorageError;
use crate::StorageManager;

/// Log storage kept as a bare index range.
///
/// `compact` can be gated so a test holds a pass in flight, and can be told
/// to fail or panic on its next call.
pub struct MemStorage {
    bounds: Mutex<LogRange>,

    gated: AtomicBool,
    gate: Semaphore,
    fail_next: Mutex<Option<String>>,
    panic_next: AtomicBool,

    requests: Mutex<Vec<LogIndex>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemStorage {
    pub fn new(
        from: u64,
        to: u64,
    ) -> Self {
        Self {
            bounds: Mutex::new(range(from, to)),
            gated: AtomicBool::new(false),
            gate: Semaphore::new(0),
            fail_next: Mutex::new(None),
            panic_next: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Makes every following `compact` call wait for [`Self::open_gate`].
    pub fn gated(self) -> Self {
        self.gated.store(true, Ordering::SeqCst);
        self
    }

    /// Lets `calls` waiting or future `compact` calls through.
    pub fn open_gate(
        &self,
        calls: usize,
    ) {
        self.gate.add_permits(calls);
    }

    pub fn fail_next(
        &self,
        message: &str,
    ) {
        *self.fail_next.lock() = Some(message.to_string());
    }

    pub fn panic_next(&self) {
        self.panic_next.store(true, Ordering::SeqCst);
    }

    /// Appends entries up to (excluding) `to`.
    pub fn append_to(
        &self,
        to: u64,
    ) {
        let mut bounds = self.bounds.lock();
        *bounds = LogRange::new(bounds.from, LogIndex::from(to).max(bounds.to));
    }

    pub fn bounds(&self) -> LogRange {
        *self.bounds.lock()
    }

    /// Every `up_to` passed to `compact`, in call order.
    pub fn requests(&self) -> Vec<LogIndex> {
        self.requests.lock().clone()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StorageManager for MemStorage {
    fn get_committed_log_bounds(&self) -> LogRange {
        *self.bounds.lock()
    }

    async fn compact(
        &self,
        up_to: LogIndex,
    ) -> Result<LogRange> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.requests.lock().push(up_to);

        if self.gated.load(Ordering::SeqCst) {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }

        if self.panic_next.swap(false, Ordering::SeqCst) {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            panic!("storage bug at {up_to}");
        }

        let result = {
            let failure = self.fail_next.lock().take();
            let mut bounds = self.bounds.lock();
            if let Some(message) = failure {
                Err(StorageError::LogStorage(message).into())
            } else if up_to < bounds.from || up_to > bounds.to {
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
