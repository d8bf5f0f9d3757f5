use std::collections::VecDeque;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;

use crate::Scheduler;

/// Queues jobs until the test decides to run them.
#[derive(Default)]
pub struct ManualScheduler {
    jobs: Mutex<VecDeque<(&'static str, BoxFuture<'static, ()>)>>,
}

impl ManualScheduler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn pending(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn pending_names(&self) -> Vec<&'static str> {
        self.jobs.lock().iter().map(|(name, _)| *name).collect()
    }

    /// Runs the oldest queued job to completion. Returns false if none was queued.
    pub async fn run_next(&self) -> bool {
        let job = self.jobs.lock().pop_front();
        match job {
            Some((_, job)) => {
                job.await;
                true
            }
            None => false,
        }
    }

    /// Runs queued jobs, including the ones they queue, until none is left.
    pub async fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next().await {
            ran += 1;
        }
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(
        &self,
        name: &'static str,
        job: BoxFuture<'static, ()>,
    ) {
        self.jobs.lock().push_back((name, job));
    }
}
