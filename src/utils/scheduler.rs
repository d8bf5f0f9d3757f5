use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tracing::error;
use tracing::trace;

/// Posts units of work for asynchronous execution.
///
/// The compaction and commit managers never run external work (storage
/// calls, listener callbacks) on the calling thread; they hand it to a
/// scheduler instead.
pub trait Scheduler: Send + Sync + 'static {
    fn schedule(
        &self,
        name: &'static str,
        job: BoxFuture<'static, ()>,
    );
}

/// Runs jobs on a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Scheduler bound to the runtime of the calling task.
    ///
    /// # Panics
    /// When called outside of a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(
        &self,
        name: &'static str,
        job: BoxFuture<'static, ()>,
    ) {
        trace!(name, "schedule job");
        let handle = self.handle.spawn(job);
        // Watch the job so a panic inside it is at least logged.
        self.handle.spawn(async move {
            if let Err(e) = handle.await {
                error!("scheduled job: {name} stopped or encountered an error: {:?}", e);
            }
        });
    }
}
