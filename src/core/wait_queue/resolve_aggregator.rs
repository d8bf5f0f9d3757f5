use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::warn;

use super::DeferredAction;

/// Collects waiters for a single future event and resolves all of them at
/// once with a copy of the same value.
///
/// The aggregator lives inside its owner's guarded state. `resolve_all`
/// only takes the waiters out; delivery happens when the returned
/// [`DeferredAction`] fires, after the owner dropped its lock.
#[derive(Debug)]
pub struct ResolveAggregator<T> {
    waiters: Vec<oneshot::Sender<T>>,
}

impl<T> Default for ResolveAggregator<T> {
    fn default() -> Self {
        Self { waiters: Vec::new() }
    }
}

impl<T> ResolveAggregator<T>
where T: Clone + Send + 'static
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a waiter for the next resolution round.
    ///
    /// `on_dropped` produces the value seen by the waiter if the aggregator
    /// is dropped without ever resolving it.
    pub fn wait_for(
        &mut self,
        on_dropped: impl FnOnce() -> T + Send + 'static,
    ) -> BoxFuture<'static, T> {
        let (tx, rx) = oneshot::channel();
        self.waiters.push(tx);
        async move {
            match rx.await {
                Ok(value) => value,
                Err(_) => {
                    warn!("waiter dropped before resolution");
                    on_dropped()
                }
            }
        }
        .boxed()
    }

    /// Takes every waiter registered so far. Waiters added afterwards join
    /// the next round.
    pub fn resolve_all(
        &mut self,
        value: T,
    ) -> DeferredAction {
        if self.waiters.is_empty() {
            return DeferredAction::empty();
        }
        let waiters = std::mem::take(&mut self.waiters);
        DeferredAction::new(move || {
            for waiter in waiters {
                // A receiver that went away is no longer interested.
                let _ = waiter.send(value.clone());
            }
        })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.waiters.len()
    }
}
