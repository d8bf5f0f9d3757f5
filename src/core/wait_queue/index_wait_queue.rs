use std::collections::BTreeMap;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::trace;
use tracing::warn;

use super::DeferredAction;
use crate::LogIndex;

/// Waiters keyed by the log index they wait for ("commit >= N").
///
/// Resolution is monotonic: `resolve_up_to(i)` takes every waiter at or
/// below `i` and leaves the rest queued.
#[derive(Debug)]
pub struct IndexWaitQueue<T> {
    waiters: BTreeMap<LogIndex, Vec<oneshot::Sender<T>>>,
}

impl<T> Default for IndexWaitQueue<T> {
    fn default() -> Self {
        Self {
            waiters: BTreeMap::new(),
        }
    }
}

impl<T> IndexWaitQueue<T>
where T: Clone + Send + 'static
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wait_for(
        &mut self,
        index: LogIndex,
        on_dropped: impl FnOnce() -> T + Send + 'static,
    ) -> BoxFuture<'static, T> {
        self.prune_abandoned();
        let (tx, rx) = oneshot::channel();
        self.waiters.entry(index).or_default().push(tx);
        async move {
            match rx.await {
                Ok(value) => value,
                Err(_) => {
                    warn!(%index, "index waiter dropped before resolution");
                    on_dropped()
                }
            }
        }
        .boxed()
    }

    /// Forgets waiters whose future was dropped without being resolved.
    fn prune_abandoned(&mut self) {
        let before = self.len();
        self.waiters.retain(|_, senders| {
            senders.retain(|tx| !tx.is_closed());
            !senders.is_empty()
        });
        let pruned = before - self.len();
        if pruned > 0 {
            trace!(pruned, "dropped abandoned index waiters");
        }
    }

    /// Takes all waiters with `waited index <= index`.
    pub fn resolve_up_to(
        &mut self,
        index: LogIndex,
        value: T,
    ) -> DeferredAction {
        if index.value() == u64::MAX {
            return self.resolve_all(value);
        }
        let remaining = self.waiters.split_off(&(index + 1));
        let resolvable = std::mem::replace(&mut self.waiters, remaining);
        Self::deliver(resolvable, value)
    }

    /// Takes every waiter regardless of index.
    pub fn resolve_all(
        &mut self,
        value: T,
    ) -> DeferredAction {
        let all = std::mem::take(&mut self.waiters);
        Self::deliver(all, value)
    }

    fn deliver(
        waiters: BTreeMap<LogIndex, Vec<oneshot::Sender<T>>>,
        value: T,
    ) -> DeferredAction {
        if waiters.is_empty() {
            return DeferredAction::empty();
        }
        trace!(
            indexes = waiters.len(),
            "resolving index waiters"
        );
        DeferredAction::new(move || {
            for waiter in waiters.into_values().flatten() {
                let _ = waiter.send(value.clone());
            }
        })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    /// Number of pending waiters.
    pub fn len(&self) -> usize {
        self.waiters.values().map(Vec::len).sum()
    }

    /// Smallest index someone is waiting for.
    pub fn lowest_waited_index(&self) -> Option<LogIndex> {
        self.waiters.keys().next().copied()
    }
}
