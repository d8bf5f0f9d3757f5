use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::Weak;
use std::time::Instant;
use std::time::SystemTime;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::instrument;
use tracing::trace;
use tracing::warn;

use super::calculate_compaction_index;
use super::CompactResult;
use super::CompactionBounds;
use super::CompactionPlan;
use super::CompactionRecord;
use super::CompactionStatus;
use super::CompactionStopReason;
use super::ParticipantRole;
use super::SharedCompactResult;
use crate::metrics;
use crate::CompactionConfig;
use crate::DeferredAction;
use crate::Error;
use crate::Guarded;
use crate::LogIndex;
use crate::LogRange;
use crate::ResolveAggregator;
use crate::Scheduler;
use crate::StorageManager;

/// State shared by every caller, protected by one lock.
#[derive(Debug, Default)]
struct GuardedCompactionData {
    release_index: LogIndex,
    largest_index_to_keep: LogIndex,

    /// True from scheduling a pass until that pass finished.
    compaction_in_progress: bool,

    /// Sticky request to ignore the threshold; consumed by the next pass.
    full_compaction_next_round: bool,

    /// Bumped whenever a bound rises or a compaction is requested. A
    /// finished pass re-evaluates only if it changed while it ran.
    generation: u64,

    compact_aggregator: ResolveAggregator<SharedCompactResult>,

    last_compaction: Option<CompactionRecord>,
    last_stop_reason: Option<CompactionStopReason>,

    resigned: bool,
}

/// Decides when the log prefix is compacted and runs the physical
/// compaction against [`StorageManager`], one pass at a time.
///
/// Index updates never block: they only decide under the lock whether a
/// pass must start, then hand the pass to the [`Scheduler`].
pub struct CompactionManager<S>
where S: StorageManager
{
    storage: Arc<S>,
    scheduler: Arc<dyn Scheduler>,
    config: CompactionConfig,
    role: ParticipantRole,

    guarded: Guarded<GuardedCompactionData>,

    /// Handed to scheduled passes so a pass never keeps a dropped manager alive.
    this: Weak<Self>,
}

impl<S> CompactionManager<S>
where S: StorageManager
{
    pub fn new(
        storage: Arc<S>,
        scheduler: Arc<dyn Scheduler>,
        config: CompactionConfig,
        role: ParticipantRole,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            storage,
            scheduler,
            config,
            role,
            guarded: Guarded::new(GuardedCompactionData::default()),
            this: this.clone(),
        })
    }

    /// Raises the release index to `max(current, index)` and re-evaluates
    /// compaction.
    #[instrument(skip(self))]
    pub fn update_release_index(
        &self,
        index: LogIndex,
    ) {
        self.update_bound(index, |data| &mut data.release_index, metrics::INDEX_RELEASE)
    }

    /// Raises the largest index to keep to `max(current, index)` and
    /// re-evaluates compaction.
    #[instrument(skip(self))]
    pub fn update_largest_index_to_keep(
        &self,
        index: LogIndex,
    ) {
        self.update_bound(index, |data| &mut data.largest_index_to_keep, metrics::INDEX_KEEP)
    }

    /// Requests a compaction as far as currently allowed, ignoring the
    /// threshold.
    ///
    /// Concurrent requests collapse into the pass in flight (or the one
    /// this call starts) and all receive the same result.
    pub fn compact(&self) -> BoxFuture<'static, SharedCompactResult> {
        let (waiter, action) = {
            let mut data = self.guarded.lock();
            if data.resigned {
                warn!("compact() called on resigned log");
                return futures::future::ready(Arc::new(CompactResult::resigned())).boxed();
            }
            data.full_compaction_next_round = true;
            data.generation += 1;
            let waiter = data
                .compact_aggregator
                .wait_for(|| Arc::new(CompactResult::resigned()));
            trace!(
                waiters = data.compact_aggregator.len(),
                in_progress = data.compaction_in_progress,
                "compaction requested"
            );
            (waiter, self.schedule_compaction(&mut data))
        };
        action.fire();
        waiter
    }

    pub fn get_compaction_status(&self) -> CompactionStatus {
        self.guarded.do_under_lock(|data| CompactionStatus {
            last_compaction: data.last_compaction.clone(),
            last_stop_reason: data.last_stop_reason,
            release_index: data.release_index,
            largest_index_to_keep: data.largest_index_to_keep,
            compaction_in_progress: data.compaction_in_progress,
        })
    }

    /// Stops accepting updates and resolves every pending `compact()`
    /// waiter with a resigned error. A pass already running is left to
    /// finish; its result is recorded but reaches no waiter.
    pub fn resign(&self) -> DeferredAction {
        let mut data = self.guarded.lock();
        if data.resigned {
            return DeferredAction::empty();
        }
        data.resigned = true;
        info!(
            pending = data.compact_aggregator.len(),
            "compaction manager resigned"
        );
        data.compact_aggregator
            .resolve_all(Arc::new(CompactResult::resigned()))
    }

    fn update_bound(
        &self,
        index: LogIndex,
        bound: impl FnOnce(&mut GuardedCompactionData) -> &mut LogIndex,
        metric_kind: &str,
    ) {
        // Read before locking: bounds only move forward, a stale view is conservative.
        let stored = self.storage.get_committed_log_bounds();
        let action = {
            let mut data = self.guarded.lock();
            if data.resigned {
                warn!(%index, "index update after resignation ignored");
                return;
            }
            let current = bound(&mut *data);
            if index <= *current {
                trace!(%index, current = %*current, "index not raised");
                return;
            }
            *current = index;
            data.generation += 1;
            metrics::record_index(&self.config.log_id, metric_kind, index);
            self.check_compaction(&mut data, stored)
        };
        action.fire();
    }

    fn evaluate(
        &self,
        data: &GuardedCompactionData,
        stored: LogRange,
        ignore_threshold: bool,
    ) -> CompactionPlan {
        calculate_compaction_index(
            CompactionBounds {
                stored,
                release_index: data.release_index,
                largest_index_to_keep: data.largest_index_to_keep,
                role: self.role,
            },
            self.config.threshold,
            ignore_threshold,
        )
    }

    /// Starts a pass if the current bounds allow one.
    fn check_compaction(
        &self,
        data: &mut GuardedCompactionData,
        stored: LogRange,
    ) -> DeferredAction {
        if !self.config.enabled && !data.full_compaction_next_round {
            return DeferredAction::empty();
        }
        let plan = self.evaluate(data, stored, data.full_compaction_next_round);
        data.last_stop_reason = plan.stop_reason;
        trace!(?plan, "check_compaction");
        if plan.compact {
            self.schedule_compaction(data)
        } else {
            DeferredAction::empty()
        }
    }

    fn schedule_compaction(
        &self,
        data: &mut GuardedCompactionData,
    ) -> DeferredAction {
        if data.compaction_in_progress {
            trace!("compaction already in progress");
            return DeferredAction::empty();
        }
        data.compaction_in_progress = true;

        let this = self.this.clone();
        let scheduler = self.scheduler.clone();
        DeferredAction::new(move || {
            scheduler.schedule("log-compaction", Self::run_compaction_pass(this).boxed());
        })
    }

    async fn run_compaction_pass(this: Weak<Self>) {
        let Some(this) = this.upgrade() else {
            warn!("compaction manager dropped before the pass started");
            return;
        };
        this.compaction_pass().await;
    }

    #[instrument(skip(self))]
    async fn compaction_pass(&self) {
        let stored = self.storage.get_committed_log_bounds();
        let started = self.guarded.do_under_lock(|data| {
            if data.resigned {
                return None;
            }
            let ignore_threshold = std::mem::take(&mut data.full_compaction_next_round);
            Some((self.evaluate(data, stored, ignore_threshold), data.generation))
        });

        let Some((plan, generation)) = started else {
            debug!("log resigned, skipping compaction pass");
            self.guarded.do_under_lock(|data| data.compaction_in_progress = false);
            return;
        };

        let (result, record) = self.execute(&plan, stored).await;
        let result = Arc::new(result);

        let stored_after = self.storage.get_committed_log_bounds();
        let action = {
            let mut data = self.guarded.lock();
            if record.is_some() {
                data.last_compaction = record;
            }
            data.last_stop_reason = result.stop_reason;
            data.compaction_in_progress = false;

            let mut action = data.compact_aggregator.resolve_all(result.clone());

            // A failed pass is not retried until the next update or request.
            if !data.resigned && result.is_ok() && data.generation != generation {
                action.merge(self.check_compaction(&mut data, stored_after));
            }
            action
        };
        action.fire();
    }

    /// Issues the physical compaction described by `plan`, if any.
    async fn execute(
        &self,
        plan: &CompactionPlan,
        stored: LogRange,
    ) -> (CompactResult, Option<CompactionRecord>) {
        if !plan.compact {
            debug!(stop_reason = ?plan.stop_reason, "no physical compaction necessary");
            metrics::COMPACTION_RUNS
                .with_label_values(&[metrics::OUTCOME_SKIPPED])
                .inc();
            let result = CompactResult {
                error: None,
                stop_reason: plan.stop_reason,
                compacted_range: LogRange::empty_at(stored.from),
            };
            return (result, None);
        }

        info!(
            compaction_index = %plan.compaction_index,
            %stored,
            stop_reason = ?plan.stop_reason,
            "compacting log"
        );
        let started_at = Instant::now();
        let outcome = AssertUnwindSafe(async { self.storage.compact(plan.compaction_index).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(Error::Fatal(format!(
                    "log compaction panicked: {}",
                    panic_message(panic.as_ref())
                )))
            });
        metrics::COMPACTION_DURATION_MS.observe(started_at.elapsed().as_secs_f64() * 1000.0);

        match outcome {
            Ok(removed) => {
                debug!(%removed, "log compaction completed");
                metrics::COMPACTION_RUNS
                    .with_label_values(&[metrics::OUTCOME_COMPACTED])
                    .inc();
                metrics::COMPACTED_ENTRIES.inc_by(removed.count());
                let record = CompactionRecord {
                    range: removed,
                    error: None,
                    when: SystemTime::now(),
                };
                let result = CompactResult {
                    error: None,
                    stop_reason: plan.stop_reason,
                    compacted_range: removed,
                };
                (result, Some(record))
            }
            Err(e) => {
                error!(?e, compaction_index = %plan.compaction_index, "log compaction failed");
                metrics::COMPACTION_RUNS
                    .with_label_values(&[metrics::OUTCOME_FAILED])
                    .inc();
                let error = Arc::new(e);
                let record = CompactionRecord {
                    range: LogRange::new(stored.from, plan.compaction_index),
                    error: Some(error.clone()),
                    when: SystemTime::now(),
                };
                let result = CompactResult {
                    error: Some(error),
                    stop_reason: plan.stop_reason,
                    compacted_range: LogRange::empty_at(stored.from),
                };
                (result, Some(record))
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic payload"
    }
}

impl<S> Drop for CompactionManager<S>
where S: StorageManager
{
    fn drop(&mut self) {
        self.resign().fire();
        trace!("CompactionManager dropped");
    }
}

impl<S> std::fmt::Debug for CompactionManager<S>
where S: StorageManager
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("CompactionManager")
            .field("role", &self.role)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
