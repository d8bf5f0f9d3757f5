use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::exponential_buckets;
use prometheus::Encoder;
use prometheus::Histogram;
use prometheus::HistogramOpts;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::IntGaugeVec;
use prometheus::Opts;
use prometheus::Registry;
use tracing::error;

pub(crate) const OUTCOME_COMPACTED: &str = "compacted";
pub(crate) const OUTCOME_FAILED: &str = "failed";
pub(crate) const OUTCOME_SKIPPED: &str = "skipped";

pub(crate) const INDEX_RELEASE: &str = "release";
pub(crate) const INDEX_KEEP: &str = "keep";
pub(crate) const INDEX_COMMIT: &str = "commit";

lazy_static! {
    pub static ref COMPACTION_RUNS: IntCounterVec = IntCounterVec::new(
        Opts::new("log_compaction_runs", "Compaction passes by outcome"),
        &["outcome"]
    )
    .expect("metric can not be created");

    pub static ref COMPACTED_ENTRIES: IntCounter = IntCounter::new(
        "log_compacted_entries",
        "Log entries physically removed by compaction"
    )
    .expect("metric can not be created");

    pub static ref COMPACTION_DURATION_MS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "log_compaction_duration_ms",
            "Histogram of physical compaction duration in ms"
        )
        .buckets(exponential_buckets(1.0, 2.0, 12).unwrap())
    )
    .expect("metric can not be created");

    pub static ref LOG_INDEX_GAUGE: IntGaugeVec = IntGaugeVec::new(
        Opts::new("log_index", "Latest release, keep and commit index per log"),
        &["log", "kind"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER: Once = Once::new();

/// Registers the crate's collectors with [`REGISTRY`]. Safe to call more
/// than once.
pub fn register_custom_metrics() {
    REGISTER.call_once(|| {
        REGISTRY
            .register(Box::new(COMPACTION_RUNS.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(COMPACTED_ENTRIES.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(COMPACTION_DURATION_MS.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(LOG_INDEX_GAUGE.clone()))
            .expect("collector can be registered");
    });
}

/// Text exposition of [`REGISTRY`], ready for a scrape endpoint.
pub fn gather_metrics() -> String {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_else(|e| {
        error!("custom metrics could not be from_utf8'd: {}", e);
        String::default()
    })
}

pub(crate) fn record_index(
    log_id: &str,
    kind: &str,
    index: crate::LogIndex,
) {
    LOG_INDEX_GAUGE
        .with_label_values(&[log_id, kind])
        .set(i64::try_from(index.value()).unwrap_or(i64::MAX));
}
