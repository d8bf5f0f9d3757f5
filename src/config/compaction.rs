use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use super::default_log_id;
use super::validate_log_id;
use crate::Error;
use crate::Result;

/// Log compaction policy
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CompactionConfig {
    /// Minimum number of entries a pass must remove unless it was forced by
    /// an explicit compaction request. Keeps the log from being compacted
    /// one entry at a time.
    #[serde(default = "default_compaction_threshold")]
    pub threshold: u64,

    /// When false, index updates never start a pass on their own; only
    /// explicit compaction requests do.
    #[serde(default = "default_auto_compaction")]
    pub enabled: bool,

    /// Identifies this log in the `log` label of the index gauges.
    #[serde(default = "default_log_id")]
    pub log_id: String,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            threshold: default_compaction_threshold(),
            enabled: default_auto_compaction(),
            log_id: default_log_id(),
        }
    }
}

impl CompactionConfig {
    pub(super) fn validate(&self) -> Result<()> {
        if self.threshold == 0 {
            return Err(Error::Config(ConfigError::Message(
                "compaction.threshold must be greater than 0".into(),
            )));
        }
        validate_log_id("compaction", &self.log_id)
    }
}

fn default_compaction_threshold() -> u64 {
    1000
}
fn default_auto_compaction() -> bool {
    true
}
