use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use super::default_log_id;
use super::validate_log_id;
use crate::Error;
use crate::Result;

/// Commit tracking policy
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommitConfig {
    /// Number of participants, leader included, that must hold an entry
    /// before the leader considers it committed.
    #[serde(default = "default_write_concern")]
    pub write_concern: usize,

    /// Whether the registered commit listener is notified of advances.
    #[serde(default = "default_notify_listener")]
    pub notify_listener: bool,

    /// Identifies this log in the `log` label of the commit index gauge.
    #[serde(default = "default_log_id")]
    pub log_id: String,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            write_concern: default_write_concern(),
            notify_listener: default_notify_listener(),
            log_id: default_log_id(),
        }
    }
}

impl CommitConfig {
    pub(super) fn validate(&self) -> Result<()> {
        if self.write_concern == 0 {
            return Err(Error::Config(ConfigError::Message(
                "commit.write_concern must be at least 1".into(),
            )));
        }
        validate_log_id("commit", &self.log_id)
    }
}

fn default_write_concern() -> usize {
    2
}
fn default_notify_listener() -> bool {
    true
}
