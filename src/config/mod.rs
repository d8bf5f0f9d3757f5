//! Configuration for the compaction and commit-tracking core.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support (`CONFIG_PATH` or an explicit override file)
//! - Environment variable overrides (`REPLOG__SECTION__FIELD`, highest priority)
//! - Component-wise validation

mod commit;
mod compaction;
pub use commit::*;
pub use compaction::*;


use std::env;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

const ENV_PREFIX: &str = "REPLOG";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LogCoreConfig {
    /// Log compaction policy
    #[serde(default)]
    pub compaction: CompactionConfig,

    /// Commit tracking policy
    #[serde(default)]
    pub commit: CommitConfig,
}

impl LogCoreConfig {
    /// Defaults, then the file named by `CONFIG_PATH` if set, then
    /// `REPLOG__*` environment variables.
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config) // No validation - deferred to validate()
    }

    /// Layers the file at `path` over `self`; environment variables still
    /// take precedence.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config) // No validation - deferred to validate()
    }

    pub fn validate(self) -> Result<Self> {
        self.compaction.validate()?;
        self.commit.validate()?;
        Ok(self)
    }
}

fn default_log_id() -> String {
    "default".to_string()
}

fn validate_log_id(
    section: &str,
    log_id: &str,
) -> Result<()> {
    if log_id.trim().is_empty() {
        return Err(Error::Config(ConfigError::Message(format!(
            "{section}.log_id must not be empty"
        ))));
    }
    Ok(())
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
