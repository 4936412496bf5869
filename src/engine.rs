//! Entry point for the record layer.
//!
//! Bundles the configuration with an inspector and an orchestrator so
//! callers only deal with records.

use crate::availability::{AvailabilityInspector, AvailabilityReport};
use crate::config::Config;
use crate::error::MergeError;
use crate::lifecycle;
use crate::merge::{MergeOrchestrator, MergeOutcome};
use crate::record::CaseRecord;

/// Inspects and merges records against one storage root.
#[derive(Debug, Clone)]
pub struct CaseFileEngine {
    inspector: AvailabilityInspector,
    orchestrator: MergeOrchestrator,
}

impl CaseFileEngine {
    /// Create an engine for `config`.
    pub fn new(config: Config) -> Self {
        Self {
            inspector: AvailabilityInspector::new(config.storage_root.clone()),
            orchestrator: MergeOrchestrator::new(config),
        }
    }

    /// Create an engine from `CASEFILE_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is missing or invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Config::from_env()?;
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        self.orchestrator.config()
    }

    /// Report which of the record's slots can be merged.
    pub fn inspect(&self, record: &CaseRecord) -> AvailabilityReport {
        self.inspector.inspect(record)
    }

    /// Merge the record and return the merged file's name.
    pub async fn merge(&self, record: &CaseRecord) -> Result<String, MergeError> {
        self.merge_with_outcome(record)
            .await
            .map(|outcome| outcome.file_name)
    }

    /// Merge the record and return the full outcome.
    pub async fn merge_with_outcome(&self, record: &CaseRecord) -> Result<MergeOutcome, MergeError> {
        self.orchestrator.merge_record(record).await
    }

    /// Remove temp and staging files older than the configured age.
    pub fn sweep_stale(&self) -> Result<usize, glob::PatternError> {
        let config = self.config();
        lifecycle::sweep_stale(&config.storage_root, config.stale_temp_age)
    }
}
