// Pipeline owner: load -> clean -> analyze.

use crate::aggregator;
use crate::cleaner;
use crate::config::TrackerConfig;
use crate::error::{AnalysisError, LoadError};
use crate::loader::{self, LoadReport};
use crate::types::{AnalysisResult, CleanedDataset};
use std::path::Path;
use tracing::warn;

/// Holds the run configuration and, once loaded, the cleaned table.
#[derive(Debug, Clone)]
pub struct CovidTracker {
    config: TrackerConfig,
    data: Option<CleanedDataset>,
}

impl CovidTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self { config, data: None }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// The cleaned table, for raw time-series plotting.
    pub fn data(&self) -> Option<&CleanedDataset> {
        self.data.as_ref()
    }

    /// Load and clean `path`. On failure any previously loaded table is
    /// dropped.
    pub fn load_data(&mut self, path: impl AsRef<Path>) -> Result<LoadReport, LoadError> {
        self.data = None;
        let (dataset, report) = loader::load_dataset(path, &self.config).inspect_err(|e| {
            warn!(error = %e, "load failed");
        })?;
        self.data = Some(cleaner::clean(dataset, self.config.rolling_window));
        Ok(report)
    }

    pub fn analyze(&self) -> Result<AnalysisResult, AnalysisError> {
        let data = self.data.as_ref().ok_or(AnalysisError::NoData)?;
        aggregator::analyze(data, &self.config.peak_metrics, self.config.trend_window_days)
            .ok_or(AnalysisError::NoData)
    }
}
