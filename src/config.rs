// Run configuration.
//
// The entity allow-list and candidate metric list are plain data handed to
// `CovidTracker::new`; nothing here is global mutable state.

use crate::error::ConfigError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Countries tracked by default.
pub const DEFAULT_ENTITIES: &[&str] = &[
    "Afghanistan",
    "Albania",
    "Algeria",
    "Andorra",
    "Angola",
    "Argentina",
    "Armenia",
    "Australia",
    "Austria",
    "Bahamas",
    "Bahrain",
    "Bangladesh",
    "Barbados",
    "Belarus",
    "Belgium",
    "Belize",
    "Benin",
    "Bhutan",
    "Bolivia",
    "Honduras",
    "Hungary",
    "Iceland",
    "India",
    "Indonesia",
    "Iran",
    "Iraq",
    "Ireland",
    "Israel",
    "Italy",
    "Jamaica",
    "Japan",
    "Jordan",
    "Kenya",
    "Kiribati",
    "Korea, South",
    "Kuwait",
    "Kyrgyzstan",
];

/// Metric columns recognized in the input file.
pub const RECOGNIZED_METRICS: &[&str] = &[
    "new_cases",
    "new_cases_smoothed",
    "new_deaths",
    "new_deaths_smoothed",
    "total_cases",
    "total_deaths",
    "total_cases_per_million",
    "new_cases_per_million",
    "new_cases_smoothed_per_million",
    "total_deaths_per_million",
    "new_deaths_per_million",
    "new_deaths_smoothed_per_million",
];

static DEFAULT_CONFIG: Lazy<TrackerConfig> = Lazy::new(|| TrackerConfig {
    entities: DEFAULT_ENTITIES.iter().map(|s| s.to_string()).collect(),
    metrics: RECOGNIZED_METRICS.iter().map(|s| s.to_string()).collect(),
    entity_column: "location".to_string(),
    date_column: "date".to_string(),
    rolling_window: 7,
    trend_window_days: 30,
    peak_metrics: vec!["new_cases".to_string(), "new_deaths".to_string()],
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Allow-listed entity names; rows for anything else are dropped at load.
    pub entities: Vec<String>,
    /// Candidate metric columns. Narrowed to what the input actually has.
    pub metrics: Vec<String>,
    pub entity_column: String,
    pub date_column: String,
    /// Trailing window (rows per entity) for the rolling means.
    pub rolling_window: usize,
    /// Trend table covers dates strictly after `max_date - trend_window_days`.
    pub trend_window_days: i64,
    /// Flow metrics whose per-entity peaks are reported.
    pub peak_metrics: Vec<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        DEFAULT_CONFIG.clone()
    }
}

impl TrackerConfig {
    /// Default metrics and windows with a custom allow-list.
    pub fn with_entities<I, S>(entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entities: entities.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: TrackerConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn allows(&self, entity: &str) -> bool {
        self.entities.iter().any(|e| e == entity)
    }
}
