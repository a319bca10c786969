// Country-level pandemic time-series pipeline: load a metrics table, fill
// gaps and derive per-row ratios, then reduce it to an `AnalysisResult`
// that a report layer can draw from.

pub mod aggregator;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod reports;
pub mod tracker;
pub mod types;
pub mod util;

pub use config::TrackerConfig;
pub use error::{AnalysisError, ConfigError, LoadError};
pub use loader::LoadReport;
pub use tracker::CovidTracker;
pub use types::{AnalysisResult, CleanedDataset, Dataset, Observation};
