use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open input: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Unparseable date {value:?} on line {line}")]
    InvalidDate { line: u64, value: String },
    #[error("No rows matched the configured entities")]
    NoMatchingEntities,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No data loaded. Load the input file first.")]
    NoData,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}
