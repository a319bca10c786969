use crate::config::TrackerConfig;
use crate::error::LoadError;
use crate::types::{Dataset, Observation};
use crate::util::{parse_date_safe, parse_f64_safe};
use csv::{ReaderBuilder, StringRecord};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub entities: usize,
    /// Requested metrics the source does not have.
    pub missing_metrics: Vec<String>,
}

pub fn load_dataset(
    path: impl AsRef<Path>,
    config: &TrackerConfig,
) -> Result<(Dataset, LoadReport), LoadError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "opening input");
    let file = std::fs::File::open(path)?;
    load_from_reader(file, config)
}

/// Read a delimited table, keep the allow-listed entities and the metric
/// columns that actually exist.
pub fn load_from_reader<R: Read>(
    reader: R,
    config: &TrackerConfig,
) -> Result<(Dataset, LoadReport), LoadError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let entity_col = find_column(&headers, &config.entity_column)?;
    let date_col = find_column(&headers, &config.date_column)?;

    let (metrics, positions, missing_metrics) = narrow_metrics(&headers, &config.metrics);
    if !missing_metrics.is_empty() {
        warn!(
            missing = ?missing_metrics,
            "metrics not found in source; continuing with the available ones"
        );
    }

    let mut total_rows = 0usize;
    let mut rows: Vec<Observation> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        total_rows += 1;

        let raw_date = record.get(date_col);
        let date = match parse_date_safe(raw_date) {
            Some(d) => d,
            None => {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                return Err(LoadError::InvalidDate {
                    line,
                    value: raw_date.unwrap_or_default().to_string(),
                });
            }
        };

        let entity = record.get(entity_col).unwrap_or_default();
        if !config.allows(entity) {
            continue;
        }
        let values = positions
            .iter()
            .map(|&pos| parse_f64_safe(record.get(pos)))
            .collect();
        rows.push(Observation::new(entity, date, values));
    }

    if rows.is_empty() {
        return Err(LoadError::NoMatchingEntities);
    }

    let dataset = Dataset::new(metrics, rows);
    let report = LoadReport {
        total_rows,
        filtered_rows: dataset.len(),
        entities: dataset.entities().len(),
        missing_metrics,
    };
    info!(
        total_rows = report.total_rows,
        kept_rows = report.filtered_rows,
        entities = report.entities,
        "dataset loaded"
    );
    Ok((dataset, report))
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
}

/// Intersect the requested metrics with the header. Returns the kept names,
/// their column positions and the names that were dropped.
fn narrow_metrics(
    headers: &StringRecord,
    requested: &[String],
) -> (Vec<String>, Vec<usize>, Vec<String>) {
    let mut seen = BTreeSet::new();
    let mut kept = Vec::new();
    let mut positions = Vec::new();
    let mut missing = Vec::new();
    for metric in requested {
        if !seen.insert(metric.as_str()) {
            continue;
        }
        match headers.iter().position(|h| h.eq_ignore_ascii_case(metric)) {
            Some(pos) => {
                kept.push(metric.clone());
                positions.push(pos);
            }
            None => missing.push(metric.clone()),
        }
    }
    (kept, positions, missing)
}
