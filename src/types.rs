use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Deref;
use tabled::Tabled;

/// One input row: an entity's metric readings on one date.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub entity: String,
    pub date: NaiveDate,
    /// Aligned with [`Dataset::metrics`]. `None` is a missing reading.
    pub values: Vec<Option<f64>>,
    /// `total_deaths / total_cases * 100`; set by the cleaner.
    pub fatality_rate: Option<f64>,
    /// Trailing mean of `new_cases`; absent for an entity's first rows.
    pub new_cases_7day_avg: Option<f64>,
    pub new_deaths_7day_avg: Option<f64>,
}

impl Observation {
    pub fn new(entity: impl Into<String>, date: NaiveDate, values: Vec<Option<f64>>) -> Self {
        Self {
            entity: entity.into(),
            date,
            values,
            fatality_rate: None,
            new_cases_7day_avg: None,
            new_deaths_7day_avg: None,
        }
    }

    pub fn value(&self, idx: usize) -> Option<f64> {
        self.values.get(idx).copied().flatten()
    }
}

/// Entity-partitioned table of observations.
///
/// Rows are kept sorted by `(entity, date)` so every entity is one contiguous,
/// chronologically ordered slice.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    metrics: Vec<String>,
    rows: Vec<Observation>,
    // entity -> per-metric flag: did the source report at least one value?
    reported: BTreeMap<String, Vec<bool>>,
}

impl Dataset {
    pub fn new(metrics: Vec<String>, mut rows: Vec<Observation>) -> Self {
        rows.sort_by(|a, b| a.entity.cmp(&b.entity).then(a.date.cmp(&b.date)));
        let mut reported: BTreeMap<String, Vec<bool>> = BTreeMap::new();
        for row in &rows {
            let flags = reported
                .entry(row.entity.clone())
                .or_insert_with(|| vec![false; metrics.len()]);
            for (flag, v) in flags.iter_mut().zip(&row.values) {
                *flag |= v.is_some();
            }
        }
        Self {
            metrics,
            rows,
            reported,
        }
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn metric_index(&self, name: &str) -> Option<usize> {
        self.metrics.iter().position(|m| m == name)
    }

    pub fn has_metric(&self, name: &str) -> bool {
        self.metric_index(name).is_some()
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One chronologically ordered slice per entity.
    pub fn partitions(&self) -> impl Iterator<Item = &[Observation]> {
        self.rows.chunk_by(|a, b| a.entity == b.entity)
    }

    pub(crate) fn partitions_mut(&mut self) -> impl Iterator<Item = &mut [Observation]> {
        self.rows.chunk_by_mut(|a, b| a.entity == b.entity)
    }

    pub fn entities(&self) -> Vec<&str> {
        self.reported.keys().map(String::as_str).collect()
    }

    /// Whether the source carried any value of `metric` for `entity`
    /// before gap filling.
    pub fn was_reported(&self, entity: &str, metric: &str) -> bool {
        match (self.reported.get(entity), self.metric_index(metric)) {
            (Some(flags), Some(idx)) => flags.get(idx).copied().unwrap_or(false),
            _ => false,
        }
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.date).max()
    }
}

/// A dataset that went through the cleaner. Only the cleaner builds one,
/// so the aggregator can rely on filled values and derived fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedDataset(Dataset);

impl CleanedDataset {
    pub(crate) fn new(dataset: Dataset) -> Self {
        Self(dataset)
    }

    pub fn into_inner(self) -> Dataset {
        self.0
    }
}

impl Deref for CleanedDataset {
    type Target = Dataset;

    fn deref(&self) -> &Dataset {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestTotals {
    pub total_cases: Option<f64>,
    pub total_deaths: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakRecord {
    pub value: f64,
    pub date: NaiveDate,
    pub per_million: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerCapitaStat {
    pub total: f64,
    pub per_million: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendStats {
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    pub last: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Everything the report layer needs, computed once per run.
///
/// Each optional part is `None` when the columns it depends on are not in
/// the loaded schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub latest_date: NaiveDate,
    /// entity -> cumulative counts on `latest_date`.
    pub latest_totals: Option<BTreeMap<String, LatestTotals>>,
    /// metric -> entity -> peak row.
    pub peaks: Option<BTreeMap<String, BTreeMap<String, PeakRecord>>>,
    /// entity -> last fatality ratio, two decimals.
    pub fatality_rates: Option<BTreeMap<String, f64>>,
    /// "cases" / "deaths" -> entity -> totals.
    pub per_capita: Option<BTreeMap<String, BTreeMap<String, PerCapitaStat>>>,
    /// entity -> metric -> trailing-window stats.
    pub trends: Option<BTreeMap<String, BTreeMap<String, TrendStats>>>,
    /// metric -> summary over the whole cleaned table.
    pub descriptive: BTreeMap<String, DescriptiveStats>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct FatalityRow {
    #[serde(rename = "Location")]
    #[tabled(rename = "Location")]
    pub location: String,
    #[serde(rename = "FatalityRate")]
    #[tabled(rename = "FatalityRate")]
    pub fatality_rate: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct PeakRow {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Location")]
    #[tabled(rename = "Location")]
    pub location: String,
    #[serde(rename = "Peak")]
    #[tabled(rename = "Peak")]
    pub peak: String,
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: String,
    #[serde(rename = "PerMillion")]
    #[tabled(rename = "PerMillion")]
    pub per_million: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct LatestRow {
    #[serde(rename = "Location")]
    #[tabled(rename = "Location")]
    pub location: String,
    #[serde(rename = "TotalCases")]
    #[tabled(rename = "TotalCases")]
    pub total_cases: String,
    #[serde(rename = "TotalDeaths")]
    #[tabled(rename = "TotalDeaths")]
    pub total_deaths: String,
}

/// Flattened trend table, one line per (entity, metric).
#[derive(Debug, Serialize, Clone)]
pub struct TrendRow {
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Mean")]
    pub mean: f64,
    #[serde(rename = "Max")]
    pub max: f64,
    #[serde(rename = "Min")]
    pub min: f64,
    #[serde(rename = "Last")]
    pub last: f64,
}
