// Gap filling and derived per-row metrics.
//
// Every step works on one entity partition at a time, so nothing computed
// here ever crosses from one country into the next.
use crate::types::{CleanedDataset, Dataset, Observation};
use crate::util::{average, safe_ratio};
use tracing::debug;

/// Fill gaps and derive the fatality ratio and rolling means.
///
/// Takes ownership of the loaded table and hands back the cleaned one.
/// Running it again on `CleanedDataset::into_inner()` yields the same values.
pub fn clean(mut dataset: Dataset, rolling_window: usize) -> CleanedDataset {
    let n_metrics = dataset.metrics().len();
    let total_cases = dataset.metric_index("total_cases");
    let total_deaths = dataset.metric_index("total_deaths");
    let new_cases = dataset.metric_index("new_cases");
    let new_deaths = dataset.metric_index("new_deaths");

    for part in dataset.partitions_mut() {
        for idx in 0..n_metrics {
            forward_fill(part, idx);
        }
        for row in part.iter_mut() {
            row.fatality_rate = match (total_cases, total_deaths) {
                (Some(c), Some(d)) => Some(fatality_ratio(
                    row.value(d).unwrap_or(0.0),
                    row.value(c).unwrap_or(0.0),
                )),
                _ => None,
            };
        }
        let cases_avg = new_cases.map(|idx| trailing_mean(part, idx, rolling_window));
        let deaths_avg = new_deaths.map(|idx| trailing_mean(part, idx, rolling_window));
        for (i, row) in part.iter_mut().enumerate() {
            row.new_cases_7day_avg = cases_avg.as_ref().and_then(|v| v[i]);
            row.new_deaths_7day_avg = deaths_avg.as_ref().and_then(|v| v[i]);
        }
    }

    debug!(rows = dataset.len(), "dataset cleaned");
    CleanedDataset::new(dataset)
}

/// Carry the last known value forward; leading gaps become 0.
fn forward_fill(rows: &mut [Observation], idx: usize) {
    let mut last = 0.0;
    for row in rows.iter_mut() {
        last = *row.values[idx].get_or_insert(last);
    }
}

/// `deaths / cases * 100`, 0 without cases, kept within [0, 100].
pub fn fatality_ratio(deaths: f64, cases: f64) -> f64 {
    (safe_ratio(deaths, cases) * 100.0).clamp(0.0, 100.0)
}

/// Mean of each row and the `window - 1` rows before it. Rows without a full
/// window get `None`.
fn trailing_mean(rows: &[Observation], idx: usize, window: usize) -> Vec<Option<f64>> {
    let values: Vec<f64> = rows.iter().map(|r| r.value(idx).unwrap_or(0.0)).collect();
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                None
            } else {
                Some(average(&values[i + 1 - window..=i]))
            }
        })
        .collect()
}
