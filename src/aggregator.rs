use crate::types::{
    AnalysisResult, CleanedDataset, DescriptiveStats, LatestTotals, PeakRecord, PerCapitaStat,
    TrendStats,
};
use crate::util::{average, round2, std_dev};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

/// Build the full analysis bundle. Parts whose columns are missing come back
/// as `None`; the rest are still computed.
///
/// Returns `None` only for an empty table.
pub fn analyze(
    data: &CleanedDataset,
    peak_metrics: &[String],
    trend_window_days: i64,
) -> Option<AnalysisResult> {
    let latest_date = data.max_date()?;
    let peaks: BTreeMap<String, BTreeMap<String, PeakRecord>> = peak_metrics
        .iter()
        .filter_map(|m| peaks(data, m).map(|p| (m.clone(), p)))
        .collect();

    let result = AnalysisResult {
        latest_date,
        latest_totals: latest_totals(data, latest_date),
        peaks: (!peaks.is_empty()).then_some(peaks),
        fatality_rates: fatality_rates(data),
        per_capita: per_capita(data),
        trends: trends(data, latest_date, trend_window_days),
        descriptive: descriptive(data),
    };
    debug!(latest = %latest_date, "analysis computed");
    Some(result)
}

/// Per entity, the first row (chronologically) holding the metric's maximum.
pub fn peaks(data: &CleanedDataset, metric: &str) -> Option<BTreeMap<String, PeakRecord>> {
    let idx = data.metric_index(metric)?;
    let per_million = data.metric_index(&format!("{metric}_per_million"));
    let mut out = BTreeMap::new();
    for part in data.partitions() {
        let mut best: Option<(f64, usize)> = None;
        for (i, row) in part.iter().enumerate() {
            let v = row.value(idx).unwrap_or(0.0);
            // Strict `>` keeps the earliest row on ties.
            if best.map_or(true, |(b, _)| v > b) {
                best = Some((v, i));
            }
        }
        if let Some((value, i)) = best {
            let row = &part[i];
            out.insert(
                row.entity.clone(),
                PeakRecord {
                    value,
                    date: row.date,
                    per_million: per_million.and_then(|p| row.value(p)),
                },
            );
        }
    }
    Some(out)
}

/// Last observed fatality ratio per entity, rounded to two decimals.
pub fn fatality_rates(data: &CleanedDataset) -> Option<BTreeMap<String, f64>> {
    if !(data.has_metric("total_cases") && data.has_metric("total_deaths")) {
        return None;
    }
    let rates = data
        .partitions()
        .filter_map(|part| part.last())
        .map(|row| (row.entity.clone(), round2(row.fatality_rate.unwrap_or(0.0))))
        .collect();
    Some(rates)
}

/// Raw cumulative totals paired with their per-million counterpart, from each
/// entity's last row. A kind needs both columns; entities that never reported
/// the per-million field are left out.
pub fn per_capita(
    data: &CleanedDataset,
) -> Option<BTreeMap<String, BTreeMap<String, PerCapitaStat>>> {
    let mut out = BTreeMap::new();
    for kind in ["cases", "deaths"] {
        let total_name = format!("total_{kind}");
        let per_million_name = format!("total_{kind}_per_million");
        let Some(per_million) = data.metric_index(&per_million_name) else {
            continue;
        };
        let Some(total) = data.metric_index(&total_name) else {
            continue;
        };
        let table: BTreeMap<String, PerCapitaStat> = data
            .partitions()
            .filter_map(|part| part.last())
            .filter(|row| data.was_reported(&row.entity, &per_million_name))
            .map(|row| {
                let stat = PerCapitaStat {
                    total: row.value(total).unwrap_or(0.0),
                    per_million: row.value(per_million).unwrap_or(0.0),
                };
                (row.entity.clone(), stat)
            })
            .collect();
        if !table.is_empty() {
            out.insert(kind.to_string(), table);
        }
    }
    (!out.is_empty()).then_some(out)
}

/// Mean/max/min/last of every `new_*` / `total_*` metric over the rows dated
/// strictly after `latest_date - window_days`.
pub fn trends(
    data: &CleanedDataset,
    latest_date: NaiveDate,
    window_days: i64,
) -> Option<BTreeMap<String, BTreeMap<String, TrendStats>>> {
    let tracked: Vec<(usize, &String)> = data
        .metrics()
        .iter()
        .enumerate()
        .filter(|(_, m)| m.starts_with("new_") || m.starts_with("total_"))
        .collect();
    if tracked.is_empty() {
        return None;
    }
    // Windows beyond chrono's date range cover the whole table.
    let cutoff = Duration::try_days(window_days)
        .and_then(|w| latest_date.checked_sub_signed(w))
        .unwrap_or(NaiveDate::MIN);

    let mut out = BTreeMap::new();
    for part in data.partitions() {
        let recent: Vec<_> = part.iter().filter(|r| r.date > cutoff).collect();
        if recent.is_empty() {
            continue;
        }
        let mut per_metric = BTreeMap::new();
        for &(idx, name) in &tracked {
            let values: Vec<f64> = recent.iter().map(|r| r.value(idx).unwrap_or(0.0)).collect();
            per_metric.insert(name.clone(), summarize_window(&values));
        }
        out.insert(recent[0].entity.clone(), per_metric);
    }
    Some(out)
}

fn summarize_window(values: &[f64]) -> TrendStats {
    TrendStats {
        mean: average(values),
        max: values.iter().copied().fold(f64::MIN, f64::max),
        min: values.iter().copied().fold(f64::MAX, f64::min),
        last: values.last().copied().unwrap_or(0.0),
    }
}

/// Latest cumulative counts for entities that have a row on `latest_date`.
pub fn latest_totals(
    data: &CleanedDataset,
    latest_date: NaiveDate,
) -> Option<BTreeMap<String, LatestTotals>> {
    let cases = data.metric_index("total_cases");
    let deaths = data.metric_index("total_deaths");
    if cases.is_none() && deaths.is_none() {
        return None;
    }
    let table = data
        .partitions()
        .filter_map(|part| part.iter().rev().find(|r| r.date == latest_date))
        .map(|row| {
            let totals = LatestTotals {
                total_cases: cases.and_then(|i| row.value(i)),
                total_deaths: deaths.and_then(|i| row.value(i)),
            };
            (row.entity.clone(), totals)
        })
        .collect();
    Some(table)
}

/// Column summary over the whole cleaned table.
pub fn descriptive(data: &CleanedDataset) -> BTreeMap<String, DescriptiveStats> {
    data.metrics()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let values: Vec<f64> = data.rows().iter().filter_map(|r| r.value(idx)).collect();
            let stats = DescriptiveStats {
                count: values.len(),
                mean: average(&values),
                std: std_dev(&values),
                min: values.iter().copied().reduce(f64::min).unwrap_or(0.0),
                max: values.iter().copied().reduce(f64::max).unwrap_or(0.0),
            };
            (name.clone(), stats)
        })
        .collect()
}
