// Flatten an `AnalysisResult` into display/export rows.
use crate::types::{AnalysisResult, FatalityRow, LatestRow, PeakRow, TrendRow};
use crate::util::format_number;
use std::cmp::Ordering;

/// Fatality rates, highest first.
pub fn fatality_table(result: &AnalysisResult) -> Vec<FatalityRow> {
    let Some(rates) = &result.fatality_rates else {
        return Vec::new();
    };
    let mut sorted: Vec<(&String, f64)> = rates.iter().map(|(k, v)| (k, *v)).collect();
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(b.0)));
    sorted
        .into_iter()
        .map(|(location, rate)| FatalityRow {
            location: location.clone(),
            fatality_rate: format!("{}%", format_number(rate, 2)),
        })
        .collect()
}

/// Peaks for one metric, largest first.
pub fn peak_table(result: &AnalysisResult, metric: &str) -> Vec<PeakRow> {
    let Some(per_entity) = result.peaks.as_ref().and_then(|p| p.get(metric)) else {
        return Vec::new();
    };
    let mut rows: Vec<_> = per_entity.iter().collect();
    rows.sort_by(|a, b| {
        b.1.value
            .partial_cmp(&a.1.value)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(b.0))
    });
    rows.into_iter()
        .map(|(location, peak)| PeakRow {
            metric: metric.to_string(),
            location: location.clone(),
            peak: format_number(peak.value, 0),
            date: peak.date.format("%Y-%m-%d").to_string(),
            per_million: peak
                .per_million
                .map(|v| format_number(v, 2))
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect()
}

/// Latest cumulative totals, most cases first.
pub fn latest_table(result: &AnalysisResult) -> Vec<LatestRow> {
    let Some(latest) = &result.latest_totals else {
        return Vec::new();
    };
    let mut rows: Vec<_> = latest.iter().collect();
    rows.sort_by(|a, b| {
        let (x, y) = (a.1.total_cases.unwrap_or(0.0), b.1.total_cases.unwrap_or(0.0));
        y.partial_cmp(&x).unwrap_or(Ordering::Equal).then(a.0.cmp(b.0))
    });
    let fmt = |v: Option<f64>| v.map(|v| format_number(v, 0)).unwrap_or_else(|| "-".to_string());
    rows.into_iter()
        .map(|(location, totals)| LatestRow {
            location: location.clone(),
            total_cases: fmt(totals.total_cases),
            total_deaths: fmt(totals.total_deaths),
        })
        .collect()
}

/// One row per (entity, metric) of the trend table.
pub fn trend_rows(result: &AnalysisResult) -> Vec<TrendRow> {
    let Some(trends) = &result.trends else {
        return Vec::new();
    };
    trends
        .iter()
        .flat_map(|(location, metrics)| {
            metrics.iter().map(move |(metric, s)| TrendRow {
                location: location.clone(),
                metric: metric.clone(),
                mean: s.mean,
                max: s.max,
                min: s.min,
                last: s.last,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LatestTotals, PeakRecord, TrendStats};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn result() -> AnalysisResult {
        let date = NaiveDate::from_ymd_opt(2021, 5, 1).unwrap();
        let mut peaks = BTreeMap::new();
        peaks.insert(
            "new_cases".to_string(),
            BTreeMap::from([
                ("A".to_string(), PeakRecord { value: 10.0, date, per_million: None }),
                ("B".to_string(), PeakRecord { value: 2500.0, date, per_million: Some(1.5) }),
            ]),
        );
        AnalysisResult {
            latest_date: date,
            latest_totals: Some(BTreeMap::from([(
                "A".to_string(),
                LatestTotals { total_cases: Some(12345.0), total_deaths: None },
            )])),
            peaks: Some(peaks),
            fatality_rates: Some(BTreeMap::from([
                ("A".to_string(), 1.5),
                ("B".to_string(), 3.25),
            ])),
            per_capita: None,
            trends: Some(BTreeMap::from([(
                "A".to_string(),
                BTreeMap::from([(
                    "new_cases".to_string(),
                    TrendStats { mean: 2.0, max: 3.0, min: 1.0, last: 3.0 },
                )]),
            )])),
            descriptive: BTreeMap::new(),
        }
    }

    #[test]
    fn fatality_table_sorted_descending() {
        let rows = fatality_table(&result());
        assert_eq!(rows[0].location, "B");
        assert_eq!(rows[0].fatality_rate, "3.25%");
        assert_eq!(rows[1].fatality_rate, "1.50%");
    }

    #[test]
    fn peak_table_formats_values() {
        let rows = peak_table(&result(), "new_cases");
        assert_eq!(rows[0].location, "B");
        assert_eq!(rows[0].peak, "2,500");
        assert_eq!(rows[0].per_million, "1.50");
        assert_eq!(rows[1].per_million, "-");
        assert!(peak_table(&result(), "new_deaths").is_empty());
    }

    #[test]
    fn latest_and_trend_rows() {
        let r = result();
        let latest = latest_table(&r);
        assert_eq!(latest[0].total_cases, "12,345");
        assert_eq!(latest[0].total_deaths, "-");
        let trends = trend_rows(&r);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].metric, "new_cases");
        assert_eq!(trends[0].last, 3.0);
    }
}
