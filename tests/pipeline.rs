use chrono::NaiveDate;
use covid_report::{reports, AnalysisError, CovidTracker, LoadError, TrackerConfig};
use std::io::Write;

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 2, d).unwrap()
}

fn sample_tracker() -> CovidTracker {
    let mut tracker = CovidTracker::new(TrackerConfig::with_entities(["Alpha", "Beta", "Delta"]));
    tracker
        .load_data("tests/data/sample.csv")
        .expect("Failed to load sample data");
    tracker
}

fn csv_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn load_filters_entities_and_narrows_metrics() {
    let mut tracker = CovidTracker::new(TrackerConfig::with_entities(["Alpha", "Beta"]));
    let report = tracker.load_data("tests/data/sample.csv").unwrap();
    assert_eq!(report.total_rows, 23);
    assert_eq!(report.filtered_rows, 20);
    assert_eq!(report.entities, 2);
    assert_eq!(report.missing_metrics.len(), 6);

    let data = tracker.data().unwrap();
    assert!(data.rows().iter().all(|r| r.entity != "Gamma"));
    assert_eq!(data.entities(), vec!["Alpha", "Beta"]);
}

#[test]
fn gaps_are_filled_from_the_previous_day() {
    let tracker = sample_tracker();
    let data = tracker.data().unwrap();
    let total_cases = data.metric_index("total_cases").unwrap();
    let beta_day4 = data
        .rows()
        .iter()
        .find(|r| r.entity == "Beta" && r.date == date(4))
        .unwrap();
    assert_eq!(beta_day4.value(total_cases), Some(150.0));
    assert!(data.rows().iter().all(|r| r.values.iter().all(Option::is_some)));
}

#[test]
fn rolling_means_match_trailing_windows() {
    let tracker = sample_tracker();
    let data = tracker.data().unwrap();
    let new_cases = data.metric_index("new_cases").unwrap();
    for part in data.partitions() {
        for (i, row) in part.iter().enumerate() {
            if i < 6 {
                assert_eq!(row.new_cases_7day_avg, None);
                assert_eq!(row.new_deaths_7day_avg, None);
            } else {
                let expected: f64 =
                    part[i - 6..=i].iter().map(|r| r.value(new_cases).unwrap()).sum::<f64>() / 7.0;
                let got = row.new_cases_7day_avg.unwrap();
                assert!(
                    (got - expected).abs() < 1e-9,
                    "{} {}: {got} != {expected}",
                    row.entity,
                    row.date
                );
            }
        }
    }
}

#[test]
fn fatality_ratio_bounded_per_row() {
    let tracker = sample_tracker();
    for row in tracker.data().unwrap().rows() {
        let rate = row.fatality_rate.unwrap();
        assert!((0.0..=100.0).contains(&rate));
    }
}

#[test]
fn analysis_over_sample() {
    let result = sample_tracker().analyze().unwrap();
    assert_eq!(result.latest_date, date(10));

    let peaks = result.peaks.as_ref().unwrap();
    assert_eq!(peaks["new_cases"]["Alpha"].value, 100.0);
    assert_eq!(peaks["new_cases"]["Alpha"].date, date(10));
    assert_eq!(peaks["new_cases"]["Alpha"].per_million, None);
    assert_eq!(peaks["new_cases"]["Beta"].date, date(1));
    // 3 is reached on the 3rd and the 7th; the earlier row wins.
    assert_eq!(peaks["new_deaths"]["Alpha"].date, date(3));
    assert_eq!(peaks["new_deaths"]["Beta"].value, 0.0);
    assert_eq!(peaks["new_deaths"]["Beta"].date, date(1));

    let rates = result.fatality_rates.as_ref().unwrap();
    assert_eq!(rates["Alpha"], 2.0);
    assert_eq!(rates["Beta"], 0.0);

    let per_capita = result.per_capita.as_ref().unwrap();
    assert_eq!(per_capita["cases"].len(), 2);
    assert_eq!(per_capita["cases"]["Beta"].per_million, 30.0);
    let deaths = &per_capita["deaths"];
    assert_eq!(deaths.len(), 1);
    assert_eq!(deaths["Alpha"].total, 20.0);
    assert_eq!(deaths["Alpha"].per_million, 10.25);

    let trends = result.trends.as_ref().unwrap();
    let alpha = &trends["Alpha"]["total_cases"];
    assert_eq!(alpha.mean, 550.0);
    assert_eq!(alpha.max, 1000.0);
    assert_eq!(alpha.min, 100.0);
    assert_eq!(alpha.last, 1000.0);
    assert!(trends["Alpha"].contains_key("total_deaths_per_million"));

    let latest = result.latest_totals.as_ref().unwrap();
    assert_eq!(latest["Beta"].total_cases, Some(500.0));
    assert_eq!(latest["Alpha"].total_deaths, Some(20.0));

    assert_eq!(reports::fatality_table(&result)[0].location, "Alpha");
    assert_eq!(result.descriptive["new_cases"].count, 20);
}

#[test]
fn short_series_has_no_rolling_values_but_still_aggregates() {
    let file = csv_file(
        "date,location,new_cases,new_deaths,total_cases,total_deaths\n\
         2021-01-01,Alpha,4,0,4,0\n\
         2021-01-02,Alpha,6,1,10,1\n\
         2021-01-03,Alpha,2,0,12,1\n",
    );
    let mut tracker = CovidTracker::new(TrackerConfig::with_entities(["Alpha"]));
    tracker.load_data(file.path()).unwrap();
    let data = tracker.data().unwrap();
    assert!(data
        .rows()
        .iter()
        .all(|r| r.new_cases_7day_avg.is_none() && r.new_deaths_7day_avg.is_none()));

    let result = tracker.analyze().unwrap();
    let peaks = result.peaks.unwrap();
    assert_eq!(peaks["new_cases"]["Alpha"].value, 6.0);
    assert_eq!(result.fatality_rates.unwrap()["Alpha"], 8.33);
    let trend = &result.trends.unwrap()["Alpha"]["new_cases"];
    assert_eq!(trend.mean, 4.0);
    assert_eq!(trend.last, 2.0);
    assert!(result.per_capita.is_none());
}

#[test]
fn no_per_million_data_omits_deaths_key() {
    let file = csv_file(
        "date,location,total_cases,total_deaths,total_cases_per_million,total_deaths_per_million\n\
         2021-01-01,Alpha,10,1,2.5,\n\
         2021-01-01,Beta,20,2,4.0,\n",
    );
    let mut tracker = CovidTracker::new(TrackerConfig::with_entities(["Alpha", "Beta"]));
    tracker.load_data(file.path()).unwrap();
    let per_capita = tracker.analyze().unwrap().per_capita.unwrap();
    assert!(per_capita.contains_key("cases"));
    assert!(!per_capita.contains_key("deaths"));
}

#[test]
fn empty_after_filter_reports_failure() {
    let mut tracker = CovidTracker::new(TrackerConfig::with_entities(["Nowhere"]));
    let err = tracker.load_data("tests/data/sample.csv").unwrap_err();
    assert!(matches!(err, LoadError::NoMatchingEntities));
    assert!(tracker.data().is_none());
    assert!(matches!(tracker.analyze(), Err(AnalysisError::NoData)));
}

#[test]
fn unparseable_date_reports_failure() {
    let file = csv_file("date,location,new_cases\nyesterday,Alpha,1\n");
    let mut tracker = CovidTracker::new(TrackerConfig::with_entities(["Alpha"]));
    assert!(matches!(
        tracker.load_data(file.path()),
        Err(LoadError::InvalidDate { .. })
    ));
}

#[test]
fn oversized_trend_window_still_analyzes() {
    let config = TrackerConfig {
        trend_window_days: 1_000_000_000,
        ..TrackerConfig::with_entities(["Alpha"])
    };
    let mut tracker = CovidTracker::new(config);
    tracker.load_data("tests/data/sample.csv").unwrap();
    let result = tracker.analyze().unwrap();
    assert_eq!(result.trends.unwrap()["Alpha"]["new_cases"].min, 10.0);
}
