use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Render the first `max_rows` rows as a markdown table.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> Option<String>
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return None;
    }
    Some(Table::new(slice).with(Style::markdown()).to_string())
}

pub fn preview_table<T>(title: &str, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", title);
    match render_table(rows, max_rows) {
        Some(table) => println!("{}\n", table),
        None => println!("(no rows)\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FatalityRow, TrendRow};

    #[test]
    fn render_table_limits_rows() {
        let rows: Vec<FatalityRow> = ["A", "B", "C"]
            .iter()
            .map(|l| FatalityRow {
                location: l.to_string(),
                fatality_rate: "1.00%".to_string(),
            })
            .collect();
        let table = render_table(&rows, 2).unwrap();
        assert!(table.contains("Location"));
        assert!(table.contains("| A "));
        assert!(!table.contains("| C "));
        assert!(render_table::<FatalityRow>(&[], 2).is_none());
    }

    #[test]
    fn csv_and_json_exports_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![TrendRow {
            location: "A".to_string(),
            metric: "new_cases".to_string(),
            mean: 1.5,
            max: 2.0,
            min: 1.0,
            last: 2.0,
        }];
        let csv_path = dir.path().join("trend.csv");
        write_csv(&csv_path, &rows).unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert!(text.starts_with("Location,Metric,Mean,Max,Min,Last"));
        assert!(text.contains("A,new_cases,1.5,2.0,1.0,2.0"));

        let json_path = dir.path().join("trend.json");
        write_json(&json_path, &rows).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(value[0]["Metric"], "new_cases");
    }
}
