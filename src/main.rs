// Entry point and high-level CLI flow.
//
// Loads the input table once, prints a short load summary and previews of
// the computed tables, and optionally hands the analysis off as JSON/CSV for
// the chart renderer.
use clap::Parser;
use covid_report::{output, reports, util, CovidTracker, TrackerConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Per-country pandemic metrics analysis")]
struct Args {
    /// Input CSV with `date`, `location` and metric columns
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// JSON file overriding the allow-list, metrics or windows
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the full analysis as JSON
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,

    /// Write the trailing-window trend table as CSV
    #[arg(long, value_name = "FILE")]
    trend_csv: Option<PathBuf>,

    /// Rows shown per preview table
    #[arg(long, default_value_t = 5)]
    preview: usize,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    debug!(?args, "arguments");

    let config = match &args.config {
        Some(path) => match TrackerConfig::from_json_file(path) {
            Ok(c) => c,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => TrackerConfig::default(),
    };

    let mut tracker = CovidTracker::new(config);
    match tracker.load_data(&args.input) {
        Ok(report) => {
            println!(
                "Processing dataset... ({} rows read, {} kept across {} locations)",
                util::format_int(report.total_rows),
                util::format_int(report.filtered_rows),
                util::format_int(report.entities)
            );
            if !report.missing_metrics.is_empty() {
                println!(
                    "Note: {} requested metrics not in the file: {}",
                    report.missing_metrics.len(),
                    report.missing_metrics.join(", ")
                );
            }
            println!();
        }
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
            return ExitCode::FAILURE;
        }
    }

    let result = match tracker.analyze() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Latest date in dataset: {}\n", result.latest_date);
    output::preview_table("Latest Totals", &reports::latest_table(&result), args.preview);
    let fatality = reports::fatality_table(&result);
    output::preview_table("Case Fatality Rate (%)", &fatality, args.preview);
    for metric in &tracker.config().peak_metrics {
        let title = format!("Peak {}", metric);
        output::preview_table(&title, &reports::peak_table(&result, metric), args.preview);
    }

    let mut status = ExitCode::SUCCESS;
    if let Some(path) = &args.json {
        match output::write_json(path, &result) {
            Ok(()) => println!("(Analysis exported to {})", path.display()),
            Err(e) => {
                eprintln!("Write error: {}", e);
                status = ExitCode::FAILURE;
            }
        }
    }
    if let Some(path) = &args.trend_csv {
        match output::write_csv(path, &reports::trend_rows(&result)) {
            Ok(()) => println!("(Trend table exported to {})", path.display()),
            Err(e) => {
                eprintln!("Write error: {}", e);
                status = ExitCode::FAILURE;
            }
        }
    }
    status
}
