//! CLI entry point for the PTC delay matcher.
//!
//! Provides subcommands for matching a delay log against the roster, consist
//! summary and scheduled services, for re-aggregating a previous results
//! file, and for inspecting how the roster parses.

use anyhow::{Context, Result, ensure};
use clap::{Args, Parser, Subcommand};
use ptc_delay_matcher::analyzers::aggregate::aggregate_report;
use ptc_delay_matcher::analyzers::types::{FleetBasis, ReportWindow};
use ptc_delay_matcher::config::ReferenceConfig;
use ptc_delay_matcher::fetch::read_source;
use ptc_delay_matcher::model::{EnrichedDelayRecord, Vendor};
use ptc_delay_matcher::output::{read_results, to_json, write_results};
use ptc_delay_matcher::pipeline::{self, SourcePaths, load_roster};
use ptc_delay_matcher::report::{render_match_summary, render_text};
use ptc_delay_matcher::sources::EquipmentVendorMap;
use ptc_delay_matcher::sources::roster::BoundarySource;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{debug, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "ptc_delay_matcher")]
#[command(about = "Attribute PTC delays to lead equipment and PTC vendor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConfigArgs {
    /// Reference config JSON (holidays, cause lists, layouts). Falls back to
    /// PTC_REFERENCE_CONFIG, then to built-in defaults
    #[arg(long)]
    config: Option<String>,
}

#[derive(Args)]
struct ReportArgs {
    /// Calendar year the vendor statistics cover
    #[arg(short, long, default_value_t = 2024)]
    year: i32,

    /// Fleet size used for the per-equipment figures: roster or observed
    #[arg(long, default_value = "roster")]
    fleet_basis: FleetBasis,

    /// Vendor whose equipment is hypothetically replaced
    #[arg(long, default_value = "Alstom")]
    replace: Vendor,

    /// Vendor it is replaced with
    #[arg(long = "with", default_value = "Siemens")]
    replacement: Vendor,

    /// Optional: write the structured report as JSON to this path
    #[arg(long)]
    json_report: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Match the delay log to equipment and vendors and report on it
    Match {
        /// Delay log CSV (path or URL)
        #[arg(long)]
        delays: String,

        /// PTC vehicle roster grid CSV (path or URL)
        #[arg(long)]
        roster: String,

        /// Trip summary (consist) grid CSV (path or URL)
        #[arg(long)]
        summary: String,

        /// Scheduled-service starts CSV (path or URL)
        #[arg(long)]
        starts: String,

        /// CSV file to write enriched delays to
        #[arg(short, long, default_value = "ptc_analysis_results.csv")]
        output: String,

        /// Gzip compress the results file
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// Cause allow-list version: legacy, current, or one from the config
        #[arg(long, default_value = "current")]
        cause_list: String,

        #[command(flatten)]
        report: ReportArgs,

        #[command(flatten)]
        reference: ConfigArgs,
    },
    /// Re-aggregate a results file from an earlier match run
    Report {
        /// Results CSV, plain or gzip (path or URL)
        #[arg(short, long)]
        input: String,

        /// PTC vehicle roster grid CSV, for roster fleet sizes
        #[arg(long)]
        roster: String,

        #[command(flatten)]
        report: ReportArgs,

        #[command(flatten)]
        reference: ConfigArgs,
    },
    /// Parse the roster and summarize it
    Roster {
        /// PTC vehicle roster grid CSV (path or URL)
        #[arg(long)]
        roster: String,

        #[command(flatten)]
        reference: ConfigArgs,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/ptc_delay_matcher.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("ptc_delay_matcher.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Match {
            delays,
            roster,
            summary,
            starts,
            output,
            gzip,
            cause_list,
            report,
            reference,
        } => {
            let config = load_config(&reference)?;
            let allow_list = config.allow_list(&cause_list)?;
            info!(
                version = allow_list.version(),
                causes = ?allow_list.causes().collect::<Vec<_>>(),
                "Cause allow-list selected"
            );

            let paths = SourcePaths {
                delays,
                roster,
                summary,
                starts,
            };
            let run = pipeline::run(&paths, &config, &allow_list)
                .context("Reconciliation failed")?;

            if run.roster_boundary.source == BoundarySource::Default {
                warn!(
                    column = run.roster_boundary.column,
                    "Roster split on the default boundary column, check the roster layout"
                );
            }
            if run.delay_rows_skipped > 0 {
                warn!(skipped = run.delay_rows_skipped, "Delay rows skipped while loading");
            }

            write_results(&output, &run.outcome.records, gzip)
                .with_context(|| format!("Failed to write results to {output}"))?;

            println!("{}", render_match_summary(&run.outcome.summary));
            emit_report(&run.outcome.records, &run.reference.roster, &report)?;
            info!(output, "Detailed results saved");
        }
        Commands::Report {
            input,
            roster,
            report,
            reference,
        } => {
            let config = load_config(&reference)?;
            let roster = load_roster(&roster, &config).context("Failed to load roster")?;
            let bytes = read_source(&input)?;
            let records = read_results(&input, &bytes)
                .with_context(|| format!("Failed to read results from {input}"))?;

            info!(records = records.len(), "Results loaded");
            emit_report(&records, &roster.map, &report)?;
        }
        Commands::Roster { roster, reference } => {
            let config = load_config(&reference)?;
            let parsed = load_roster(&roster, &config).context("Failed to load roster")?;

            info!(
                column = parsed.boundary.column,
                source = ?parsed.boundary.source,
                "Boundary"
            );
            for vendor in Vendor::ALL {
                println!("{vendor}: {} units", parsed.map.fleet_size(vendor));
            }

            let conflicts: Vec<_> = parsed.map.conflicts().collect();
            if !conflicts.is_empty() {
                warn!(?conflicts, "Units listed under both vendors");
            }
            for cell in &parsed.skipped {
                debug!(row = cell.row, column = cell.column, value = %cell.value, "Skipped cell");
            }

            info!(
                total = parsed.map.len(),
                conflicts = conflicts.len(),
                skipped_cells = parsed.skipped.len(),
                "Roster summary"
            );
        }
    }

    Ok(())
}

/// Loads the reference config from `--config`, `PTC_REFERENCE_CONFIG`, or
/// the built-in defaults.
fn load_config(args: &ConfigArgs) -> Result<ReferenceConfig> {
    let path = args
        .config
        .clone()
        .or_else(|| std::env::var("PTC_REFERENCE_CONFIG").ok());

    match path {
        Some(path) => {
            info!(path, "Loading reference config");
            ReferenceConfig::load(&path).with_context(|| format!("Invalid reference config {path}"))
        }
        None => {
            debug!("Using built-in reference config");
            Ok(ReferenceConfig::default())
        }
    }
}

/// Aggregates `records`, prints the text report and optionally writes the
/// JSON report.
fn emit_report(
    records: &[EnrichedDelayRecord],
    roster: &EquipmentVendorMap,
    args: &ReportArgs,
) -> Result<()> {
    ensure!(
        args.replace != args.replacement,
        "--replace and --with must name different vendors"
    );
    let window = ReportWindow::year(args.year)
        .with_context(|| format!("Year {} is out of range", args.year))?;

    let report = aggregate_report(records, window, roster, args.replace, args.replacement);
    print!("{}", render_text(&report, args.fleet_basis));

    if let Some(path) = &args.json_report {
        std::fs::write(path, to_json(&report)?)
            .with_context(|| format!("Failed to write JSON report to {path}"))?;
        info!(path, "JSON report written");
    }

    Ok(())
}
