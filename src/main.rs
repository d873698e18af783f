use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

use farm_cleaner::config::Taxonomy;
use farm_cleaner::logging;
use farm_cleaner::pipeline::ingestion::RawFileMerger;
use farm_cleaner::pipeline::processing::BoundaryLayer;
use farm_cleaner::pipeline::storage::load_into_database;
use farm_cleaner::pipeline::{run_clean, PipelineReport};
use farm_cleaner::queries;

#[derive(Parser)]
#[command(name = "farm_cleaner")]
#[command(about = "Clean scraped farm listings and enrich them with administrative regions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the cleaning pipeline on a raw listings CSV
    Clean {
        /// Raw listings CSV produced by the scraper
        #[arg(long)]
        input: PathBuf,
        /// GeoJSON boundary layer (admin level 2)
        #[arg(long)]
        boundaries: PathBuf,
        /// Output CSV (defaults to <input stem>_cleaned.csv next to the input)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Taxonomy TOML overriding the built-in category tables
        #[arg(long)]
        taxonomy: Option<PathBuf>,
        /// Write the run report as JSON to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Merge per-region scraper CSVs (<base>/<region>/csv/*.csv) into one file
    Merge {
        #[arg(long)]
        base_dir: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Load a cleaned CSV into the Farms SQLite table
    LoadDb {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "farms.db")]
        database: PathBuf,
    },
    /// Generate scraper search queries from a boundary layer
    Queries {
        #[arg(long)]
        boundaries: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        taxonomy: Option<PathBuf>,
    },
}

fn print_report(report: &PipelineReport) {
    println!("\n📊 Cleaning results for {}:", report.input_file);
    println!("   Rows loaded: {}", report.rows_loaded);
    if report.ragged_rows + report.unreadable_rows > 0 {
        println!(
            "   Ragged rows: {}, unreadable rows skipped: {}",
            report.ragged_rows, report.unreadable_rows
        );
    }
    println!("   Columns dropped: {}", report.columns_dropped);
    println!(
        "   Dropped: {} missing coordinates, {} duplicates",
        report.missing_coordinates, report.duplicates
    );
    println!(
        "   Dropped: {} outside main category whitelist, {} without farm keyword",
        report.outside_main_category_whitelist, report.without_farm_keyword
    );
    println!("   Dropped: {} malformed coordinates", report.malformed_coordinates);
    println!("   Ambiguous main category: {}", report.multiple_main_category);
    println!(
        "   Outside all boundaries: {} (overlaps: {})",
        report.region_unassigned, report.region_overlaps
    );
    println!("   Rows written: {}", report.rows_written);
    println!("   Output file: {}", report.output_file);
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Clean {
            input,
            boundaries,
            output,
            taxonomy,
            report,
        } => {
            println!("🧹 Cleaning {}...", input.display());
            let result = run_clean(&input, &boundaries, output.as_deref(), taxonomy.as_deref())
                .with_context(|| format!("cleaning run failed for {}", input.display()))?;
            print_report(&result);

            if let Some(report_path) = report {
                result
                    .write_json(&report_path)
                    .with_context(|| format!("cannot write report {}", report_path.display()))?;
                println!("   Report: {}", report_path.display());
            }
        }
        Commands::Merge { base_dir, output } => {
            println!("🔗 Merging scraper outputs under {}...", base_dir.display());
            let summary = RawFileMerger::new(&base_dir).merge_into(&output)?;
            println!(
                "✅ Merged {} files ({} empty skipped) into {} ({} rows, {} columns)",
                summary.files_merged,
                summary.empty_files_skipped,
                output.display(),
                summary.rows_written,
                summary.columns
            );
        }
        Commands::LoadDb { input, database } => {
            println!("💾 Loading {} into {}...", input.display(), database.display());
            let inserted = load_into_database(&input, &database)
                .with_context(|| format!("cannot load {} into the database", input.display()))?;
            println!("✅ Data inserted successfully ({} rows)", inserted);
        }
        Commands::Queries {
            boundaries,
            output,
            taxonomy,
        } => {
            let taxonomy = Taxonomy::load_or_default(taxonomy.as_deref())?;
            let layer = BoundaryLayer::load(&boundaries, &taxonomy.boundary_properties)?;
            let queries = queries::generate_queries(&layer, &taxonomy.queries);
            queries::write_queries(&queries, &output)?;
            println!("✅ Wrote {} queries to {}", queries.len(), output.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let _guard = logging::init_logging();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}
