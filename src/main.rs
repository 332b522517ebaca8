//! Deptmap - department enrollment treemaps
//!
//! A CLI tool that reads an enrollment spreadsheet, aggregates students
//! by department and section, and renders the result as a treemap.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, unreadable source, write failure)

mod analysis;
mod cli;
mod config;
mod error;
mod layout;
mod models;
mod report;
mod sheet;
mod source;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use models::{Report, ReportMetadata};
use source::{FetchOptions, SourceLocation};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("deptmap v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            let no_hierarchy = e
                .downcast_ref::<error::DeptmapError>()
                .is_some_and(|err| err.is_source_error());
            if no_hierarchy {
                eprintln!("   No treemap was produced: the spreadsheet could not be loaded.");
            }
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .deptmap.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the source, canvas size, and output.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the load → aggregate → render pipeline once.
async fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    // Step 1: Fetch the spreadsheet
    let location = SourceLocation::parse(&config.source.location);
    if !args.quiet {
        if location.is_remote() {
            println!("📥 Downloading spreadsheet: {}", location);
        } else {
            println!("📂 Reading spreadsheet: {}", location);
        }
    }

    let fetch_options = FetchOptions {
        timeout: config.fetch_timeout(),
        show_progress: !args.quiet,
    };
    let bytes = source::fetch_spreadsheet(&location, &fetch_options).await?;

    // Step 2: Decode the first sheet
    let sheet = sheet::read_first_sheet(&bytes, &location.to_string())?;
    if !sheet.missing_headers.is_empty() {
        warn!(
            "Sheet '{}' is missing columns: {}",
            sheet.sheet_name,
            sheet.missing_headers.join(", ")
        );
    }

    // Step 3: Aggregate
    let hierarchy = analysis::aggregate(&sheet.records);

    let report = Report {
        title: config.report.title.clone(),
        metadata: ReportMetadata {
            source: location.to_string(),
            sheet_name: sheet.sheet_name.clone(),
            generated_at: Utc::now(),
            records_read: sheet.records.len(),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        hierarchy,
    };

    // Step 4: Render and save
    let output = report::render(&report, &config)?;
    let output_path = PathBuf::from(&config.report.output);
    report::write_output(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    info!(
        "Wrote {:?} output ({} bytes) to {}",
        config.report.format,
        output.len(),
        output_path.display()
    );

    if !args.quiet {
        let hierarchy = &report.hierarchy;
        println!("\n📊 Enrollment Summary:");
        println!("   Records read: {}", report.metadata.records_read);
        println!("   Departments: {}", hierarchy.departments.len());
        println!("   Sections: {}", hierarchy.section_count());
        println!("   Total students: {}", hierarchy.total_students());
        if hierarchy.uncounted_records > 0 {
            println!(
                "   ⚠️  Records without a usable Student_Count: {}",
                hierarchy.uncounted_records
            );
        }
        println!(
            "\n✅ Done in {:.1}s! Output saved to: {}",
            start_time.elapsed().as_secs_f64(),
            output_path.display()
        );
    }

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
