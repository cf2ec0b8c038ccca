//! fsort CLI - Sort a folder by file type
//!
//! Usage:
//!   fsort sort <folder> [--output <dir>] [--jobs N] [--parallel-scan] [--config <file.json>] [--json]
//!   fsort normalize <name>...

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fsort_core::{normalize, Category, SortConfig, SortReport, Sorter};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fsort")]
#[command(about = "fsort - Sort files into category folders", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sort a folder into images/audio/video/documents/archives/other
    Sort {
        /// Folder to sort
        folder: PathBuf,

        /// Output directory (default: ./result)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of concurrent tasks
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Scan top-level subfolders in parallel
        #[arg(long)]
        parallel_scan: bool,

        /// Follow symbolic links
        #[arg(long)]
        follow_links: bool,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the normalized form of file names
    Normalize {
        /// File names to normalize
        #[arg(required = true)]
        names: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Sort {
            folder,
            output,
            jobs,
            parallel_scan,
            follow_links,
            config,
            json,
        } => {
            let config = build_config(config.as_deref(), output, jobs, parallel_scan, follow_links)?;
            sort(&folder, config, json)
        }
        Commands::Normalize { names } => {
            for name in names {
                println!("{}", normalize(&name));
            }
            Ok(())
        }
    }
}

/// Merge the config file (if any) with command-line overrides
fn build_config(
    file: Option<&Path>,
    output: Option<PathBuf>,
    jobs: Option<usize>,
    parallel_scan: bool,
    follow_links: bool,
) -> Result<SortConfig> {
    let mut config = match file {
        Some(path) => SortConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SortConfig::default(),
    };

    if let Some(output) = output {
        config.output_dir = output;
    }
    if let Some(jobs) = jobs {
        config.concurrency = jobs;
    }
    config.parallel_scan |= parallel_scan;
    config.follow_links |= follow_links;

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn sort(folder: &Path, config: SortConfig, json: bool) -> Result<()> {
    let sorter = Sorter::new(config).context("Failed to set up sorter")?;
    let report = sorter
        .run(folder)
        .with_context(|| format!("Failed to sort {}", folder.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &SortReport) {
    println!();
    println!("Sorted {}", report.root.display());
    println!("Output:         {}", report.output_dir.display());
    println!("Files scanned:  {}", report.scan.files);
    println!("Folders:        {}", report.scan.folders);
    println!();

    println!("{:<12} {:>8} {:>8}", "CATEGORY", "DONE", "FAILED");
    println!("{}", "-".repeat(30));
    for category in Category::ALL {
        let outcome = report.outcome(category);
        println!("{:<12} {:>8} {:>8}", category.to_string(), outcome.succeeded, outcome.failed);
    }
    println!();

    if !report.extensions.is_empty() {
        println!("Extensions:     {}", join(&report.extensions));
    }
    if !report.unknown_extensions.is_empty() {
        println!("Unknown:        {}", join(&report.unknown_extensions));
    }
    if report.scan.skipped > 0 {
        println!("Skipped entries: {}", report.scan.skipped);
    }
    if report.scan.links > 0 {
        println!("Links ignored:  {}", report.scan.links);
    }
    if report.not_deleted() > 0 {
        println!("Archives unpacked but not deleted: {}", report.not_deleted());
    }
    if report.task_failures > 0 {
        println!("Tasks failed:   {}", report.task_failures);
    }

    println!();
    println!("Done in {:.2}s", report.elapsed_ms as f64 / 1000.0);
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items.into_iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
