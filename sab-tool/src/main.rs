use anyhow::{Context, Result};
use clap::Parser;
use std::{fs, path::PathBuf};
use tracing_subscriber::EnvFilter;

mod archiver;
mod fs_utils;
mod naming;
mod process;

use archiver::SystemAr;
use sab_lib::RunSummary;

const EXAMPLES: &str = "\
EXAMPLES:
    sab-tool              Build archives for every subdirectory
    sab-tool phx          Build the archive for one folder
    sab-tool phx ve2      Build archives for several folders

Archives are created as xrt_smi_<foldername>.a inside each folder.";

#[derive(Parser, Debug)]
#[command(author, version, about = "SAB CLI Archive Tool", long_about = None, after_help = EXAMPLES)]
pub struct Cli {
    /// Folder names to archive (default: every subdirectory of the current directory)
    #[arg()]
    pub folders: Vec<String>,

    /// Patterns to skip (can be specified multiple times)
    #[arg(short = 's', long)]
    pub skip: Vec<String>,

    /// Dry run (just list eligible files and the planned action)
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    pub dry: bool,

    /// Print the final summary as JSON
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,

    /// Enable debug diagnostics on stderr
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    pub verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Step 1: the external archiver is a hard precondition.
    SystemAr::ensure_available()?;

    let skip = fs_utils::compile_patterns(&cli.skip)?;

    // Step 2: resolve the folder list and drop names that are not
    // directories. Skipped names still count against the exit status.
    let requested = requested_folders(&cli.folders)?;
    let mut valid: Vec<PathBuf> = Vec::new();
    for name in &requested {
        let path = PathBuf::from(name);
        if path.is_dir() {
            valid.push(path);
        } else {
            eprintln!("Warning: folder {name} not found, skipping");
        }
    }
    if valid.is_empty() {
        eprintln!("No valid folders found");
        std::process::exit(1);
    }

    println!("Processing {} folder(s)...", valid.len());

    // Step 3: dry run stops before any archive is touched.
    if cli.dry {
        for folder in &valid {
            if let Err(e) = process::dry_run(folder, &skip) {
                eprintln!("✗ Failed: {e:#}");
            }
            println!();
        }
        return Ok(());
    }

    // Step 4: one pipeline run per folder, in input order, accumulating
    // totals. A failed folder never stops the remaining ones.
    let ar = SystemAr;
    let mut summary = RunSummary::new(requested.len());
    for folder in &valid {
        match process::process_folder(&ar, folder, &skip) {
            Ok(outcome) => summary.record(outcome),
            Err(e) => eprintln!("✗ Failed: {e:#}"),
        }
        println!();
    }

    // Step 5: final summary and exit status.
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    if !summary.all_succeeded() {
        std::process::exit(1);
    }
    Ok(())
}

/// Folder names to operate on: the CLI list as given, or every immediate
/// subdirectory of the current directory when none were supplied.
fn requested_folders(cli_folders: &[String]) -> Result<Vec<String>> {
    if !cli_folders.is_empty() {
        return Ok(cli_folders.to_vec());
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(".").context("reading current directory")? {
        let entry = entry?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();

    if !names.is_empty() {
        println!("No folders specified, processing all: {}", names.join(", "));
    }
    Ok(names)
}

fn print_summary(summary: &RunSummary) {
    println!("{}", "=".repeat(60));
    println!("SUMMARY:");
    println!(
        "Archives processed: {}/{}",
        summary.processed, summary.requested
    );
    println!("Total new members: {}", summary.total_new);
    println!("Total updated members: {}", summary.total_updated);

    if !summary.archives.is_empty() {
        println!("\nArchive changes:");
        for outcome in &summary.archives {
            let mut status = Vec::new();
            if !outcome.added.is_empty() {
                status.push(format!("{} new", outcome.added.len()));
            }
            if !outcome.updated.is_empty() {
                status.push(format!("{} updated", outcome.updated.len()));
            }
            let status = if status.is_empty() {
                "no changes".to_string()
            } else {
                status.join(", ")
            };
            println!("  {}: {status}", outcome.archive);
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
