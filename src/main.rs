//! test262-harness CLI
//!
//! Engine-independent inspection of a test262 checkout: parse a file's
//! frontmatter, or show what a suite run would execute.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io;
use std::path::{Path, PathBuf};
use test262_harness::config::DEFAULT_DIRECTORIES;
use test262_harness::plan::{self, FilePlan};
use test262_harness::{walker, Edition, HarnessConfig, TestMetadata, VERSION};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "test262-harness")]
#[command(author, version, about = "test262 conformance harness", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the parsed frontmatter of a test file as JSON
    Meta {
        /// The test file
        file: PathBuf,
    },

    /// Show which files a suite run would execute, and how
    Plan {
        /// test262 checkout
        root: PathBuf,
        /// Directories to walk, relative to the root
        dirs: Vec<String>,
        /// Edition id a file must carry (es5id, es6id, esid)
        #[arg(short, long, default_value_t = Edition::Es5)]
        edition: Edition,
        /// Only plan files whose path contains this pattern
        #[arg(short, long)]
        filter: Option<String>,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    debug!(version = VERSION, "starting");

    match cli.command {
        Commands::Meta { file } => show_metadata(&file),
        Commands::Plan {
            root,
            dirs,
            edition,
            filter,
            json,
        } => {
            let dirs = if dirs.is_empty() {
                DEFAULT_DIRECTORIES.iter().map(|d| d.to_string()).collect()
            } else {
                dirs
            };
            let mut config = HarnessConfig::default()
                .with_root(root)
                .with_directories(dirs)
                .with_edition(edition);
            if let Some(filter) = filter {
                config = config.with_filter(filter);
            }
            show_plan(&config, json)
        }
    }
}

/// `RUST_LOG` wins; otherwise the `-v` count picks the level
fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn show_metadata(file: &Path) -> Result<()> {
    let (metadata, _) = TestMetadata::from_file(file)?;
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}

#[derive(Default)]
struct PlanTotals {
    files: usize,
    runs: usize,
    skipped: usize,
    not_applicable: usize,
    invalid: usize,
}

fn show_plan(config: &HarnessConfig, as_json: bool) -> Result<()> {
    let mut totals = PlanTotals::default();
    let mut entries = Vec::new();

    for dir in &config.directories {
        let files = walker::walk(&config.test262_root, dir)
            .with_context(|| format!("walking {}", dir))?;

        for path in files.iter().filter(|p| plan::matches_filter(config, p)) {
            totals.files += 1;
            let file_plan = plan::plan_file(config, path);
            let entry = match &file_plan {
                FilePlan::Run(runs) => {
                    totals.runs += runs.len();
                    let variants: Vec<String> = runs.iter().map(|r| r.variant.to_string()).collect();
                    if !as_json {
                        println!("RUN     {} [{}]", path, variants.join(", "));
                    }
                    json!({ "path": path, "plan": "run", "variants": variants })
                }
                FilePlan::Skipped { reason } => {
                    totals.skipped += 1;
                    if !as_json {
                        println!("SKIP    {} ({})", path, reason);
                    }
                    json!({ "path": path, "plan": "skip", "reason": reason })
                }
                FilePlan::NotApplicable => {
                    totals.not_applicable += 1;
                    json!({ "path": path, "plan": "not_applicable" })
                }
                FilePlan::Invalid(err) => {
                    totals.invalid += 1;
                    if !as_json {
                        println!("INVALID {}: {}", path, err);
                    }
                    json!({ "path": path, "plan": "invalid", "error": err.to_string() })
                }
            };
            if as_json {
                entries.push(entry);
            }
        }
    }

    if as_json {
        let out = json!({
            "root": config.test262_root.display().to_string(),
            "edition": config.edition.key(),
            "files": entries,
            "summary": {
                "files": totals.files,
                "runs": totals.runs,
                "skipped": totals.skipped,
                "not_applicable": totals.not_applicable,
                "invalid": totals.invalid,
            },
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!();
        println!(
            "{} files: {} runs, {} skipped, {} not applicable ({}), {} invalid",
            totals.files,
            totals.runs,
            totals.skipped,
            totals.not_applicable,
            config.edition,
            totals.invalid
        );
    }
    Ok(())
}
