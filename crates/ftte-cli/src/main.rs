//! `ftte` — resolve the PM terminating each FTTE transport/distribution
//! splice in an inventory ZIP export.
//!
//! One positional argument: the archive path. `--debug` additionally
//! writes the per-cassette rejection report; `--json` replaces the human
//! summary with the machine-readable one.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use ftte_resolve::{run, RunOptions, RunSummary};

#[derive(Parser)]
#[command(name = "ftte")]
#[command(version, about = "FTTE analyzer: PM lookup via the PE node of the DI cable")]
struct Cli {
    /// Inventory export archive (`.zip`) containing the six tables.
    archive: PathBuf,

    /// Collect per-cassette diagnostics and write the rejection report.
    #[arg(long)]
    debug: bool,

    /// Directory for the timestamped output files.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Print the run summary as JSON instead of the human summary.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if !cli.archive.exists() {
        bail!("archive '{}' does not exist", cli.archive.display());
    }
    if cli.archive.extension().and_then(|ext| ext.to_str()) != Some("zip") {
        bail!("archive must be a .zip file: {}", cli.archive.display());
    }

    let options = RunOptions {
        debug: cli.debug,
        out_dir: cli.out_dir.clone(),
    };
    let summary = run(&cli.archive, &options)
        .with_context(|| format!("analysis of {} failed", cli.archive.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    eprintln!(
        "{} analysis finished in {:.2}s",
        "ok".green().bold(),
        summary.elapsed_secs
    );
    println!("Results:");
    println!("  - positions processed: {}", summary.stats.positions_seen);
    println!("  - FTTE connections found: {}", summary.stats.resolved);
    println!(
        "  - rejected, fiber not found: {}",
        summary.stats.fiber_not_found
    );
    println!(
        "  - rejected, not a TR/DI pair: {}",
        summary.stats.not_tr_di_pair
    );
    println!("  - rejected, no PE node: {}", summary.stats.no_pe_node);
    println!(
        "  - rejected, site not found: {}",
        summary.stats.site_not_found
    );
    println!(
        "  - rejected, local not found: {}",
        summary.stats.local_not_found
    );
    println!(
        "  - output file: {} ({:.2} MB)",
        summary.result_path.display(),
        summary.result_bytes as f64 / 1024.0 / 1024.0
    );
    if let Some(path) = &summary.diagnostics_path {
        println!("  - diagnostics report: {}", path.display());
        if let (Some(cassettes), Some(pms)) =
            (summary.cassettes_with_positions, summary.distinct_pms)
        {
            println!("  - cassettes with positions: {cassettes}");
            println!("  - distinct PMs found: {pms}");
        }
        println!("Check the diagnostics report to see why cassettes were rejected.");
    }
}
