//! One-shot run orchestration: load, index, stream, report.
//!
//! Two phases, strictly ordered: the five reference tables are loaded and
//! frozen first, then the position table is streamed row by row. Any
//! table-level failure aborts the run; per-row failures only feed the
//! rejection counters (and the diagnostics collector in debug mode).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use ftte_tables::archive::{
    TABLE_CABLE, TABLE_CASSETTE, TABLE_FIBER, TABLE_LOCAL, TABLE_POSITION, TABLE_SITE,
};
use ftte_tables::{InventoryArchive, PositionRow, Table};

use crate::diag::Diagnostics;
use crate::index::{
    load_cables, load_eligible_cassettes, load_fiber_index, load_local_index, load_site_index,
    LoadStats, ReferenceIndexes,
};
use crate::join::{resolve_position, Outcome, RunStats};
use crate::report::{diagnostics_file_name, result_file_name, run_timestamp, ResultWriter};
use crate::ResolveError;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Collect per-cassette diagnostics and write the anomaly report.
    pub debug: bool,
    /// Directory receiving the timestamped output files.
    pub out_dir: PathBuf,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            debug: false,
            out_dir: PathBuf::from("."),
        }
    }
}

/// Everything a caller needs to know about a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub load: LoadStats,
    pub stats: RunStats,
    pub elapsed_secs: f64,
    pub result_path: PathBuf,
    pub result_rows: u64,
    pub result_bytes: u64,
    pub diagnostics_path: Option<PathBuf>,
    /// Debug mode only: distinct eligible cassettes seen in positions.
    pub cassettes_with_positions: Option<u64>,
    /// Debug mode only: distinct PMs reached.
    pub distinct_pms: Option<u64>,
}

/// Run the full analysis over one inventory archive.
pub fn run(archive_path: &Path, options: &RunOptions) -> Result<RunSummary, ResolveError> {
    let started = Instant::now();
    tracing::info!(archive = %archive_path.display(), debug = options.debug, "starting analysis");

    let mut archive = InventoryArchive::open(archive_path)?;
    let mut load = LoadStats::default();

    // Phase 1: reference tables, in load order. Frozen once built.
    let bytes = archive.read_entry(TABLE_CASSETTE)?;
    let table = Table::parse(TABLE_CASSETTE, &bytes)?;
    let eligible_cassettes = load_eligible_cassettes(table.rows()?, &mut load)?;
    if eligible_cassettes.is_empty() {
        return Err(ResolveError::NoEligibleCassettes);
    }

    let bytes = archive.read_entry(TABLE_CABLE)?;
    let table = Table::parse(TABLE_CABLE, &bytes)?;
    let cables = load_cables(table.rows()?, &mut load)?;

    let bytes = archive.read_entry(TABLE_FIBER)?;
    let table = Table::parse(TABLE_FIBER, &bytes)?;
    let fiber_to_cable = load_fiber_index(table.rows()?, &cables, &mut load)?;

    let bytes = archive.read_entry(TABLE_SITE)?;
    let table = Table::parse(TABLE_SITE, &bytes)?;
    let node_to_site = load_site_index(table.rows()?, &mut load)?;

    let bytes = archive.read_entry(TABLE_LOCAL)?;
    let table = Table::parse(TABLE_LOCAL, &bytes)?;
    let site_to_local = load_local_index(table.rows()?, &mut load)?;

    let indexes = ReferenceIndexes {
        eligible_cassettes,
        cables,
        fiber_to_cable,
        node_to_site,
        site_to_local,
    };

    // Phase 2: stream positions, writing each resolution as it comes.
    let timestamp = run_timestamp();
    let result_path = options.out_dir.join(result_file_name(options.debug, &timestamp));
    let mut writer = ResultWriter::create(&result_path)?;
    let mut stats = RunStats::default();
    let mut diagnostics = options.debug.then(Diagnostics::default);

    let bytes = archive.read_entry(TABLE_POSITION)?;
    let table = Table::parse(TABLE_POSITION, &bytes)?;
    for row in table.rows::<PositionRow>()? {
        let row = row?;
        let outcome = resolve_position(&indexes, &row);
        stats.record(&outcome);
        if let Some(diagnostics) = diagnostics.as_mut() {
            diagnostics.record(&outcome);
        }
        if let Outcome::Resolved(resolution) = &outcome {
            writer.write(resolution)?;
        }
        if stats.positions_seen % 100_000 == 0 {
            tracing::info!(
                positions = stats.positions_seen,
                resolved = stats.resolved,
                "position stream progress"
            );
        }
    }
    let (result_path, result_rows) = writer.finish()?;
    let result_bytes = std::fs::metadata(&result_path)
        .map(|metadata| metadata.len())
        .unwrap_or(0);

    let mut diagnostics_path = None;
    let mut cassettes_with_positions = None;
    let mut distinct_pms = None;
    if let Some(diagnostics) = &diagnostics {
        let path = options.out_dir.join(diagnostics_file_name(&timestamp));
        let output_error = |source: std::io::Error, path: &Path| ResolveError::Output {
            path: path.to_path_buf(),
            source,
        };
        let mut report =
            BufWriter::new(File::create(&path).map_err(|source| output_error(source, &path))?);
        diagnostics
            .write_report(&mut report, &stats, load.eligible_cassettes)
            .map_err(|source| output_error(source, &path))?;
        report.flush().map_err(|source| output_error(source, &path))?;
        cassettes_with_positions = Some(diagnostics.cassettes_seen());
        distinct_pms = Some(diagnostics.distinct_pms());
        diagnostics_path = Some(path);
    }

    let elapsed_secs = started.elapsed().as_secs_f64();
    tracing::info!(
        positions = stats.positions_seen,
        resolved = stats.resolved,
        rejections = stats.rejections(),
        elapsed_secs,
        "analysis complete"
    );

    Ok(RunSummary {
        load,
        stats,
        elapsed_secs,
        result_path,
        result_rows,
        result_bytes,
        diagnostics_path,
        cassettes_with_positions,
        distinct_pms,
    })
}
