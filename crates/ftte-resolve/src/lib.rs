//! PM resolution for FTTE splice cassettes.
//!
//! For every splice position held by an eligible ("FTTE") cassette, the
//! export should pair one transport (TR) fiber with one distribution (DI)
//! fiber whose cable ends on a `PE` node; that node leads to a site, and
//! the site to an SRO premises, the physical distribution point (PM).
//!
//! The crate is a one-shot pipeline over six tables:
//! - [`index`]: eligible-cassette set and the four reference lookups,
//!   built fully before any position is evaluated
//! - [`join`]: the per-position resolution chain with typed rejections
//! - [`diag`]: per-cassette rejection/destination tracking (debug mode)
//! - [`report`]: the `;`-delimited result file and the anomaly report
//! - [`pipeline`]: load → index → stream → report orchestration
//!
//! Per-row failures are [`join::Rejection`] values and never abort a run;
//! table-level failures are [`ResolveError`]s and always do.

use std::path::PathBuf;

pub mod diag;
pub mod index;
pub mod join;
pub mod pipeline;
pub mod report;

pub use diag::Diagnostics;
pub use ftte_tables::TableError;
pub use index::{Cable, Local, LoadStats, ReferenceIndexes};
pub use join::{resolve_position, FiberSlot, Outcome, Rejection, Resolution, RunStats};
pub use pipeline::{run, RunOptions, RunSummary};

/// Fatal errors of a resolution run.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("no eligible (FTTE) cassette in the export; nothing to join")]
    NoEligibleCassettes,
    #[error("cannot write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed writing result row: {0}")]
    ResultRow(#[from] csv::Error),
}
