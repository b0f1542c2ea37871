//! Table access for FTTE inventory exports.
//!
//! An inventory export is a ZIP container holding six delimited text tables
//! (cassettes, positions, fibers, cables, sites, premises). This crate owns
//! the untrusted input boundary:
//! - [`archive`]: open the container, check the required entries, read bytes
//! - [`decode`]: candidate-encoding decoding and delimiter inference
//! - [`records`]: one typed row struct per table, parsed in a single step
//!
//! Everything downstream (index building, the join chain) works on typed
//! rows only; no field-name-keyed maps escape this crate.

pub mod archive;
pub mod decode;
pub mod records;

pub use archive::{InventoryArchive, REQUIRED_TABLES};
pub use decode::{decode_table, sniff_delimiter, DecodedTable};
pub use records::{
    CableRow, CassetteRow, FiberRow, FromTableRow, LocalRow, PositionRow, RowIter, SiteRow, Table,
};

/// Errors raised while opening the container or parsing a table.
///
/// All of these are fatal to a run: a table that cannot be read, decoded or
/// mapped to its typed rows aborts the whole analysis (fail-fast, per-row
/// problems are handled downstream as rejections instead).
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("cannot open archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("missing required table: {0}")]
    MissingTable(&'static str),
    #[error("table {0} is empty (no header row)")]
    EmptyTable(String),
    #[error("table {table} is missing required column `{column}`")]
    MissingColumn { table: String, column: &'static str },
    #[error("table {table}: no candidate encoding decoded the contents")]
    Undecodable { table: String },
    #[error("table {table}: malformed row: {source}")]
    MalformedRow {
        table: String,
        #[source]
        source: csv::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
