//! Result file writing.
//!
//! Results stream straight to disk as they are produced; nothing is held
//! back in memory. Column names and file naming follow the historical
//! consumers of this report, so they stay as-is (French headers included).

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::join::Resolution;
use crate::ResolveError;

/// Fixed output column order.
pub const RESULT_COLUMNS: [&str; 9] = [
    "Cassette FTTE",
    "Fibre Transport",
    "Cable Transport",
    "Fibre Distribution",
    "Cable Distribution",
    "Noeud PE",
    "Site",
    "Local PM",
    "Etiquette PM",
];

/// Timestamp embedded in output file names so reruns never overwrite.
pub fn run_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

pub fn result_file_name(debug: bool, timestamp: &str) -> String {
    if debug {
        format!("ftte_debug_{timestamp}.csv")
    } else {
        format!("ftte_results_{timestamp}.csv")
    }
}

pub fn diagnostics_file_name(timestamp: &str) -> String {
    format!("ftte_rejets_{timestamp}.txt")
}

/// Streaming `;`-delimited UTF-8 writer for resolution records.
pub struct ResultWriter {
    writer: csv::Writer<File>,
    path: PathBuf,
    rows: u64,
}

impl ResultWriter {
    /// Create the file and write the header row.
    pub fn create(path: &Path) -> Result<Self, ResolveError> {
        let file = File::create(path).map_err(|source| ResolveError::Output {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(file);
        writer.write_record(RESULT_COLUMNS)?;
        Ok(ResultWriter {
            writer,
            path: path.to_path_buf(),
            rows: 0,
        })
    }

    pub fn write(&mut self, resolution: &Resolution) -> Result<(), ResolveError> {
        self.writer.write_record([
            resolution.cassette.as_str(),
            resolution.transport_fiber.as_str(),
            resolution.transport_cable_label.as_str(),
            resolution.distribution_fiber.as_str(),
            resolution.distribution_cable_label.as_str(),
            resolution.pe_node.as_str(),
            resolution.site.as_str(),
            resolution.local_code.as_str(),
            resolution.local_label.as_str(),
        ])?;
        self.rows += 1;
        Ok(())
    }

    /// Flush and close, returning the path and row count.
    pub fn finish(mut self) -> Result<(PathBuf, u64), ResolveError> {
        self.writer.flush().map_err(|source| ResolveError::Output {
            path: self.path.clone(),
            source,
        })?;
        Ok((self.path, self.rows))
    }
}
