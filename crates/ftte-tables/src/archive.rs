//! Inventory container access.
//!
//! The export is a plain ZIP file whose entry names are fixed by the
//! upstream inventory tool. Presence of all six tables is checked up front
//! so a truncated export fails before any processing starts.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::ZipArchive;

use crate::TableError;

pub const TABLE_CASSETTE: &str = "t_cassette.csv";
pub const TABLE_POSITION: &str = "t_position.csv";
pub const TABLE_FIBER: &str = "t_fibre.csv";
pub const TABLE_CABLE: &str = "t_cable.csv";
pub const TABLE_SITE: &str = "t_site.csv";
pub const TABLE_LOCAL: &str = "t_local.csv";

/// Every entry an export must contain, in load order.
pub const REQUIRED_TABLES: [&str; 6] = [
    TABLE_CASSETTE,
    TABLE_POSITION,
    TABLE_FIBER,
    TABLE_CABLE,
    TABLE_SITE,
    TABLE_LOCAL,
];

/// An opened inventory ZIP with the required entries verified.
#[derive(Debug)]
pub struct InventoryArchive {
    zip: ZipArchive<File>,
}

impl InventoryArchive {
    /// Open the container and verify all required tables are present.
    pub fn open(path: &Path) -> Result<Self, TableError> {
        let file = File::open(path)?;
        let zip = ZipArchive::new(file)?;
        let archive = InventoryArchive { zip };
        archive.verify_required()?;
        tracing::info!(path = %path.display(), "all required tables present");
        Ok(archive)
    }

    fn verify_required(&self) -> Result<(), TableError> {
        for name in REQUIRED_TABLES {
            if !self.zip.file_names().any(|entry| entry == name) {
                return Err(TableError::MissingTable(name));
            }
        }
        Ok(())
    }

    /// Read one table entry fully into memory.
    ///
    /// Tables are decoded as a whole (the encoding sniff needs the full
    /// byte stream), so there is no per-entry streaming here; the position
    /// table is still iterated row by row after decoding.
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, TableError> {
        let mut entry = self.zip.by_name(name)?;
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_zip(entries: &[(&str, &str)]) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut writer = ZipWriter::new(file.reopen().unwrap());
        for (name, body) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
        file
    }

    #[test]
    fn open_rejects_archive_with_missing_table() {
        let file = write_zip(&[(TABLE_CASSETTE, "cs_code;cs_type;cs_bp_code\n")]);
        let err = InventoryArchive::open(file.path()).unwrap_err();
        match err {
            TableError::MissingTable(name) => assert_eq!(name, TABLE_POSITION),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn read_entry_returns_raw_bytes() {
        let entries: Vec<(&str, &str)> = REQUIRED_TABLES.iter().map(|n| (*n, "a;b\n1;2\n")).collect();
        let file = write_zip(&entries);
        let mut archive = InventoryArchive::open(file.path()).unwrap();
        let bytes = archive.read_entry(TABLE_SITE).unwrap();
        assert_eq!(bytes, b"a;b\n1;2\n");
    }
}
