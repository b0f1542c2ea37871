//! Typed rows for the six inventory tables.
//!
//! A [`Table`] is a decoded, delimiter-sniffed table body. Each table has
//! one row struct; column positions are resolved against the header once,
//! then every data record is mapped to a typed row. Field values are
//! trimmed at parse time for every table, so join keys are insensitive to
//! incidental padding in the export.

use std::collections::HashMap;
use std::marker::PhantomData;

use csv::StringRecord;

use crate::decode::{decode_table, sniff_delimiter};
use crate::TableError;

/// A decoded table ready for row iteration.
#[derive(Debug)]
pub struct Table {
    name: String,
    text: String,
    delimiter: u8,
    pub encoding: &'static str,
}

impl Table {
    /// Decode bytes, infer the delimiter and check the header exists.
    pub fn parse(name: &str, bytes: &[u8]) -> Result<Table, TableError> {
        let decoded = decode_table(name, bytes)?;
        if decoded
            .text
            .lines()
            .next()
            .map_or(true, |line| line.trim().is_empty())
        {
            return Err(TableError::EmptyTable(name.to_string()));
        }
        let delimiter = sniff_delimiter(&decoded.text);
        tracing::debug!(
            table = name,
            encoding = decoded.encoding,
            delimiter = %(delimiter as char),
            "table decoded"
        );
        Ok(Table {
            name: name.to_string(),
            text: decoded.text.into_owned(),
            delimiter,
            encoding: decoded.encoding,
        })
    }

    /// Iterate the data rows as typed records.
    ///
    /// Resolves the row type's required columns against the header up
    /// front; a missing column is fatal for the table.
    pub fn rows<R: FromTableRow>(&self) -> Result<RowIter<'_, R>, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(self.text.as_bytes());
        let headers = reader.headers().map_err(|source| TableError::MalformedRow {
            table: self.name.clone(),
            source,
        })?;
        let index = HeaderIndex::new(headers);
        let columns = R::resolve_columns(&self.name, &index)?;
        Ok(RowIter {
            records: reader.into_records(),
            columns,
            table: self.name.clone(),
            _row: PhantomData,
        })
    }
}

/// Header names mapped to field positions, after trimming and BOM removal.
pub struct HeaderIndex {
    by_name: HashMap<String, usize>,
}

impl HeaderIndex {
    fn new(headers: &StringRecord) -> Self {
        let mut by_name = HashMap::with_capacity(headers.len());
        for (position, raw) in headers.iter().enumerate() {
            let name = raw.replace('\u{feff}', "");
            let name = name.trim();
            if !name.is_empty() {
                by_name.insert(name.to_string(), position);
            }
        }
        HeaderIndex { by_name }
    }

    fn require(&self, table: &str, column: &'static str) -> Result<usize, TableError> {
        self.by_name
            .get(column)
            .copied()
            .ok_or_else(|| TableError::MissingColumn {
                table: table.to_string(),
                column,
            })
    }

    fn get(&self, column: &str) -> Option<usize> {
        self.by_name.get(column).copied()
    }
}

fn field(record: &StringRecord, position: usize) -> String {
    record.get(position).unwrap_or("").trim().to_string()
}

/// A table row type with a fixed set of source columns.
pub trait FromTableRow: Sized {
    type Columns;

    fn resolve_columns(table: &str, header: &HeaderIndex) -> Result<Self::Columns, TableError>;
    fn from_record(columns: &Self::Columns, record: &StringRecord) -> Self;
}

/// Streaming iterator over the typed rows of one table.
pub struct RowIter<'t, R: FromTableRow> {
    records: csv::StringRecordsIntoIter<&'t [u8]>,
    columns: R::Columns,
    table: String,
    _row: PhantomData<R>,
}

impl<R: FromTableRow> std::fmt::Debug for RowIter<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowIter")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl<R: FromTableRow> Iterator for RowIter<'_, R> {
    type Item = Result<R, TableError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.records.next()? {
            Ok(record) => Some(Ok(R::from_record(&self.columns, &record))),
            Err(source) => Some(Err(TableError::MalformedRow {
                table: self.table.clone(),
                source,
            })),
        }
    }
}

// ============================================================================
// Row types, one per table
// ============================================================================

/// `t_cassette.csv`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CassetteRow {
    pub code: String,
    pub kind: String,
    pub base_port_ref: String,
}

pub struct CassetteColumns {
    code: usize,
    kind: usize,
    base_port_ref: usize,
}

impl FromTableRow for CassetteRow {
    type Columns = CassetteColumns;

    fn resolve_columns(table: &str, header: &HeaderIndex) -> Result<Self::Columns, TableError> {
        Ok(CassetteColumns {
            code: header.require(table, "cs_code")?,
            kind: header.require(table, "cs_type")?,
            base_port_ref: header.require(table, "cs_bp_code")?,
        })
    }

    fn from_record(columns: &Self::Columns, record: &StringRecord) -> Self {
        CassetteRow {
            code: field(record, columns.code),
            kind: field(record, columns.kind),
            base_port_ref: field(record, columns.base_port_ref),
        }
    }
}

/// `t_cable.csv`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CableRow {
    pub code: String,
    pub type_code: String,
    /// `None` when the export has no label column at all.
    pub label: Option<String>,
    pub node_end_1: String,
    pub node_end_2: String,
}

pub struct CableColumns {
    code: usize,
    type_code: usize,
    label: Option<usize>,
    node_end_1: usize,
    node_end_2: usize,
}

impl FromTableRow for CableRow {
    type Columns = CableColumns;

    fn resolve_columns(table: &str, header: &HeaderIndex) -> Result<Self::Columns, TableError> {
        Ok(CableColumns {
            code: header.require(table, "cb_code")?,
            type_code: header.require(table, "cb_typelog")?,
            label: header.get("cb_etiquet"),
            node_end_1: header.require(table, "cb_nd1")?,
            node_end_2: header.require(table, "cb_nd2")?,
        })
    }

    fn from_record(columns: &Self::Columns, record: &StringRecord) -> Self {
        CableRow {
            code: field(record, columns.code),
            type_code: field(record, columns.type_code),
            label: columns.label.map(|position| field(record, position)),
            node_end_1: field(record, columns.node_end_1),
            node_end_2: field(record, columns.node_end_2),
        }
    }
}

/// `t_fibre.csv`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiberRow {
    pub code: String,
    pub cable_code: String,
}

pub struct FiberColumns {
    code: usize,
    cable_code: usize,
}

impl FromTableRow for FiberRow {
    type Columns = FiberColumns;

    fn resolve_columns(table: &str, header: &HeaderIndex) -> Result<Self::Columns, TableError> {
        Ok(FiberColumns {
            code: header.require(table, "fo_code")?,
            cable_code: header.require(table, "fo_cb_code")?,
        })
    }

    fn from_record(columns: &Self::Columns, record: &StringRecord) -> Self {
        FiberRow {
            code: field(record, columns.code),
            cable_code: field(record, columns.cable_code),
        }
    }
}

/// `t_site.csv`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRow {
    pub node_code: String,
    pub site_code: String,
}

pub struct SiteColumns {
    node_code: usize,
    site_code: usize,
}

impl FromTableRow for SiteRow {
    type Columns = SiteColumns;

    fn resolve_columns(table: &str, header: &HeaderIndex) -> Result<Self::Columns, TableError> {
        Ok(SiteColumns {
            node_code: header.require(table, "st_nd_code")?,
            site_code: header.require(table, "st_code")?,
        })
    }

    fn from_record(columns: &Self::Columns, record: &StringRecord) -> Self {
        SiteRow {
            node_code: field(record, columns.node_code),
            site_code: field(record, columns.site_code),
        }
    }
}

/// `t_local.csv`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRow {
    pub type_code: String,
    pub site_code: String,
    pub code: String,
    pub label: String,
}

pub struct LocalColumns {
    type_code: usize,
    site_code: usize,
    code: usize,
    label: usize,
}

impl FromTableRow for LocalRow {
    type Columns = LocalColumns;

    fn resolve_columns(table: &str, header: &HeaderIndex) -> Result<Self::Columns, TableError> {
        Ok(LocalColumns {
            type_code: header.require(table, "lc_typelog")?,
            site_code: header.require(table, "lc_st_code")?,
            code: header.require(table, "lc_code")?,
            label: header.require(table, "lc_etiquet")?,
        })
    }

    fn from_record(columns: &Self::Columns, record: &StringRecord) -> Self {
        LocalRow {
            type_code: field(record, columns.type_code),
            site_code: field(record, columns.site_code),
            code: field(record, columns.code),
            label: field(record, columns.label),
        }
    }
}

/// `t_position.csv`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionRow {
    pub cassette_code: String,
    pub fiber_1: String,
    pub fiber_2: String,
}

pub struct PositionColumns {
    cassette_code: usize,
    fiber_1: usize,
    fiber_2: usize,
}

impl FromTableRow for PositionRow {
    type Columns = PositionColumns;

    fn resolve_columns(table: &str, header: &HeaderIndex) -> Result<Self::Columns, TableError> {
        Ok(PositionColumns {
            cassette_code: header.require(table, "ps_cs_code")?,
            fiber_1: header.require(table, "ps_1")?,
            fiber_2: header.require(table, "ps_2")?,
        })
    }

    fn from_record(columns: &Self::Columns, record: &StringRecord) -> Self {
        PositionRow {
            cassette_code: field(record, columns.cassette_code),
            fiber_1: field(record, columns.fiber_1),
            fiber_2: field(record, columns.fiber_2),
        }
    }
}
