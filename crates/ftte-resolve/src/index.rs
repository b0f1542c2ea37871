//! Reference indices built from the five lookup tables.
//!
//! All indices are built fully before the first position row is evaluated
//! and are read-only afterwards. The only cross-table validation here is
//! referential: a fiber whose cable is unknown is silently left out of the
//! fiber index (the join later rejects positions touching it).

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use ftte_tables::{CableRow, CassetteRow, FiberRow, LocalRow, SiteRow, TableError};

/// Node prefix that marks the pivot equipment of the resolution chain.
const PE_PREFIX: &str = "PE";

/// A cable with its derived PE node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cable {
    pub type_code: String,
    pub label: String,
    pub node_end_1: String,
    pub node_end_2: String,
    /// First of end 1 then end 2 starting with `PE`, fixed for the run.
    pub pe_node: Option<String>,
}

impl Cable {
    fn from_row(row: CableRow) -> (String, Cable) {
        let pe_node = if row.node_end_1.starts_with(PE_PREFIX) {
            Some(row.node_end_1.clone())
        } else if row.node_end_2.starts_with(PE_PREFIX) {
            Some(row.node_end_2.clone())
        } else {
            None
        };
        let label = row.label.unwrap_or_else(|| row.code.clone());
        let cable = Cable {
            type_code: row.type_code,
            label,
            node_end_1: row.node_end_1,
            node_end_2: row.node_end_2,
            pe_node,
        };
        (row.code, cable)
    }
}

/// An SRO premises (PM candidate) attached to a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Local {
    pub code: String,
    pub label: String,
}

/// All lookups the join engine needs, frozen after loading.
#[derive(Debug, Default)]
pub struct ReferenceIndexes {
    pub eligible_cassettes: HashSet<String>,
    pub cables: HashMap<String, Cable>,
    pub fiber_to_cable: HashMap<String, String>,
    pub node_to_site: HashMap<String, String>,
    pub site_to_local: HashMap<String, Local>,
}

/// Row/entry counts observed while loading the reference tables.
#[derive(Debug, Default, Clone, Serialize)]
pub struct LoadStats {
    pub cassette_rows: u64,
    pub eligible_cassettes: u64,
    pub cables: u64,
    pub cables_with_pe: u64,
    pub fibers_indexed: u64,
    pub node_site_links: u64,
    pub pe_nodes: u64,
    pub sro_locals: u64,
}

/// Cassettes are eligible ("FTTE") when typed `E` with no base-port
/// reference. Only the id set is retained.
pub fn load_eligible_cassettes<I>(
    rows: I,
    stats: &mut LoadStats,
) -> Result<HashSet<String>, TableError>
where
    I: IntoIterator<Item = Result<CassetteRow, TableError>>,
{
    let mut eligible = HashSet::new();
    for row in rows {
        let row = row?;
        stats.cassette_rows += 1;
        if row.kind == "E" && row.base_port_ref.is_empty() {
            eligible.insert(row.code);
        }
    }
    stats.eligible_cassettes = eligible.len() as u64;
    tracing::info!(
        rows = stats.cassette_rows,
        eligible = stats.eligible_cassettes,
        "cassette table loaded"
    );
    Ok(eligible)
}

/// Cables are retained fully, keyed by code, with the PE node derived once.
pub fn load_cables<I>(rows: I, stats: &mut LoadStats) -> Result<HashMap<String, Cable>, TableError>
where
    I: IntoIterator<Item = Result<CableRow, TableError>>,
{
    let mut cables = HashMap::new();
    for row in rows {
        let (code, cable) = Cable::from_row(row?);
        if cable.pe_node.is_some() {
            stats.cables_with_pe += 1;
        }
        cables.insert(code, cable);
    }
    stats.cables = cables.len() as u64;
    tracing::info!(
        cables = stats.cables,
        with_pe_node = stats.cables_with_pe,
        "cable table loaded"
    );
    Ok(cables)
}

/// Index fibers onto their owning cable, dropping fibers whose cable is not
/// loaded. That silently excludes fibers on cables outside the export (or
/// malformed references); positions touching them are rejected later.
pub fn load_fiber_index<I>(
    rows: I,
    cables: &HashMap<String, Cable>,
    stats: &mut LoadStats,
) -> Result<HashMap<String, String>, TableError>
where
    I: IntoIterator<Item = Result<FiberRow, TableError>>,
{
    let mut fiber_to_cable = HashMap::new();
    let mut indexed: u64 = 0;
    for row in rows {
        let row = row?;
        if cables.contains_key(&row.cable_code) {
            fiber_to_cable.insert(row.code, row.cable_code);
            indexed += 1;
            if indexed % 500_000 == 0 {
                tracing::info!(fibers = indexed, "fiber indexing progress");
            }
        }
    }
    stats.fibers_indexed = fiber_to_cable.len() as u64;
    tracing::info!(fibers = stats.fibers_indexed, "fiber table indexed");
    Ok(fiber_to_cable)
}

/// Map nodes onto sites; rows with an empty node or site are skipped.
/// Last-seen wins on duplicates; a conflicting overwrite is only surfaced
/// at debug level.
pub fn load_site_index<I>(
    rows: I,
    stats: &mut LoadStats,
) -> Result<HashMap<String, String>, TableError>
where
    I: IntoIterator<Item = Result<SiteRow, TableError>>,
{
    let mut node_to_site = HashMap::new();
    for row in rows {
        let row = row?;
        if row.node_code.is_empty() || row.site_code.is_empty() {
            continue;
        }
        if row.node_code.starts_with(PE_PREFIX) {
            stats.pe_nodes += 1;
        }
        if let Some(previous) = node_to_site.insert(row.node_code.clone(), row.site_code.clone()) {
            if previous != row.site_code {
                tracing::debug!(
                    node = %row.node_code,
                    previous = %previous,
                    kept = %row.site_code,
                    "duplicate node-site link, last one wins"
                );
            }
        }
    }
    stats.node_site_links = node_to_site.len() as u64;
    tracing::info!(
        links = stats.node_site_links,
        pe_nodes = stats.pe_nodes,
        "site table loaded"
    );
    Ok(node_to_site)
}

/// Map sites onto their SRO premises; other premises types are ignored.
pub fn load_local_index<I>(
    rows: I,
    stats: &mut LoadStats,
) -> Result<HashMap<String, Local>, TableError>
where
    I: IntoIterator<Item = Result<LocalRow, TableError>>,
{
    let mut site_to_local = HashMap::new();
    for row in rows {
        let row = row?;
        if row.type_code != "SRO" || row.site_code.is_empty() {
            continue;
        }
        let local = Local {
            code: row.code,
            label: row.label,
        };
        if let Some(previous) = site_to_local.insert(row.site_code.clone(), local.clone()) {
            if previous != local {
                tracing::debug!(
                    site = %row.site_code,
                    previous = %previous.code,
                    kept = %local.code,
                    "duplicate SRO premises for site, last one wins"
                );
            }
        }
    }
    stats.sro_locals = site_to_local.len() as u64;
    tracing::info!(locals = stats.sro_locals, "SRO premises loaded");
    Ok(site_to_local)
}
