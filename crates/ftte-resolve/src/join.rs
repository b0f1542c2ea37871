//! The per-position resolution chain.
//!
//! A position pairs two fibers inside a cassette. For eligible cassettes
//! the chain is: both fibers must be indexed, their cables must form a
//! TR/DI pair (either order), the DI cable must end on a `PE` node, that
//! node must map to a site, and the site to an SRO premises. One resolved
//! record or one typed rejection comes out; nothing here ever fails a run.

use std::fmt;

use serde::Serialize;

use ftte_tables::PositionRow;

use crate::index::{Cable, ReferenceIndexes};

/// Which of the two fiber references of a position failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiberSlot {
    First,
    Second,
}

impl fmt::Display for FiberSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FiberSlot::First => f.write_str("1"),
            FiberSlot::Second => f.write_str("2"),
        }
    }
}

/// Why an eligible position produced no output record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    FiberNotFound { slot: FiberSlot, fiber: String },
    NotTrDiPair { type_1: String, type_2: String },
    NoPeNode { cable_label: String },
    SiteNotFound { pe_node: String },
    LocalNotFound { site: String },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::FiberNotFound { slot, fiber } => {
                write!(f, "fiber {slot} {fiber} not found")
            }
            Rejection::NotTrDiPair { type_1, type_2 } => {
                write!(f, "not a TR/DI pair: {type_1}-{type_2}")
            }
            Rejection::NoPeNode { cable_label } => {
                write!(f, "no PE node on distribution cable {cable_label}")
            }
            Rejection::SiteNotFound { pe_node } => {
                write!(f, "site not found for node {pe_node}")
            }
            Rejection::LocalNotFound { site } => {
                write!(f, "local (SRO) not found for site {site}")
            }
        }
    }
}

/// A fully resolved position: the PM and everything leading to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub cassette: String,
    pub transport_fiber: String,
    pub transport_cable_label: String,
    pub distribution_fiber: String,
    pub distribution_cable_label: String,
    pub pe_node: String,
    pub site: String,
    pub local_code: String,
    pub local_label: String,
}

/// Outcome of one position row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Resolved(Resolution),
    Rejected {
        cassette: String,
        rejection: Rejection,
    },
    /// Cassette is not FTTE-eligible; not counted as a rejection.
    Skipped,
}

/// Per-category counters, always collected (debug mode or not).
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunStats {
    pub positions_seen: u64,
    pub resolved: u64,
    pub fiber_not_found: u64,
    pub not_tr_di_pair: u64,
    pub no_pe_node: u64,
    pub site_not_found: u64,
    pub local_not_found: u64,
}

impl RunStats {
    /// Record one position outcome. Call exactly once per row.
    pub fn record(&mut self, outcome: &Outcome) {
        self.positions_seen += 1;
        match outcome {
            Outcome::Resolved(_) => self.resolved += 1,
            Outcome::Rejected { rejection, .. } => match rejection {
                Rejection::FiberNotFound { .. } => self.fiber_not_found += 1,
                Rejection::NotTrDiPair { .. } => self.not_tr_di_pair += 1,
                Rejection::NoPeNode { .. } => self.no_pe_node += 1,
                Rejection::SiteNotFound { .. } => self.site_not_found += 1,
                Rejection::LocalNotFound { .. } => self.local_not_found += 1,
            },
            Outcome::Skipped => {}
        }
    }

    pub fn rejections(&self) -> u64 {
        self.fiber_not_found
            + self.not_tr_di_pair
            + self.no_pe_node
            + self.site_not_found
            + self.local_not_found
    }
}

fn cable_of<'a>(
    indexes: &'a ReferenceIndexes,
    fiber: &str,
) -> Option<&'a Cable> {
    let code = indexes.fiber_to_cable.get(fiber)?;
    // Present by construction: the fiber index only admits loaded cables.
    indexes.cables.get(code)
}

/// Run the resolution chain on one position row.
pub fn resolve_position(indexes: &ReferenceIndexes, row: &PositionRow) -> Outcome {
    if !indexes.eligible_cassettes.contains(&row.cassette_code) {
        return Outcome::Skipped;
    }
    let cassette = row.cassette_code.clone();
    let reject = |rejection| Outcome::Rejected {
        cassette: row.cassette_code.clone(),
        rejection,
    };

    let Some(cable_1) = cable_of(indexes, &row.fiber_1) else {
        return reject(Rejection::FiberNotFound {
            slot: FiberSlot::First,
            fiber: row.fiber_1.clone(),
        });
    };
    let Some(cable_2) = cable_of(indexes, &row.fiber_2) else {
        return reject(Rejection::FiberNotFound {
            slot: FiberSlot::Second,
            fiber: row.fiber_2.clone(),
        });
    };

    // Exactly one TR and one DI, either order.
    let (transport_fiber, transport, distribution_fiber, distribution) =
        match (cable_1.type_code.as_str(), cable_2.type_code.as_str()) {
            ("TR", "DI") => (&row.fiber_1, cable_1, &row.fiber_2, cable_2),
            ("DI", "TR") => (&row.fiber_2, cable_2, &row.fiber_1, cable_1),
            (type_1, type_2) => {
                return reject(Rejection::NotTrDiPair {
                    type_1: type_1.to_string(),
                    type_2: type_2.to_string(),
                })
            }
        };

    // The PE node is read from the distribution cable only.
    let Some(pe_node) = distribution.pe_node.as_deref() else {
        return reject(Rejection::NoPeNode {
            cable_label: distribution.label.clone(),
        });
    };
    let Some(site) = indexes.node_to_site.get(pe_node) else {
        return reject(Rejection::SiteNotFound {
            pe_node: pe_node.to_string(),
        });
    };
    let Some(local) = indexes.site_to_local.get(site) else {
        return reject(Rejection::LocalNotFound { site: site.clone() });
    };

    Outcome::Resolved(Resolution {
        cassette,
        transport_fiber: transport_fiber.clone(),
        transport_cable_label: transport.label.clone(),
        distribution_fiber: distribution_fiber.clone(),
        distribution_cable_label: distribution.label.clone(),
        pe_node: pe_node.to_string(),
        site: site.clone(),
        local_code: local.code.clone(),
        local_label: local.label.clone(),
    })
}
