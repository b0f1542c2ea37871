//! Per-cassette diagnostics (debug mode only).
//!
//! Tracks, for every eligible cassette seen in the position stream, how
//! often it appeared and which distinct rejection reasons it hit, plus the
//! set of cassettes each PM received. The anomaly report flags PMs fed by
//! more than one cassette (a likely inventory inconsistency) and cassettes
//! that never resolved. BTree collections keep the report deterministic.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

use crate::join::{Outcome, RunStats};

#[derive(Debug, Default)]
pub struct Diagnostics {
    /// PM code -> distinct cassettes that resolved onto it.
    pm_cassettes: BTreeMap<String, BTreeSet<String>>,
    /// Cassette -> number of position rows seen (rejected or resolved).
    occurrences: BTreeMap<String, u64>,
    /// Cassette -> distinct rejection reasons (duplicates collapsed).
    reasons: BTreeMap<String, BTreeSet<String>>,
}

impl Diagnostics {
    /// Record one position outcome. Skipped rows (non-eligible cassettes)
    /// are not tracked.
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Resolved(resolution) => {
                *self.occurrences.entry(resolution.cassette.clone()).or_default() += 1;
                self.pm_cassettes
                    .entry(resolution.local_code.clone())
                    .or_default()
                    .insert(resolution.cassette.clone());
            }
            Outcome::Rejected { cassette, rejection } => {
                *self.occurrences.entry(cassette.clone()).or_default() += 1;
                self.reasons
                    .entry(cassette.clone())
                    .or_default()
                    .insert(rejection.to_string());
            }
            Outcome::Skipped => {}
        }
    }

    /// Distinct eligible cassettes that appeared in at least one position.
    pub fn cassettes_seen(&self) -> u64 {
        self.occurrences.len() as u64
    }

    /// Distinct PMs reached by at least one resolution.
    pub fn distinct_pms(&self) -> u64 {
        self.pm_cassettes.len() as u64
    }

    /// Write the free-text anomaly report.
    pub fn write_report(
        &self,
        out: &mut impl Write,
        stats: &RunStats,
        eligible_cassettes: u64,
    ) -> io::Result<()> {
        writeln!(out, "=== FTTE CASSETTE DIAGNOSTICS ===")?;
        writeln!(out)?;

        writeln!(out, "PMs WITH MULTIPLE CASSETTES:")?;
        for (pm, cassettes) in &self.pm_cassettes {
            if cassettes.len() > 1 {
                let list = cassettes.iter().cloned().collect::<Vec<_>>().join(", ");
                writeln!(out, "PM {}: {} cassettes - {}", pm, cassettes.len(), list)?;
            }
        }

        writeln!(out)?;
        writeln!(out)?;
        writeln!(out, "REJECTED CASSETTES AND REASONS:")?;
        for (cassette, reasons) in &self.reasons {
            if reasons.is_empty() {
                continue;
            }
            let seen = self.occurrences.get(cassette).copied().unwrap_or(0);
            writeln!(out)?;
            writeln!(out, "Cassette {cassette} (seen {seen} times):")?;
            for reason in reasons {
                writeln!(out, "  - {reason}")?;
            }
        }

        writeln!(out)?;
        writeln!(out)?;
        writeln!(out, "STATISTICS:")?;
        writeln!(out, "Total positions processed: {}", stats.positions_seen)?;
        writeln!(out, "Total FTTE cassettes: {eligible_cassettes}")?;
        writeln!(out, "Cassettes with positions: {}", self.cassettes_seen())?;
        writeln!(out, "Distinct PMs found: {}", self.distinct_pms())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::{Rejection, Resolution};

    fn resolved(cassette: &str, pm: &str) -> Outcome {
        Outcome::Resolved(Resolution {
            cassette: cassette.to_string(),
            transport_fiber: "F1".to_string(),
            transport_cable_label: "TR-1".to_string(),
            distribution_fiber: "F2".to_string(),
            distribution_cable_label: "DI-1".to_string(),
            pe_node: "PE01".to_string(),
            site: "S1".to_string(),
            local_code: pm.to_string(),
            local_label: format!("Local {pm}"),
        })
    }

    fn rejected(cassette: &str, site: &str) -> Outcome {
        Outcome::Rejected {
            cassette: cassette.to_string(),
            rejection: Rejection::LocalNotFound {
                site: site.to_string(),
            },
        }
    }

    #[test]
    fn duplicate_reasons_are_collapsed() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.record(&rejected("C1", "S1"));
        diagnostics.record(&rejected("C1", "S1"));
        diagnostics.record(&rejected("C1", "S2"));
        assert_eq!(diagnostics.occurrences.get("C1"), Some(&3));
        assert_eq!(diagnostics.reasons.get("C1").map(BTreeSet::len), Some(2));
    }

    #[test]
    fn report_flags_pm_with_multiple_cassettes() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.record(&resolved("C1", "PM1"));
        diagnostics.record(&resolved("C2", "PM1"));
        diagnostics.record(&resolved("C3", "PM2"));
        diagnostics.record(&rejected("C4", "S9"));
        diagnostics.record(&Outcome::Skipped);

        let mut stats = RunStats::default();
        for _ in 0..5 {
            stats.record(&Outcome::Skipped);
        }

        let mut report = Vec::new();
        diagnostics.write_report(&mut report, &stats, 10).unwrap();
        let report = String::from_utf8(report).unwrap();

        assert!(report.contains("PM PM1: 2 cassettes - C1, C2"));
        assert!(!report.contains("PM PM2"));
        assert!(report.contains("Cassette C4 (seen 1 times):"));
        assert!(report.contains("  - local (SRO) not found for site S9"));
        assert!(report.contains("Total positions processed: 5"));
        assert!(report.contains("Total FTTE cassettes: 10"));
        assert!(report.contains("Cassettes with positions: 4"));
        assert!(report.contains("Distinct PMs found: 2"));
    }
}
