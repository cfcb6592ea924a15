//! Risk classification.
//!
//! An OR-of-thresholds cascade over the vulnerability and open-port counts.
//! Tiers are evaluated from the top; the first whose inclusive lower bound is
//! reached wins, so a large port count alone can push a host to Critical.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enrichment::EnrichmentRecord;

/// (level, min vulns, min ports), highest tier first.
const TIERS: [(RiskLevel, usize, usize); 3] = [
    (RiskLevel::Critical, 10, 20),
    (RiskLevel::High, 5, 10),
    (RiskLevel::Medium, 1, 5),
];

/// Ordinal exposure level. Declaration order defines `Ord`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_counts(vuln_count: usize, port_count: usize) -> Self {
        TIERS
            .iter()
            .find(|(_, min_vulns, min_ports)| vuln_count >= *min_vulns || port_count >= *min_ports)
            .map(|(level, _, _)| *level)
            .unwrap_or(RiskLevel::Low)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a record by its vulnerability and port counts.
pub fn classify_risk(record: &EnrichmentRecord) -> RiskLevel {
    RiskLevel::from_counts(record.vulns.len(), record.ports.len())
}
