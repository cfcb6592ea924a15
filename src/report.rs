//! Report composition.
//!
//! Merges the resolved IP, the enrichment lists and the risk level into one
//! immutable `ScanResult` and renders its line-oriented summary:
//!
//! ```text
//! 📍 IP Address: <ip>                      always
//! 🌍 Hostnames: ...                        if any
//! 📡 Open Ports: ...                       if any (full list)
//! 🔐 Vulnerabilities (CVEs): ...           always (count + first 3, or "none")
//! 🧩 CPE: ...                              if any (first 2)
//! 🏷️ Tags: ...                             if any
//! ⚠️ Risk Level: <level>                   always, last
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enrichment::EnrichmentRecord;
use crate::risk::RiskLevel;
use crate::target::ResolvedHost;

/// Vulnerability identifiers shown inline before the "+N more" suffix.
const VULNS_SHOWN: usize = 3;
/// CPE entries shown in the summary.
const CPES_SHOWN: usize = 2;

/// Terminal output of one scan. There is no mutating API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    ip: String,
    ports: Vec<u16>,
    cpes: Vec<String>,
    hostnames: Vec<String>,
    tags: Vec<String>,
    vulns: Vec<String>,
    summary: String,
    risk_level: RiskLevel,
}

impl ScanResult {
    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    pub fn cpes(&self) -> &[String] {
        &self.cpes
    }

    pub fn hostnames(&self) -> &[String] {
        &self.hostnames
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn vulns(&self) -> &[String] {
        &self.vulns
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }
}

/// Build the final record. Consumes the enrichment record.
pub fn compose(ip: &ResolvedHost, record: EnrichmentRecord, risk_level: RiskLevel) -> ScanResult {
    let summary = render_summary(ip.as_str(), &record, risk_level);
    let EnrichmentRecord {
        ports,
        cpes,
        hostnames,
        tags,
        vulns,
        ..
    } = record;

    ScanResult {
        ip: ip.to_string(),
        ports,
        cpes,
        hostnames,
        tags,
        vulns,
        summary,
        risk_level,
    }
}

fn render_summary(ip: &str, record: &EnrichmentRecord, risk_level: RiskLevel) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(7);

    parts.push(format!("📍 IP Address: {ip}"));

    if !record.hostnames.is_empty() {
        parts.push(format!("🌍 Hostnames: {}", record.hostnames.join(", ")));
    }

    if !record.ports.is_empty() {
        let ports: Vec<String> = record.ports.iter().map(|p| p.to_string()).collect();
        parts.push(format!("📡 Open Ports: {}", ports.join(", ")));
    }

    parts.push(vulnerability_line(&record.vulns));

    if !record.cpes.is_empty() {
        let shown: Vec<&str> = record
            .cpes
            .iter()
            .take(CPES_SHOWN)
            .map(String::as_str)
            .collect();
        parts.push(format!("🧩 CPE: {}", shown.join(", ")));
    }

    if !record.tags.is_empty() {
        parts.push(format!("🏷️ Tags: {}", record.tags.join(", ")));
    }

    parts.push(format!("⚠️ Risk Level: {risk_level}"));

    parts.join("\n")
}

fn vulnerability_line(vulns: &[String]) -> String {
    if vulns.is_empty() {
        return "🔐 Vulnerabilities (CVEs): No known security flaws detected".to_string();
    }
    let shown: Vec<&str> = vulns.iter().take(VULNS_SHOWN).map(String::as_str).collect();
    let more = if vulns.len() > VULNS_SHOWN {
        format!(" (+{} more)", vulns.len() - VULNS_SHOWN)
    } else {
        String::new()
    };
    format!(
        "🔐 Vulnerabilities (CVEs): {} security flaws found - {}{}",
        vulns.len(),
        shown.join(", "),
        more
    )
}
