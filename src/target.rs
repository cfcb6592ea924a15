/*!
Target validation.

Turns an untrusted user string into a classified `ScanTarget`:
- IPv4 dotted-quad literals (checked first, take precedence)
- domain-like names (RFC 1123 labels)

Anything else is rejected with `ScanError::InvalidInput` before any network
call happens. `ResolvedHost` is the validated IPv4 form produced by the
resolver stage.
*/

use std::fmt;
use std::net::Ipv4Addr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ScanError};

/// Maximum length of a full domain name (without trailing dot).
const MAX_DOMAIN_LEN: usize = 253;

static IPV4_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$",
    )
    .unwrap()
});

static LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").unwrap());

/// Classification of a user-supplied target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    Ipv4,
    Domain,
}

/// Validated user input. Invalid strings never become a `ScanTarget`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    raw: String,
    value: String,
    kind: TargetKind,
}

impl ScanTarget {
    /// The input exactly as supplied.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Trimmed, normalized value used for resolution.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub fn is_ipv4(&self) -> bool {
        self.kind == TargetKind::Ipv4
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Classify a raw string as an IPv4 literal or a domain.
pub fn classify(raw: &str) -> Result<ScanTarget> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ScanError::invalid_input(raw));
    }

    if is_ipv4_literal(trimmed) {
        return Ok(ScanTarget {
            raw: raw.to_string(),
            value: trimmed.to_string(),
            kind: TargetKind::Ipv4,
        });
    }

    let name = trimmed.strip_suffix('.').unwrap_or(trimmed);
    if is_domain_like(name) {
        return Ok(ScanTarget {
            raw: raw.to_string(),
            value: name.to_ascii_lowercase(),
            kind: TargetKind::Domain,
        });
    }

    Err(ScanError::invalid_input(trimmed))
}

/// Strict dotted-quad check: four groups, each 0-255, nothing else.
pub fn is_ipv4_literal(s: &str) -> bool {
    IPV4_RE.is_match(s)
}

/// Dot-separated labels of 1-63 alphanumerics with internal hyphens.
///
/// A name whose last label is purely numeric is rejected: it is a mistyped
/// address (e.g. `300.1.1.1`), not a resolvable domain.
pub fn is_domain_like(s: &str) -> bool {
    if s.is_empty() || s.len() > MAX_DOMAIN_LEN {
        return false;
    }
    let labels: Vec<&str> = s.split('.').collect();
    if !labels.iter().all(|l| LABEL_RE.is_match(l)) {
        return false;
    }
    labels
        .last()
        .map(|tld| !tld.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

/// A validated IPv4 address in dotted-quad text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ResolvedHost(String);

impl ResolvedHost {
    /// Validate a dotted-quad string.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        is_ipv4_literal(s).then(|| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Ipv4Addr> for ResolvedHost {
    fn from(ip: Ipv4Addr) -> Self {
        Self(ip.to_string())
    }
}

impl fmt::Display for ResolvedHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_literals() {
        for ip in ["8.8.8.8", "0.0.0.0", "255.255.255.255", "192.168.1.10"] {
            let t = classify(ip).unwrap();
            assert_eq!(t.kind(), TargetKind::Ipv4, "{ip}");
            assert_eq!(t.value(), ip);
        }
    }

    #[test]
    fn whitespace_is_trimmed() {
        let t = classify("  1.1.1.1\n").unwrap();
        assert!(t.is_ipv4());
        assert_eq!(t.value(), "1.1.1.1");
        assert_eq!(t.raw(), "  1.1.1.1\n");
    }

    #[test]
    fn domains() {
        let t = classify("Example.COM").unwrap();
        assert_eq!(t.kind(), TargetKind::Domain);
        assert_eq!(t.value(), "example.com");

        assert_eq!(classify("localhost").unwrap().kind(), TargetKind::Domain);
        assert_eq!(classify("a-b.c-d.io").unwrap().kind(), TargetKind::Domain);
        assert_eq!(classify("www.example.org.").unwrap().value(), "www.example.org");
        assert_eq!(classify("3com.net").unwrap().kind(), TargetKind::Domain);
    }

    #[test]
    fn invalid_inputs() {
        let long_label = format!("{}.com", "a".repeat(64));
        for bad in [
            "",
            "   ",
            "256.1.1.1",
            "1.2.3",
            "1.2.3.4.5",
            "-bad.com",
            "bad-.com",
            "exa mple.com",
            "a..b",
            "http://example.com",
            "example.com/path",
            "under_score.com",
            long_label.as_str(),
        ] {
            match classify(bad) {
                Err(ScanError::InvalidInput { .. }) => {}
                other => panic!("expected InvalidInput for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn invalid_message_names_input() {
        let e = classify("not a host!").unwrap_err();
        assert!(e.to_string().contains("not a host!"));
    }

    #[test]
    fn resolved_host_validation() {
        assert!(ResolvedHost::parse("93.184.216.34").is_some());
        assert!(ResolvedHost::parse("example.com").is_none());
        assert!(ResolvedHost::parse("1.2.3.256").is_none());
        let h = ResolvedHost::from(Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(h.as_str(), "10.0.0.1");
    }
}
