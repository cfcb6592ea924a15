//! hostscan library
//!
//! Turns an untrusted IP-or-domain string into a validated, resolved,
//! externally-enriched and risk-scored security record:
//!
//! - Validate and classify the input (IPv4 literal or domain)
//! - Resolve domains through DNS-over-HTTPS (or the system resolver)
//! - Fetch passive host intelligence (open ports, CPEs, hostnames, tags, CVEs)
//! - Classify exposure risk and compose a human-readable summary
//! - Ask a conversational assistant about the result
//!
//! # Example
//!
//! ```rust,no_run
//! use hostscan::{Config, Scanner};
//!
//! # async fn demo() -> hostscan::Result<()> {
//! let scanner = Scanner::from_config(&Config::from_env())?;
//! let result = scanner.run_scan("8.8.8.8").await?;
//! println!("{}", result.summary());
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod assistant;
pub mod cli;
pub mod config;
pub mod enrichment;
pub mod errors;
pub mod export;
pub mod facade;
pub mod logging;
pub mod report;
pub mod resolver;
pub mod risk;
pub mod styled_output;
pub mod target;

// Re-export commonly used types and functions for convenience
pub use assistant::{ChatMessage, CompletionService, Role, ask_about_scan};
pub use config::Config;
pub use enrichment::{EnrichmentRecord, IntelSource};
pub use errors::{ErrorCategory, Result, ScanError};
pub use facade::Scanner;
pub use report::{ScanResult, compose};
pub use resolver::HostResolver;
pub use risk::{RiskLevel, classify_risk};
pub use target::{ResolvedHost, ScanTarget, TargetKind, classify};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
