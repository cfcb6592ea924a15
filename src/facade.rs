use std::sync::Arc;

use crate::config::{Config, ResolverBackend};
use crate::enrichment::{InternetDbClient, IntelSource, enrich};
use crate::errors::Result;
use crate::report::{ScanResult, compose};
use crate::resolver::{DohResolver, HostResolver, SystemResolver, resolve};
use crate::risk::classify_risk;
use crate::target::classify;

/// High-level façade providing the library entry point.
///
/// A `Scanner` owns only its two collaborators and no per-scan state, so one
/// instance can serve any number of concurrent scans. Each scan runs its
/// stages strictly in order:
///
/// 1. classify the raw input (no network)
/// 2. resolve to an IPv4 address (skipped for literals)
/// 3. fetch host intelligence
/// 4. classify risk and compose the final record
///
/// The first failing stage aborts the scan; nothing is retried.
#[derive(Clone)]
pub struct Scanner {
    resolver: Arc<dyn HostResolver>,
    intel: Arc<dyn IntelSource>,
}

impl Scanner {
    /// Build a scanner from explicit collaborators (used by tests and embedders).
    pub fn new(resolver: Arc<dyn HostResolver>, intel: Arc<dyn IntelSource>) -> Self {
        Self { resolver, intel }
    }

    /// Build a scanner wired to the HTTP collaborators named in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let resolver: Arc<dyn HostResolver> = match config.endpoints.resolver {
            ResolverBackend::Doh => Arc::new(DohResolver::new(
                config.endpoints.dns_url.clone(),
                &config.network.user_agent,
                config.network.dns_timeout,
            )?),
            ResolverBackend::System => Arc::new(SystemResolver::new(config.network.dns_timeout)),
        };

        let intel = Arc::new(InternetDbClient::new(
            config.endpoints.intel_url.clone(),
            &config.network.user_agent,
            config.network.enrichment_timeout,
        )?);

        Ok(Self::new(resolver, intel))
    }

    /// Run the full pipeline for one user-supplied target.
    pub async fn run_scan(&self, raw_target: &str) -> Result<ScanResult> {
        let target = classify(raw_target)?;
        let host = resolve(&target, self.resolver.as_ref()).await?;
        let record = enrich(&host, self.intel.as_ref()).await?;
        let risk_level = classify_risk(&record);
        tracing::debug!(input = %target, ip = %host, risk = %risk_level, "scan complete");
        Ok(compose(&host, record, risk_level))
    }
}
