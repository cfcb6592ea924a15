//! Target resolution.
//!
//! `resolve()` turns a classified `ScanTarget` into a `ResolvedHost`. IPv4
//! literals pass straight through without touching the resolver; domains go
//! through exactly one `HostResolver::lookup_a` call.
//!
//! Two backends are provided:
//!   * `DohResolver`: JSON DNS-over-HTTPS (`GET <url>?name=<domain>&type=A`)
//!   * `SystemResolver`: the host's configured nameservers via trust-dns
//!
//! Both take the first A record of the answer and never retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::time::timeout;
use trust_dns_resolver::{
    TokioAsyncResolver,
    config::{ResolverConfig, ResolverOpts},
};

use crate::errors::{Result, ScanError};
use crate::target::{ResolvedHost, ScanTarget, TargetKind};

/// DNS RR type code for A records.
const RR_TYPE_A: u16 = 1;

/// Capability: map a domain name to one IPv4 address.
#[async_trait]
pub trait HostResolver: Send + Sync {
    fn name(&self) -> &'static str;
    async fn lookup_a(&self, domain: &str) -> Result<ResolvedHost>;
}

/// Resolve a classified target. IPv4 literals are returned unchanged.
pub async fn resolve(target: &ScanTarget, resolver: &dyn HostResolver) -> Result<ResolvedHost> {
    match target.kind() {
        TargetKind::Ipv4 => ResolvedHost::parse(target.value())
            .ok_or_else(|| ScanError::invalid_input(target.value())),
        TargetKind::Domain => {
            tracing::debug!(domain = target.value(), backend = resolver.name(), "resolving");
            match resolver.lookup_a(target.value()).await {
                Ok(host) => {
                    tracing::debug!(domain = target.value(), ip = %host, "resolved");
                    Ok(host)
                }
                // Report the target as the user typed it, not the normalized query name.
                Err(ScanError::ResolutionFailed { reason, .. }) => {
                    Err(ScanError::resolution_failed(target.raw().trim(), reason))
                }
                Err(other) => Err(ScanError::resolution_failed(
                    target.raw().trim(),
                    other.to_string(),
                )),
            }
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                               DNS-over-HTTPS                               */
/* -------------------------------------------------------------------------- */

/// JSON DNS API response (Google / Cloudflare shape).
#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Status", default)]
    status: u32,
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(rename = "type", default)]
    rr_type: Option<u16>,
    #[serde(default)]
    data: String,
}

/// Resolver backed by a JSON DNS-over-HTTPS endpoint.
pub struct DohResolver {
    http: Client,
    endpoint: String,
    timeout: Duration,
}

impl DohResolver {
    pub fn new(endpoint: impl Into<String>, user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ScanError::configuration(format!("HTTP client setup failed: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    async fn query(&self, domain: &str) -> std::result::Result<String, String> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("name", domain), ("type", "A")])
            .header(reqwest::header::ACCEPT, "application/dns-json")
            .send()
            .await
            .map_err(|e| format!("DNS request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("DNS provider returned HTTP {}", status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| format!("DNS response body unreadable: {e}"))
    }
}

#[async_trait]
impl HostResolver for DohResolver {
    fn name(&self) -> &'static str {
        "doh"
    }

    async fn lookup_a(&self, domain: &str) -> Result<ResolvedHost> {
        let body = match timeout(self.timeout, self.query(domain)).await {
            Ok(Ok(body)) => body,
            Ok(Err(reason)) => return Err(ScanError::resolution_failed(domain, reason)),
            Err(_) => {
                return Err(ScanError::resolution_failed(
                    domain,
                    format!("DNS lookup timed out after {}s", self.timeout.as_secs_f32()),
                ));
            }
        };
        first_a_record(domain, &body)
    }
}

/// Pick the first A record out of a DoH JSON body.
fn first_a_record(domain: &str, body: &str) -> Result<ResolvedHost> {
    let parsed: DohResponse = serde_json::from_str(body)
        .map_err(|e| ScanError::resolution_failed(domain, format!("malformed DNS response: {e}")))?;

    if parsed.status != 0 {
        return Err(ScanError::resolution_failed(
            domain,
            format!("DNS status {}", parsed.status),
        ));
    }

    // Answers may lead with CNAME hops; entries without a type are judged by their data.
    let first = parsed
        .answer
        .iter()
        .find(|a| a.rr_type.map(|t| t == RR_TYPE_A).unwrap_or(true))
        .ok_or_else(|| ScanError::resolution_failed(domain, "no answer records"))?;

    ResolvedHost::parse(&first.data).ok_or_else(|| {
        ScanError::resolution_failed(
            domain,
            format!("answer '{}' is not an IPv4 address", first.data),
        )
    })
}

/* -------------------------------------------------------------------------- */
/*                                 System DNS                                 */
/* -------------------------------------------------------------------------- */

/// Resolver using the operating system's nameserver configuration.
pub struct SystemResolver {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl SystemResolver {
    pub fn new(timeout: Duration) -> Self {
        let (config, opts) = match trust_dns_resolver::system_conf::read_system_conf() {
            Ok(conf) => conf,
            Err(_) => (ResolverConfig::default(), ResolverOpts::default()),
        };
        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            timeout,
        }
    }
}

#[async_trait]
impl HostResolver for SystemResolver {
    fn name(&self) -> &'static str {
        "system"
    }

    async fn lookup_a(&self, domain: &str) -> Result<ResolvedHost> {
        match timeout(self.timeout, self.resolver.ipv4_lookup(domain)).await {
            Ok(Ok(answer)) => answer
                .iter()
                .next()
                .map(|a| ResolvedHost::from(a.0))
                .ok_or_else(|| ScanError::resolution_failed(domain, "no answer records")),
            Ok(Err(e)) => Err(ScanError::resolution_failed(domain, e.to_string())),
            Err(_) => Err(ScanError::resolution_failed(
                domain,
                format!("DNS lookup timed out after {}s", self.timeout.as_secs_f32()),
            )),
        }
    }
}
