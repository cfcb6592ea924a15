//! Host intelligence enrichment.
//!
//! `InternetDbClient` fetches `GET <base>/<ip>` from an InternetDB-style
//! service and normalizes the answer into an `EnrichmentRecord` whose list
//! fields are always present.
//!
//! Status policy:
//!   * 2xx  -> parse body (text first, then JSON)
//!   * 404  -> empty record, not an error
//!   * else -> `UpstreamError` with the status code
//!
//! Transport failures and timeout expiry map to `UpstreamUnavailable`.
//! The timeout covers both the request and the body read; on expiry the
//! request future is dropped, which aborts the connection.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::time::timeout;

use crate::errors::{Result, ScanError};
use crate::target::ResolvedHost;

/// Raw intelligence about one host. Absent or `null` fields deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ip: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ports: Vec<u16>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cpes: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hostnames: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vulns: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl EnrichmentRecord {
    /// Record for a host the source knows nothing about.
    pub fn empty(ip: &ResolvedHost) -> Self {
        Self {
            ip: ip.to_string(),
            ..Default::default()
        }
    }

    /// Parse a response body; fills in `ip` when the body omits it.
    pub fn from_json(ip: &ResolvedHost, body: &str) -> Result<Self> {
        let mut record: EnrichmentRecord = serde_json::from_str(body)
            .map_err(|e| ScanError::malformed(ip.as_str(), e.to_string()))?;
        if record.ip.trim().is_empty() {
            record.ip = ip.to_string();
        }
        Ok(record)
    }
}

/// Capability: fetch intelligence for one resolved IP.
#[async_trait]
pub trait IntelSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_intel(&self, ip: &ResolvedHost) -> Result<EnrichmentRecord>;
}

/// Run one enrichment call against `source`.
pub async fn enrich(ip: &ResolvedHost, source: &dyn IntelSource) -> Result<EnrichmentRecord> {
    tracing::debug!(%ip, source = source.name(), "enriching");
    let record = source.fetch_intel(ip).await?;
    tracing::debug!(
        %ip,
        ports = record.ports.len(),
        vulns = record.vulns.len(),
        "enrichment complete"
    );
    Ok(record)
}

/// HTTP client for InternetDB-style host intelligence.
pub struct InternetDbClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

/// Outcome of the raw HTTP exchange, before body parsing.
enum Fetched {
    NotFound,
    Body(String),
}

impl InternetDbClient {
    pub fn new(base_url: impl Into<String>, user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ScanError::configuration(format!("HTTP client setup failed: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn url_for(&self, ip: &ResolvedHost) -> String {
        format!("{}/{}", self.base_url, ip)
    }

    async fn fetch(&self, ip: &ResolvedHost) -> Result<Fetched> {
        let response = self
            .http
            .get(self.url_for(ip))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ScanError::upstream_unavailable(ip.as_str(), describe_transport(&e)))?;

        let status = response.status();
        tracing::trace!(%ip, status = status.as_u16(), "intelligence response");

        if status == StatusCode::NOT_FOUND {
            return Ok(Fetched::NotFound);
        }

        if !status.is_success() {
            // The status is the error; an unreadable body only loses the detail.
            let body = response.text().await.unwrap_or_default();
            return Err(ScanError::upstream_error(ip.as_str(), status.as_u16(), &body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ScanError::upstream_unavailable(ip.as_str(), describe_transport(&e)))?;
        Ok(Fetched::Body(body))
    }
}

#[async_trait]
impl IntelSource for InternetDbClient {
    fn name(&self) -> &'static str {
        "internetdb"
    }

    async fn fetch_intel(&self, ip: &ResolvedHost) -> Result<EnrichmentRecord> {
        let fetched = timeout(self.timeout, self.fetch(ip)).await.map_err(|_| {
            ScanError::upstream_unavailable(
                ip.as_str(),
                format!("request timed out after {}s", self.timeout.as_secs_f32()),
            )
        })??;

        match fetched {
            Fetched::NotFound => Ok(EnrichmentRecord::empty(ip)),
            Fetched::Body(body) => EnrichmentRecord::from_json(ip, &body),
        }
    }
}

/// Short, user-safe description of a transport error.
fn describe_transport(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        "connection failed".to_string()
    } else if e.is_body() || e.is_decode() {
        "response body could not be read".to_string()
    } else {
        "network error".to_string()
    }
}
