//! Configuration management for hostscan.
//!
//! This module provides structured configuration options that can be loaded
//! from environment variables and refined by command-line arguments. It
//! centralizes timeouts, collaborator endpoints and assistant settings.

use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure for hostscan.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Network operation settings
    pub network: NetworkConfig,

    /// External collaborator endpoints
    pub endpoints: EndpointConfig,

    /// Conversational assistant settings
    pub assistant: AssistantConfig,
}

/// Network-related configuration options
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Timeout for the DNS-over-HTTPS (or system DNS) lookup
    pub dns_timeout: Duration,

    /// Timeout for the whole enrichment fetch (send + body)
    pub enrichment_timeout: Duration,

    /// User-Agent sent to every collaborator
    pub user_agent: String,
}

/// Which backend resolves domain targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolverBackend {
    /// JSON DNS-over-HTTPS API
    #[default]
    Doh,
    /// Host's configured nameservers
    System,
}

impl FromStr for ResolverBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "doh" | "https" => Ok(Self::Doh),
            "system" | "os" => Ok(Self::System),
            other => Err(ConfigError::InvalidValue {
                field: "endpoints.resolver".to_string(),
                value: other.to_string(),
                reason: "expected 'doh' or 'system'".to_string(),
            }),
        }
    }
}

/// Collaborator endpoints
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// DNS-over-HTTPS JSON endpoint (queried with `?name=..&type=A`)
    pub dns_url: String,

    /// Host intelligence base URL (queried as `<base>/<ip>`)
    pub intel_url: String,

    pub resolver: ResolverBackend,
}

/// Assistant (chat completion) configuration
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// OpenAI-compatible API base URL
    pub base_url: String,

    pub model: String,

    /// Bearer key; the assistant is unavailable without one
    pub api_key: Option<String>,

    pub temperature: f32,

    pub max_tokens: u32,

    pub timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            dns_timeout: Duration::from_secs(5),
            enrichment_timeout: Duration::from_secs(10),
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            dns_url: "https://dns.google/resolve".to_string(),
            intel_url: "https://internetdb.shodan.io".to_string(),
            resolver: ResolverBackend::Doh,
        }
    }
}

impl AssistantConfig {
    /// The configured API key, or `MissingRequired` naming where it is read from.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingRequired {
                field: "assistant.api_key (HOSTSCAN_ASSISTANT_API_KEY or OPENROUTER_API_KEY)"
                    .to_string(),
            })
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "deepseek/deepseek-r1-0528:free".to_string(),
            api_key: None,
            temperature: 0.7,
            max_tokens: 1000,
            timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup (env-shaped keys).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secs) = lookup("HOSTSCAN_DNS_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok())
        {
            config.network.dns_timeout = Duration::from_secs(secs);
        }

        if let Some(secs) =
            lookup("HOSTSCAN_ENRICHMENT_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok())
        {
            config.network.enrichment_timeout = Duration::from_secs(secs);
        }

        if let Some(ua) = lookup("HOSTSCAN_USER_AGENT") {
            config.network.user_agent = ua;
        }

        // Endpoints
        if let Some(url) = lookup("HOSTSCAN_DNS_URL") {
            config.endpoints.dns_url = url;
        }

        if let Some(url) = lookup("HOSTSCAN_INTEL_URL") {
            config.endpoints.intel_url = url;
        }

        if let Some(backend) = lookup("HOSTSCAN_RESOLVER").and_then(|v| v.parse().ok()) {
            config.endpoints.resolver = backend;
        }

        // Assistant
        if let Some(url) = lookup("HOSTSCAN_ASSISTANT_URL") {
            config.assistant.base_url = url;
        }

        if let Some(model) = lookup("HOSTSCAN_ASSISTANT_MODEL") {
            config.assistant.model = model;
        }

        config.assistant.api_key = lookup("HOSTSCAN_ASSISTANT_API_KEY")
            .or_else(|| lookup("OPENROUTER_API_KEY"))
            .filter(|k| !k.trim().is_empty());

        config
    }

    /// Merge with CLI arguments, giving CLI precedence
    pub fn merge_with_cli(&mut self, cli: &crate::cli::Cli) {
        if let Some(secs) = cli.timeout {
            self.network.enrichment_timeout = Duration::from_secs(secs);
        }

        if let Some(backend) = cli.resolver {
            self.endpoints.resolver = backend.into();
        }

        if let Some(ref url) = cli.intel_url {
            self.endpoints.intel_url = url.clone();
        }

        if let Some(ref url) = cli.dns_url {
            self.endpoints.dns_url = url.clone();
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.dns_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "network.dns_timeout".to_string(),
                value: "0".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }

        if self.network.enrichment_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "network.enrichment_timeout".to_string(),
                value: "0".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }

        for (field, url) in [
            ("endpoints.dns_url", &self.endpoints.dns_url),
            ("endpoints.intel_url", &self.endpoints.intel_url),
            ("assistant.base_url", &self.assistant.base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: url.clone(),
                    reason: "URL must start with http:// or https://".to_string(),
                });
            }
        }

        if !(0.0..=2.0).contains(&self.assistant.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "assistant.temperature".to_string(),
                value: self.assistant.temperature.to_string(),
                reason: "Temperature must be between 0 and 2".to_string(),
            });
        }

        if self.assistant.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "assistant.max_tokens".to_string(),
                value: "0".to_string(),
                reason: "Max tokens must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
    /// Invalid configuration value
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Missing required configuration
    MissingRequired { field: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue {
                field,
                value,
                reason,
            } => {
                write!(f, "Invalid value '{}' for '{}': {}", value, field, reason)
            }
            ConfigError::MissingRequired { field } => {
                write!(f, "Missing required configuration field: {}", field)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::errors::ScanError {
    fn from(e: ConfigError) -> Self {
        crate::errors::ScanError::configuration(e.to_string())
    }
}
