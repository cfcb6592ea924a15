//! Conversational assistant over a scan result.
//!
//! The completion backend is a black box behind `CompletionService`; this
//! module only decides *what* is sent:
//!   * a system prompt which, when a `ScanResult` is supplied, lists every
//!     field of it (IP, ports, vulns, CPEs, hostnames, tags, risk level)
//!   * the most recent `MAX_HISTORY` conversation messages
//!
//! `ChatCompletionsClient` is an OpenAI-compatible HTTP implementation
//! (OpenRouter by default).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::config::AssistantConfig;
use crate::errors::{Result, ScanError, truncate_diagnostic};
use crate::report::ScanResult;

/// Messages forwarded to the completion service.
pub const MAX_HISTORY: usize = 6;

const PERSONA: &str = "You are a cybersecurity assistant specializing in vulnerability analysis \
and network security. You help users understand host scan results, explain vulnerabilities, \
and give actionable security recommendations.";

const GUIDELINES: &str = "Guidelines:
- Provide clear, actionable security recommendations
- Explain technical terms in an accessible way
- Focus on practical risk mitigation
- Be concise but thorough
- Always prioritize security best practices";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Capability: produce a reply for a system prompt and a message history.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, system_prompt: &str, history: &[ChatMessage]) -> Result<String>;
}

/// Keep only the most recent `MAX_HISTORY` messages.
pub fn recent_history(messages: &[ChatMessage]) -> &[ChatMessage] {
    let start = messages.len().saturating_sub(MAX_HISTORY);
    &messages[start..]
}

fn join_or<T: ToString>(items: &[T], placeholder: &str) -> String {
    if items.is_empty() {
        placeholder.to_string()
    } else {
        items
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Render the system instructions, embedding the scan when present.
pub fn render_system_prompt(context: Option<&ScanResult>) -> String {
    let mut prompt = String::from(PERSONA);
    prompt.push_str("\n\n");

    if let Some(scan) = context {
        prompt.push_str("Current scan data for analysis:\n");
        prompt.push_str(&format!("IP: {}\n", scan.ip()));
        prompt.push_str(&format!("Open Ports: {}\n", join_or(scan.ports(), "None")));
        prompt.push_str(&format!(
            "Vulnerabilities: {}\n",
            join_or(scan.vulns(), "None detected")
        ));
        prompt.push_str(&format!("CPEs: {}\n", join_or(scan.cpes(), "None")));
        prompt.push_str(&format!("Hostnames: {}\n", join_or(scan.hostnames(), "None")));
        prompt.push_str(&format!("Tags: {}\n", join_or(scan.tags(), "None")));
        prompt.push_str(&format!("Risk Level: {}\n\n", scan.risk_level()));
        prompt.push_str("Use this data to provide specific, actionable security advice.\n\n");
    }

    prompt.push_str(GUIDELINES);
    prompt
}

/// Ask the assistant about a scan, forwarding only the recent history.
pub async fn ask_about_scan(
    service: &dyn CompletionService,
    messages: &[ChatMessage],
    context: Option<&ScanResult>,
) -> Result<String> {
    let system_prompt = render_system_prompt(context);
    let history = recent_history(messages);
    tracing::debug!(
        history = history.len(),
        with_context = context.is_some(),
        "asking assistant"
    );
    service.complete(&system_prompt, history).await
}

/* -------------------------------------------------------------------------- */
/*                     OpenAI-compatible chat completions                     */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionsClient {
    http: Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl ChatCompletionsClient {
    /// Build from configuration; fails when no API key is configured.
    pub fn from_config(config: &AssistantConfig, user_agent: &str) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let http = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ScanError::configuration(format!("HTTP client setup failed: {e}")))?;
        Ok(Self {
            http,
            api_base: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout,
        })
    }

    async fn call_api(&self, system_prompt: &str, history: &[ChatMessage]) -> Result<String> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(WireMessage {
            role: "system",
            content: system_prompt,
        });
        for m in history {
            messages.push(WireMessage {
                role: match m.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: &m.text,
            });
        }

        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ScanError::assistant(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ScanError::assistant(format!("response unreadable: {e}")))?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), body = %truncate_diagnostic(&body), "assistant error");
            return Err(ScanError::assistant(format!(
                "service returned HTTP {}",
                status.as_u16()
            )));
        }

        let parsed: CompletionResponse = serde_json::from_str(&body)
            .map_err(|e| ScanError::assistant(format!("malformed response: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ScanError::assistant("response contained no choices"))?;

        choice
            .message
            .content
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ScanError::assistant("service returned an empty reply"))
    }
}

#[async_trait]
impl CompletionService for ChatCompletionsClient {
    async fn complete(&self, system_prompt: &str, history: &[ChatMessage]) -> Result<String> {
        timeout(self.timeout, self.call_api(system_prompt, history))
            .await
            .map_err(|_| {
                ScanError::assistant(format!(
                    "timed out after {}s",
                    self.timeout.as_secs_f32()
                ))
            })?
    }
}
