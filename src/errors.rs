//! Unified error handling for the scan pipeline.
//!
//! Every stage returns a typed `ScanError` with a stable kind and a
//! user-presentable message. A coarse `ErrorCategory` lets callers group
//! failures for reporting, and `http_status()` gives API-boundary callers a
//! ready mapping to response codes.
//!
//! Messages never contain raw upstream bodies. `UpstreamError` keeps a
//! truncated diagnostic in a separate field which is not part of `Display`.

use std::io;

use thiserror::Error;

/// Maximum number of characters of an upstream body kept for diagnostics.
pub const MAX_DIAGNOSTIC_CHARS: usize = 200;

/// High-level classification for structured reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Network,
    Upstream,
    Parse,
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCategory::Input => "input",
            ErrorCategory::Network => "network",
            ErrorCategory::Upstream => "upstream",
            ErrorCategory::Parse => "parse",
            ErrorCategory::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Primary error type of the crate.
#[derive(Error, Debug)]
pub enum ScanError {
    // ------------------------ Input / Validation ----------------------------
    #[error("Invalid IP or domain: {input:?}")]
    InvalidInput { input: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // ----------------------------- Network ----------------------------------
    #[error("Could not resolve '{target}' to an IPv4 address: {reason}")]
    ResolutionFailed { target: String, reason: String },

    #[error("Intelligence service unreachable for {ip}: {reason}. Please try again later")]
    UpstreamUnavailable { ip: String, reason: String },

    // ----------------------------- Upstream ---------------------------------
    #[error("Intelligence service returned HTTP {status} for {ip}")]
    UpstreamError {
        ip: String,
        status: u16,
        /// Truncated response body, for logs only.
        detail: String,
    },

    #[error("Assistant request failed: {reason}")]
    Assistant { reason: String },

    // ---------------------------- Parsing -----------------------------------
    #[error("Malformed response from intelligence service for {ip}: {reason}")]
    MalformedUpstreamResponse { ip: String, reason: String },

    // ----------------------------- I/O / FS ---------------------------------
    #[error("I/O error during {operation} on {path}: {source}")]
    Io {
        path: String,
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// Categorize the error for structured output.
    pub fn category(&self) -> ErrorCategory {
        use ScanError::*;
        match self {
            InvalidInput { .. } | Configuration { .. } => ErrorCategory::Input,
            ResolutionFailed { .. } | UpstreamUnavailable { .. } => ErrorCategory::Network,
            UpstreamError { .. } | Assistant { .. } => ErrorCategory::Upstream,
            MalformedUpstreamResponse { .. } => ErrorCategory::Parse,
            Io { .. } => ErrorCategory::Internal,
        }
    }

    /// Response status an HTTP boundary should use for this failure.
    pub fn http_status(&self) -> u16 {
        use ScanError::*;
        match self {
            InvalidInput { .. } => 400,
            ResolutionFailed { .. } => 422,
            UpstreamUnavailable { .. } => 503,
            UpstreamError { .. } | MalformedUpstreamResponse { .. } | Assistant { .. } => 502,
            Configuration { .. } | Io { .. } => 500,
        }
    }

    /// True when a manual re-attempt later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScanError::UpstreamUnavailable { .. } | ScanError::ResolutionFailed { .. }
        )
    }

    // ---------------------------- Constructors -----------------------------

    pub fn invalid_input(input: impl Into<String>) -> Self {
        Self::InvalidInput {
            input: input.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn resolution_failed(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ResolutionFailed {
            target: target.into(),
            reason: reason.into(),
        }
    }

    pub fn upstream_unavailable(ip: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            ip: ip.into(),
            reason: reason.into(),
        }
    }

    pub fn upstream_error(ip: impl Into<String>, status: u16, body: &str) -> Self {
        Self::UpstreamError {
            ip: ip.into(),
            status,
            detail: truncate_diagnostic(body),
        }
    }

    pub fn malformed(ip: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedUpstreamResponse {
            ip: ip.into(),
            reason: reason.into(),
        }
    }

    pub fn assistant(reason: impl Into<String>) -> Self {
        Self::Assistant {
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<String>, operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }
}

/// Public result alias.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Cut an upstream body down to a short single-line diagnostic.
pub fn truncate_diagnostic(body: &str) -> String {
    let flat: String = body
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let trimmed = flat.trim();
    if trimmed.chars().count() <= MAX_DIAGNOSTIC_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(MAX_DIAGNOSTIC_CHARS).collect();
    cut.push('…');
    cut
}

/// Extension trait for enriching IO results with path + operation context.
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<String>, operation: impl Into<String>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, io::Error> {
    fn with_path(self, path: impl Into<String>, operation: impl Into<String>) -> Result<T> {
        self.map_err(|e| ScanError::io(path.into(), operation.into(), e))
    }
}
