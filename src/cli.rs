use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::ResolverBackend;

/// Command-line interface definition.
///
/// Verbosity levels:
/// 0 - errors only
/// 1 - warnings (default)
/// 2 - info
/// 3 - debug (pipeline stages, status codes)
/// 4+ - trace
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Resolve an IP or domain, fetch passive host intelligence and rate its exposure risk"
)]
pub struct Cli {
    /// Target IPv4 address or domain (e.g. 8.8.8.8 or example.com)
    #[arg(required_unless_present = "generate_schema")]
    pub target: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print the plain summary instead of the styled report
    #[arg(long)]
    pub plain: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Verbosity level (0-4)
    #[arg(long, default_value_t = 1)]
    pub verbose: u8,

    /// Also write the result to FILE (.json, .yaml/.yml, anything else is plain text)
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Ask the assistant a question about the scan result
    #[arg(long, value_name = "QUESTION")]
    pub ask: Option<String>,

    /// Backend used to resolve domain targets
    #[arg(long, value_enum)]
    pub resolver: Option<ResolverArg>,

    /// Enrichment timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Override the host intelligence base URL
    #[arg(long, value_name = "URL", hide = true)]
    pub intel_url: Option<String>,

    /// Override the DNS-over-HTTPS endpoint
    #[arg(long, value_name = "URL", hide = true)]
    pub dns_url: Option<String>,

    /// Print the JSON schema of the result document and exit
    #[arg(long)]
    pub generate_schema: bool,
}

/// Rendering of the scan result on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResolverArg {
    Doh,
    System,
}

impl From<ResolverArg> for ResolverBackend {
    fn from(arg: ResolverArg) -> Self {
        match arg {
            ResolverArg::Doh => ResolverBackend::Doh,
            ResolverArg::System => ResolverBackend::System,
        }
    }
}

impl Cli {
    /// Parse CLI arguments from process args.
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Default tracing filter directive for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "hostscan=debug,warn",
            _ => "hostscan=trace,info",
        }
    }

    pub fn is_structured_output(&self) -> bool {
        matches!(self.format, OutputFormat::Json | OutputFormat::Yaml)
    }

    /// Styled output only for interactive text mode.
    pub fn should_use_styling(&self) -> bool {
        !self.plain && !self.is_structured_output()
    }
}
