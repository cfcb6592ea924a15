//! CLI-facing application orchestration.
//!
//! `App::run` plays the presentation layer around the scan pipeline:
//!   1. Schema generation early-exit
//!   2. Config load / validation
//!   3. Scan via the `Scanner` façade
//!   4. Rendering (styled / plain / JSON / YAML)
//!   5. Optional export file
//!   6. Optional assistant question about the result
//!
//! Failures are reported on stderr with the error's own message; the
//! returned value is the intended process exit code.

use crate::assistant::{ChatCompletionsClient, ChatMessage, ask_about_scan};
use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::errors::{Result, ScanError};
use crate::export::{self, ExportFormat};
use crate::facade::Scanner;
use crate::report::ScanResult;
use crate::styled_output::StyledFormatter;

/// Application façade.
pub struct App;

impl App {
    /// Execute the end-to-end scan workflow.
    ///
    /// Returns: intended process exit code (0 = success, 1 = scan/user error).
    pub async fn run(cli: &Cli) -> Result<i32> {
        if cli.generate_schema {
            return Self::print_schema();
        }

        let Some(raw_target) = cli.target.as_deref() else {
            eprintln!("Error: a target IP address or domain is required.");
            return Ok(1);
        };

        let mut config = Config::from_env();
        config.merge_with_cli(cli);
        if let Err(e) = config.validate() {
            eprintln!("Configuration error: {e}");
            return Ok(1);
        }

        let scanner = Scanner::from_config(&config)?;
        let result = match scanner.run_scan(raw_target).await {
            Ok(result) => result,
            Err(e) => return Ok(Self::report_failure(&e)),
        };

        Self::render(cli, &result)?;

        if let Some(ref path) = cli.output {
            match export::write_export(path, &result, None) {
                Ok(format) => {
                    tracing::info!(path = %path.display(), mime = format.mime_type(), "report exported");
                    if !cli.is_structured_output() {
                        eprintln!("Saved {} report to {}", describe(format), path.display());
                    }
                }
                Err(e) => return Ok(Self::report_failure(&e)),
            }
        }

        if let Some(ref question) = cli.ask {
            return Self::ask(&config, question, &result).await;
        }

        Ok(0)
    }

    fn print_schema() -> Result<i32> {
        match export::generate_json_schema() {
            Ok(schema) => {
                println!("{schema}");
                Ok(0)
            }
            Err(e) => {
                eprintln!("Error generating JSON schema: {e}");
                Ok(1)
            }
        }
    }

    fn report_failure(e: &ScanError) -> i32 {
        tracing::debug!(category = %e.category(), status = e.http_status(), "scan failed");
        eprintln!("Error: {e}");
        if e.is_retryable() {
            eprintln!("This may be temporary; re-run the scan in a moment.");
        }
        1
    }

    fn render(cli: &Cli, result: &ScanResult) -> Result<()> {
        let rendered = match cli.format {
            OutputFormat::Json => export::render(result, ExportFormat::Json),
            OutputFormat::Yaml => export::render(result, ExportFormat::Yaml),
            OutputFormat::Text if cli.should_use_styling() => {
                let formatter = if cli.no_color {
                    StyledFormatter::without_colors()
                } else {
                    StyledFormatter::new()
                };
                if formatter.print_scan(result).is_ok() {
                    return Ok(());
                }
                // Fall back to the plain summary
                Ok(export::to_text(result))
            }
            OutputFormat::Text => Ok(export::to_text(result)),
        };

        match rendered {
            Ok(text) => {
                println!("{text}");
                Ok(())
            }
            Err(e) => Err(ScanError::Io {
                path: "<stdout>".to_string(),
                operation: "render".to_string(),
                source: std::io::Error::other(e.to_string()),
            }),
        }
    }

    async fn ask(config: &Config, question: &str, result: &ScanResult) -> Result<i32> {
        let client =
            match ChatCompletionsClient::from_config(&config.assistant, &config.network.user_agent)
            {
                Ok(c) => c,
                Err(e) => return Ok(Self::report_failure(&e)),
            };

        let messages = [ChatMessage::user(question)];
        match ask_about_scan(&client, &messages, Some(result)).await {
            Ok(answer) => {
                println!();
                println!("{answer}");
                Ok(0)
            }
            Err(e) => Ok(Self::report_failure(&e)),
        }
    }
}

fn describe(format: ExportFormat) -> &'static str {
    match format {
        ExportFormat::Json => "JSON",
        ExportFormat::Yaml => "YAML",
        ExportFormat::Text => "text",
    }
}
