//! Export of scan results to documents.
//!
//! - JSON: mirrors `ScanResult` verbatim (camelCase keys)
//! - YAML: same structure
//! - Text: exactly the `summary` field
//!
//! The format for a file is inferred from its extension unless given.

use std::fs;
use std::path::Path;

use anyhow::Result;

use crate::errors::{IoResultExt, ScanError};
use crate::report::ScanResult;

/// Supported export document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Yaml,
    Text,
}

impl ExportFormat {
    /// Infer from a file extension; anything unknown is plain text.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => ExportFormat::Json,
            Some("yaml") | Some("yml") => ExportFormat::Yaml,
            _ => ExportFormat::Text,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Yaml => "application/yaml",
            ExportFormat::Text => "text/plain",
        }
    }
}

/// Serialize to pretty JSON
pub fn to_json(result: &ScanResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Serialize to YAML
pub fn to_yaml(result: &ScanResult) -> Result<String> {
    Ok(serde_yaml::to_string(result)?)
}

/// Plain-text document: the summary itself.
pub fn to_text(result: &ScanResult) -> String {
    result.summary().to_string()
}

/// Render a result in the given format.
pub fn render(result: &ScanResult, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => to_json(result),
        ExportFormat::Yaml => to_yaml(result),
        ExportFormat::Text => Ok(to_text(result)),
    }
}

/// Generate the JSON schema describing exported results.
pub fn generate_json_schema() -> Result<String> {
    let schema = schemars::schema_for!(ScanResult);
    Ok(serde_json::to_string_pretty(&schema)?)
}

/// Write a result to `path`; format inferred from the extension when `None`.
pub fn write_export(
    path: &Path,
    result: &ScanResult,
    format: Option<ExportFormat>,
) -> crate::errors::Result<ExportFormat> {
    let format = format.unwrap_or_else(|| ExportFormat::from_path(path));
    let document = render(result, format).map_err(|e| ScanError::Io {
        path: path.display().to_string(),
        operation: "serialize".to_string(),
        source: std::io::Error::other(e.to_string()),
    })?;
    fs::write(path, document).with_path(path.display().to_string(), "write")?;
    tracing::debug!(path = %path.display(), format = ?format, "export written");
    Ok(format)
}
