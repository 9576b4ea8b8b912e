use crate::models::RecommendationBundle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub mod csv;
pub mod json;
pub mod text;
pub mod tracking;

pub use text::{advice_context, AdviceContext};
pub use tracking::TrackingTemplate;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Text,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Text => "txt",
            ExportFormat::Csv => "csv",
        }
    }

    /// Guess the format from a file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ExportError> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ExportError::UnsupportedFormat(path.as_ref().display().to_string()))?;
        extension.parse()
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "text" | "txt" => Ok(ExportFormat::Text),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Text => write!(f, "text"),
            ExportFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] ::csv::Error),
}

/// Render a bundle in the given format
pub fn render_bundle(bundle: &RecommendationBundle, format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => json::to_json(bundle),
        ExportFormat::Text => Ok(text::render_report(bundle)),
        ExportFormat::Csv => csv::render_plan_rows(bundle),
    }
}

/// Write a bundle to a file in the given format
pub fn export_bundle<P: AsRef<Path>>(
    bundle: &RecommendationBundle,
    format: ExportFormat,
    output_path: P,
) -> Result<(), ExportError> {
    let rendered = render_bundle(bundle, format)?;
    std::fs::write(&output_path, rendered)?;

    tracing::info!(
        format = %format,
        path = %output_path.as_ref().display(),
        "Recommendation exported"
    );
    Ok(())
}
