pub mod json;
pub mod text;

use std::path::Path;
use async_trait::async_trait;
use anyhow::Result;
use serde::{Serialize, Deserialize};

use super::model::Snapshot;

/// Report format enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Text,
}

/// Report generator trait
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    /// Write the snapshot to `output_path`
    async fn generate(&self, snapshot: &Snapshot, output_path: &Path) -> Result<()>;

    /// Get the supported format
    fn supported_format(&self) -> ReportFormat;
}

/// Convert report format to file extension
pub fn format_to_extension(format: ReportFormat) -> &'static str {
    match format {
        ReportFormat::Json => "json",
        ReportFormat::Text => "txt",
    }
}
