use std::path::Path;
use async_trait::async_trait;
use anyhow::Result;

use crate::reporting::model::Snapshot;
use super::{ReportFormat, ReportGenerator};

/// JSON report generator
#[derive(Default)]
pub struct JsonReportGenerator;

impl JsonReportGenerator {
    /// Create a new JSON report generator
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReportGenerator for JsonReportGenerator {
    async fn generate(&self, snapshot: &Snapshot, output_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot)?;
        tokio::fs::write(output_path, json).await?;
        Ok(())
    }

    fn supported_format(&self) -> ReportFormat {
        ReportFormat::Json
    }
}
