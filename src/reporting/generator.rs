// src/reporting/generator.rs
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use anyhow::Result;
use tracing::{info, debug, warn};

use super::model::Snapshot;
use super::formats::{ReportFormat, ReportGenerator, format_to_extension};
use super::formats::json::JsonReportGenerator;
use super::formats::text::TextReportGenerator;

/// Writes snapshots to the output directory
pub struct ReportManager {
    generators: HashMap<ReportFormat, Box<dyn ReportGenerator>>,
    report_dir: PathBuf,
}

impl ReportManager {
    /// Create a report manager with the JSON and text generators registered
    pub fn new(report_dir: PathBuf) -> Self {
        let mut manager = Self {
            generators: HashMap::new(),
            report_dir,
        };

        manager.register_generator(Box::new(JsonReportGenerator::new()));
        manager.register_generator(Box::new(TextReportGenerator::new()));
        manager
    }

    /// Register a new report generator
    pub fn register_generator(&mut self, generator: Box<dyn ReportGenerator>) {
        let format = generator.supported_format();
        debug!("Registering report generator for format: {:?}", format);
        self.generators.insert(format, generator);
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    /// `results_<target>_<finished>` without extension
    pub fn base_name(snapshot: &Snapshot) -> String {
        format!(
            "results_{}_{}",
            sanitize_filename(&snapshot.run.target),
            snapshot.run.finished_at.format("%Y%m%d_%H%M%S")
        )
    }

    /// Generate a report in a specific format
    pub async fn generate_report(&self, snapshot: &Snapshot, format: ReportFormat) -> Result<PathBuf> {
        if !self.report_dir.exists() {
            debug!("Creating report directory: {}", self.report_dir.display());
            tokio::fs::create_dir_all(&self.report_dir).await?;
        }

        let generator = self.generators.get(&format)
            .ok_or_else(|| anyhow::anyhow!("No generator found for format {:?}", format))?;

        let filename = format!("{}.{}", Self::base_name(snapshot), format_to_extension(format));
        let output_path = self.report_dir.join(filename);

        info!("Writing {:?} report to {}", format, output_path.display());
        generator.generate(snapshot, &output_path).await?;

        Ok(output_path)
    }

    /// Generate a report in multiple formats. A failing format is logged and
    /// skipped; it is an error only when nothing was written.
    pub async fn generate_multi_format(&self, snapshot: &Snapshot, formats: &[ReportFormat]) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();

        for format in formats {
            match self.generate_report(snapshot, *format).await {
                Ok(path) => paths.push(path),
                Err(e) => warn!("Failed to generate report in format {:?}: {}", format, e),
            }
        }

        if paths.is_empty() {
            return Err(anyhow::anyhow!("Failed to generate any reports"));
        }

        Ok(paths)
    }

    /// JSON and text, in that order
    pub async fn save(&self, snapshot: &Snapshot) -> Result<Vec<PathBuf>> {
        self.generate_multi_format(snapshot, &[ReportFormat::Json, ReportFormat::Text]).await
    }
}

/// Keep `[A-Za-z0-9_.-]`, replace everything else with `_`
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') { c } else { '_' })
        .collect()
}
