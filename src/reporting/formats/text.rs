use std::fmt::Write;
use std::path::Path;
use async_trait::async_trait;
use anyhow::Result;

use crate::reporting::model::Snapshot;
use super::{ReportFormat, ReportGenerator};

/// Plain-text listing, one block per category
#[derive(Default)]
pub struct TextReportGenerator;

impl TextReportGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn render(snapshot: &Snapshot) -> String {
        let mut out = String::new();
        let run = &snapshot.run;

        // writing to a String cannot fail
        let _ = writeln!(out, "Scan results for: {}", run.target);
        let _ = writeln!(out, "Timestamp: {} UTC", run.finished_at.format("%Y-%m-%dT%H:%M:%S"));
        let _ = writeln!(
            out,
            "Tasks: {} total, {} succeeded, {} failed{}",
            run.tasks_total,
            run.tasks_succeeded,
            run.tasks_failed,
            if run.cancelled { " (cancelled)" } else { "" }
        );
        let _ = writeln!(out, "Duration: {}s", run.duration_seconds());

        if !run.engines.is_empty() {
            let _ = writeln!(out, "Engines:");
            for (engine, tally) in &run.engines {
                let _ = writeln!(out, "  {:<12} {} succeeded, {} failed", engine, tally.succeeded, tally.failed);
            }
        }
        out.push('\n');

        if snapshot.is_empty() {
            out.push_str("No results found.\n");
            return out;
        }

        for (category, items) in snapshot.iter() {
            let _ = writeln!(out, "{} [{}]:", category.as_str().to_uppercase(), items.len());
            for item in items {
                let _ = writeln!(out, "  {}", item);
            }
            out.push('\n');
        }

        out
    }
}

#[async_trait]
impl ReportGenerator for TextReportGenerator {
    async fn generate(&self, snapshot: &Snapshot, output_path: &Path) -> Result<()> {
        tokio::fs::write(output_path, Self::render(snapshot)).await?;
        Ok(())
    }

    fn supported_format(&self) -> ReportFormat {
        ReportFormat::Text
    }
}
