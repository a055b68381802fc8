// src/reporting/archive.rs
use std::path::{Path, PathBuf};
use anyhow::Result;
use chrono::Utc;
use tracing::debug;

use super::generator::sanitize_filename;

/// Raw response bodies of one run, one file per successful task
pub struct HtmlArchive {
    dir: PathBuf,
}

impl HtmlArchive {
    /// `<report_dir>/html_<target>_<started>/`
    pub fn new(report_dir: &Path, target: &str) -> Self {
        let dir = report_dir.join(format!(
            "html_{}_{}",
            sanitize_filename(target.trim()),
            Utc::now().format("%Y%m%d_%H%M%S")
        ));

        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one body as `<task id>_<engine>.html`
    pub async fn save(&self, task_id: usize, engine: &str, body: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(format!("{:04}_{}.html", task_id, sanitize_filename(engine)));
        tokio::fs::write(&path, body).await?;
        debug!("Saved response body to {}", path.display());

        Ok(path)
    }
}
