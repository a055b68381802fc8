use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub global: GlobalConfig,
    pub dispatch: DispatchConfig,
    pub identity: IdentityConfig,
    /// engine id -> URL template with a single `{query}` insertion point
    pub engines: BTreeMap<String, String>,
    /// locale code -> region token appended as `country:<token>`
    pub locales: BTreeMap<String, String>,
    pub templates: Vec<TemplateConfig>,
    pub notify: NotifyConfig,
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub output_dir: PathBuf,
}

/// How admitted tasks are awaited
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Sequential,
    Parallel,
}

/// Dispatcher scheduling and politeness settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub mode: ExecutionMode,
    pub max_concurrency: usize,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl DispatchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }
}

/// Outbound identity rotation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub window_size: u64,
    pub seed: Option<u64>,
    pub accept_language: String,
    pub user_agents: Vec<String>,
}

/// Which planning pass a query template belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TemplateFamily {
    /// Base set for email targets
    Email,
    /// Base set for identifier targets
    Identifier,
    /// Appended in deep mode
    Deep,
    /// Appended when a category hint is given for a single-token identifier
    Hint,
}

/// A single dork template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateConfig {
    pub family: TemplateFamily,
    pub pattern: String,
}

/// Webhook notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub enabled: bool,
    pub webhook_url: Option<String>,
    pub max_message_len: usize,
}
