// src/reporting/notify.rs
use std::time::Duration;
use serde_json::json;
use tracing::{info, debug, error};
use url::Url;

use crate::config::NotifyConfig;
use crate::error::{DorkHuntResult, DorkHuntError};
use crate::utils::HttpClient;
use super::model::Snapshot;

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Posts a run summary to a Discord-compatible webhook
pub struct WebhookNotifier {
    client: HttpClient,
    webhook_url: Url,
    max_message_len: usize,
}

impl WebhookNotifier {
    pub fn new(webhook_url: &str, max_message_len: usize) -> DorkHuntResult<Self> {
        let webhook_url = Url::parse(webhook_url)
            .map_err(|e| DorkHuntError::ConfigError(format!("Invalid webhook URL: {}", e)))?;

        Ok(Self {
            client: HttpClient::new(NOTIFY_TIMEOUT)?,
            webhook_url,
            max_message_len: max_message_len.max(1),
        })
    }

    /// None when notifications are disabled or no webhook is configured.
    /// `webhook_url` takes precedence over the configured one.
    pub fn from_config(config: &NotifyConfig, webhook_url: Option<&str>) -> DorkHuntResult<Option<Self>> {
        if !config.enabled {
            debug!("Notifications disabled");
            return Ok(None);
        }

        match webhook_url.or(config.webhook_url.as_deref()) {
            Some(url) if !url.trim().is_empty() => Ok(Some(Self::new(url.trim(), config.max_message_len)?)),
            _ => {
                debug!("No webhook configured, skipping notification");
                Ok(None)
            }
        }
    }

    /// Send every message in order. Delivery problems are logged and counted,
    /// never returned.
    pub async fn send(&self, snapshot: &Snapshot) -> usize {
        let messages = format_messages(snapshot, self.max_message_len);
        let mut delivered = 0;

        for message in &messages {
            match self.post(message).await {
                Ok(()) => delivered += 1,
                Err(e) => error!("Webhook delivery failed: {}", e),
            }
        }

        info!("Delivered {}/{} webhook messages", delivered, messages.len());
        delivered
    }

    async fn post(&self, content: &str) -> DorkHuntResult<()> {
        let response = self
            .client
            .post_json(self.webhook_url.as_str(), &json!({ "content": content }))
            .await?;

        if !response.status().is_success() {
            return Err(DorkHuntError::NotifyError(format!("webhook returned {}", response.status())));
        }

        Ok(())
    }
}

/// Header message, then each category as a block of `- item` lines.
/// Blocks are split so no message is longer than `max_len` characters.
pub fn format_messages(snapshot: &Snapshot, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let header = format!(
        "**Scan results for:** `{}`\nTimestamp: {}\n",
        snapshot.run.target,
        snapshot.run.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    if snapshot.is_empty() {
        return vec![truncate(&format!("{}\nNo results found.", header), max_len)];
    }

    let mut messages = vec![truncate(&header, max_len)];

    for (category, items) in snapshot.iter() {
        let mut part = String::new();
        let mut part_len = 0;

        let title = format!("__**{} [{}]**__:\n", category.as_str().to_uppercase(), items.len());
        let lines = std::iter::once(title).chain(items.iter().map(|item| format!("- {}\n", item)));

        for line in lines {
            let line = truncate(&line, max_len);
            let line_len = line.chars().count();

            if part_len + line_len > max_len {
                messages.push(std::mem::take(&mut part));
                part_len = 0;
            }

            part.push_str(&line);
            part_len += line_len;
        }

        if !part.is_empty() {
            messages.push(part);
        }
    }

    messages
}

fn truncate(text: &str, max_len: usize) -> String {
    text.chars().take(max_len).collect()
}
