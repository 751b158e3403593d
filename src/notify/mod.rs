//! Outbound alert delivery.
//!
//! Discord rejects embed descriptions past a fixed size, so long bodies are
//! split into numbered parts before they leave the process.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info};

/// Largest description sent in a single message.
pub const MAX_MESSAGE_CHARS: usize = 1900;
/// Embed accent (orange).
const EMBED_COLOR: u32 = 16_753_920;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `body` under `title`. Errors mean nothing reached any target.
    async fn send(&self, title: &str, body: &str) -> Result<()>;

    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct WebhookMessage<'a> {
    embeds: [Embed<'a>; 1],
}

#[derive(Serialize)]
struct Embed<'a> {
    title: &'a str,
    description: &'a str,
    color: u32,
}

/// Discord webhook fan-out: every message goes to every configured URL.
pub struct DiscordWebhook {
    client: Client,
    urls: Vec<String>,
}

impl DiscordWebhook {
    pub fn new(urls: Vec<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        info!("Discord notifications enabled ({} webhook(s))", urls.len());
        Ok(DiscordWebhook { client, urls })
    }

    async fn post(&self, url: &str, title: &str, description: &str) -> Result<()> {
        let message = WebhookMessage {
            embeds: [Embed {
                title,
                description,
                color: EMBED_COLOR,
            }],
        };
        let resp = self
            .client
            .post(url)
            .json(&message)
            .send()
            .await
            .context("Webhook request failed")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Webhook error {}: {}", status, body);
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    async fn send(&self, title: &str, body: &str) -> Result<()> {
        let parts = split_message(body, MAX_MESSAGE_CHARS);
        let total = parts.len();
        let mut delivered = 0usize;

        for (i, part) in parts.iter().enumerate() {
            let part_title = if total > 1 {
                format!("{} (Part {})", title, i + 1)
            } else {
                title.to_string()
            };
            let results = join_all(self.urls.iter().map(|url| self.post(url, &part_title, part))).await;
            for result in results {
                match result {
                    Ok(()) => delivered += 1,
                    Err(e) => error!("Discord delivery of '{}' failed: {:#}", part_title, e),
                }
            }
        }

        if delivered == 0 && !self.urls.is_empty() {
            anyhow::bail!("'{}' was not delivered to any webhook", title);
        }
        debug!("'{}' sent in {} part(s)", title, total);
        Ok(())
    }

    fn name(&self) -> &str {
        "Discord"
    }
}

/// Dry-run notifier: messages go to the log only.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, title: &str, body: &str) -> Result<()> {
        info!("[dry-run] {}\n{}", title, body);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Split `body` into chunks of at most `limit` chars, breaking on newlines
/// when possible. An over-long single line is cut at char boundaries.
pub fn split_message(body: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in body.split('\n') {
        let line_len = line.chars().count();
        let needed = if current.is_empty() { line_len } else { line_len + 1 };

        if current_len + needed <= limit {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
            current_len += needed;
            continue;
        }

        if !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len <= limit {
            current.push_str(line);
            current_len = line_len;
        } else {
            let chars: Vec<char> = line.chars().collect();
            let mut pieces = chars.chunks(limit).map(|c| c.iter().collect::<String>()).peekable();
            while let Some(piece) = pieces.next() {
                if pieces.peek().is_some() {
                    parts.push(piece);
                } else {
                    current_len = piece.chars().count();
                    current = piece;
                }
            }
        }
    }
    if !current.is_empty() || parts.is_empty() {
        parts.push(current);
    }
    parts
}
