use std::{fs, time::Duration};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::warn;
use reqwest::Client;
use serde::Deserialize;

use crate::settings::SlackSettings;

use super::Notifier;

pub const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Posts notifications to a Slack channel through `chat.postMessage`.
///
/// Delivery of a single message is bounded by `timeout`; a slow or silent
/// Slack costs the engine at most that long.
pub struct SlackNotifier {
    http: Client,
    url: String,
    token: String,
    channel: String,
    timeout: Duration,
}

impl SlackNotifier {
    pub fn new(http: Client, token: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            http,
            url: POST_MESSAGE_URL.to_string(),
            token: token.into(),
            channel: channel.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads the bot token from `settings.token_file` and builds an HTTP
    /// client bounded by `settings.timeout_ms`.
    pub fn from_settings(settings: &SlackSettings) -> Result<Self> {
        let token = fs::read_to_string(&settings.token_file).with_context(|| {
            format!("failed to read slack token from {}", settings.token_file.display())
        })?;
        let token = token.trim();
        if token.is_empty() {
            bail!("slack token file {} is empty", settings.token_file.display());
        }
        if settings.channel.trim().is_empty() {
            bail!("slack channel is empty");
        }
        let http = Client::builder()
            .timeout(settings.timeout())
            .build()
            .context("failed to build slack http client")?;
        Ok(Self::new(http, token, settings.channel.trim()).with_timeout(settings.timeout()))
    }

    async fn post(&self, text: &str) -> Result<()> {
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .form(&[("channel", self.channel.as_str()), ("text", message_text(text))])
            .send()
            .await
            .context("slack request failed")?;

        let status = response.status();
        let body: PostMessageResponse = response
            .json()
            .await
            .with_context(|| format!("unreadable slack response (HTTP {status})"))?;
        if !body.ok {
            bail!(
                "slack rejected message: {}",
                body.error.as_deref().unwrap_or("unknown error")
            );
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, text: &str) {
        match tokio::time::timeout(self.timeout, self.post(text)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("slack notification dropped: {err:#}"),
            Err(_) => warn!("slack notification dropped: no reply within {:?}", self.timeout),
        }
    }
}

/// Slack refuses empty messages.
fn message_text(text: &str) -> &str {
    if text.is_empty() {
        "Empty msg"
    } else {
        text
    }
}
