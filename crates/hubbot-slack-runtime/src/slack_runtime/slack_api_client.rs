//! Slack Web API client for posting replies, uploading artifacts, and reacting.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use hubbot_core::{truncate_for_error, ChatClient, FileUpload, PostedMessage, UploadedFile};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::slack_helpers::{
    is_transient_status, is_transient_transport_error, retry_after_header, SlackRetryPolicy,
};

pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";
const RETRY_ATTEMPT_HEADER: &str = "x-hubbot-retry-attempt";

/// Every Web API reply carries `ok`/`error`; method-specific fields sit beside them.
#[derive(Debug, Deserialize)]
struct SlackReply<T> {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    body: T,
}

#[derive(Debug, Deserialize)]
struct NoFields {}

#[derive(Debug, Deserialize)]
struct SocketUrl {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageStamp {
    ts: Option<String>,
    channel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadTicket {
    upload_url: Option<String>,
    file_id: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum SlackToken {
    App,
    Bot,
}

fn required_field(value: Option<String>, method: &str, field: &str) -> Result<String> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| anyhow!("slack {method} response missing {field}"))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[derive(Debug, Clone)]
pub struct SlackApiClientConfig {
    pub api_base: String,
    pub app_token: String,
    pub bot_token: String,
    pub request_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

#[derive(Clone)]
pub struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
    app_token: String,
    bot_token: String,
    retry: SlackRetryPolicy,
}

impl SlackApiClient {
    pub fn new(config: SlackApiClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("hubbot-slack-bridge")
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .context("failed to create slack api client")?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            app_token: config.app_token.trim().to_string(),
            bot_token: config.bot_token.trim().to_string(),
            retry: SlackRetryPolicy::new(config.retry_max_attempts, config.retry_base_delay_ms),
        })
    }

    pub async fn open_socket_connection(&self) -> Result<String> {
        const METHOD: &str = "apps.connections.open";
        let reply: SocketUrl = self.call(METHOD, SlackToken::App, None).await?;
        required_field(reply.url, METHOD, "url")
    }

    pub async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<PostedMessage> {
        const METHOD: &str = "chat.postMessage";
        let mut payload = json!({
            "channel": channel,
            "text": text,
            "unfurl_links": false,
            "unfurl_media": false,
        });
        if let Some(thread_ts) = non_blank(thread_ts) {
            payload["thread_ts"] = Value::from(thread_ts);
        }

        let stamp: MessageStamp = self.call(METHOD, SlackToken::Bot, Some(&payload)).await?;
        Ok(PostedMessage {
            channel: stamp.channel.unwrap_or_else(|| channel.to_string()),
            ts: required_field(stamp.ts, METHOD, "ts")?,
        })
    }

    /// Reserves an upload slot, pushes the raw bytes to it, then shares the
    /// file into the channel (and thread) with its comment.
    pub async fn upload_file_v2(&self, upload: &FileUpload) -> Result<UploadedFile> {
        if upload.filename.trim().is_empty() {
            bail!("slack files upload requires non-empty filename");
        }
        if upload.bytes.is_empty() {
            bail!("slack files upload requires non-empty payload");
        }

        const RESERVE: &str = "files.getUploadURLExternal";
        let ticket: UploadTicket = self
            .call(
                RESERVE,
                SlackToken::Bot,
                Some(&json!({
                    "filename": upload.filename,
                    "length": upload.bytes.len(),
                })),
            )
            .await?;
        let upload_url = required_field(ticket.upload_url, RESERVE, "upload_url")?;
        let file_id = required_field(ticket.file_id, RESERVE, "file_id")?;

        self.push_upload_bytes(&upload_url, upload.bytes.clone())
            .await?;

        let mut share = json!({
            "files": [{ "id": file_id, "title": upload.filename }],
            "channel_id": upload.channel,
        });
        if let Some(thread_ts) = non_blank(upload.thread_ts.as_deref()) {
            share["thread_ts"] = Value::from(thread_ts);
        }
        if let Some(comment) = non_blank(upload.initial_comment.as_deref()) {
            share["initial_comment"] = Value::from(comment);
        }
        let _: NoFields = self
            .call("files.completeUploadExternal", SlackToken::Bot, Some(&share))
            .await?;

        Ok(UploadedFile { file_id })
    }

    pub async fn add_file_reaction(&self, channel: &str, file_id: &str, name: &str) -> Result<()> {
        let payload = json!({
            "name": name,
            "channel": channel,
            "file": file_id,
        });
        let _: NoFields = self
            .call("reactions.add", SlackToken::Bot, Some(&payload))
            .await?;
        Ok(())
    }

    async fn push_upload_bytes(&self, upload_url: &str, bytes: Vec<u8>) -> Result<()> {
        let response = self
            .http
            .post(upload_url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .context("failed to upload file payload to slack external upload url")?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        bail!(
            "slack external upload failed: status={} body={}",
            status,
            truncate_for_error(&body, 320)
        )
    }

    /// Calls one Web API method and unwraps its `ok`/`error` envelope.
    async fn call<T>(&self, method: &str, token: SlackToken, payload: Option<&Value>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send_with_retry(method, token, payload).await?;
        let reply = response
            .json::<SlackReply<T>>()
            .await
            .with_context(|| format!("failed to decode slack {method}"))?;
        if !reply.ok {
            bail!(
                "slack {method} failed: {}",
                reply.error.as_deref().unwrap_or("unknown error")
            );
        }
        Ok(reply.body)
    }

    async fn send_with_retry(
        &self,
        method: &str,
        token: SlackToken,
        payload: Option<&Value>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}/{method}", self.api_base);
        let bearer = match token {
            SlackToken::App => &self.app_token,
            SlackToken::Bot => &self.bot_token,
        };

        let mut attempt = 1_usize;
        loop {
            let mut request = self
                .http
                .post(&url)
                .bearer_auth(bearer)
                .header(RETRY_ATTEMPT_HEADER, (attempt - 1).to_string());
            if let Some(payload) = payload {
                request = request.json(payload);
            }

            let wait = match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let retry_after = retry_after_header(response.headers());
                    if !(is_transient_status(status) && self.retry.has_attempts_left(attempt)) {
                        let body = response.text().await.unwrap_or_default();
                        bail!(
                            "slack api {method} failed with status {}: {}",
                            status.as_u16(),
                            truncate_for_error(&body, 800)
                        );
                    }
                    tracing::debug!(
                        method,
                        status = status.as_u16(),
                        attempt,
                        "retrying slack api call"
                    );
                    self.retry.backoff(attempt, retry_after)
                }
                Err(error)
                    if is_transient_transport_error(&error)
                        && self.retry.has_attempts_left(attempt) =>
                {
                    tracing::debug!(method, attempt, %error, "retrying slack api call");
                    self.retry.backoff(attempt, None)
                }
                Err(error) => {
                    return Err(error).with_context(|| format!("slack api {method} request failed"))
                }
            };

            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl ChatClient for SlackApiClient {
    async fn send_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<PostedMessage> {
        self.post_message(channel, text, thread_ts).await
    }

    async fn upload_file(&self, upload: FileUpload) -> Result<UploadedFile> {
        self.upload_file_v2(&upload).await
    }

    async fn add_reaction(&self, channel: &str, file_id: &str, reaction: &str) -> Result<()> {
        self.add_file_reaction(channel, file_id, reaction).await
    }
}
