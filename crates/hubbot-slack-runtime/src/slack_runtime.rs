//! Slack Socket Mode runtime that feeds channel messages into the command router.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use hubbot_commands::CommandRouter;
use hubbot_core::{ChatClient, ChatEvent, PostedMessage};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

mod slack_api_client;

pub use slack_api_client::{SlackApiClient, SlackApiClientConfig, DEFAULT_SLACK_API_BASE};

#[derive(Clone)]
/// Runtime configuration for the Slack bridge transport loop.
pub struct SlackBridgeRuntimeConfig {
    pub slack_client: Arc<SlackApiClient>,
    pub reconnect_delay: Duration,
}

pub async fn run_slack_bridge(
    config: SlackBridgeRuntimeConfig,
    router: CommandRouter,
) -> Result<()> {
    let mut runtime = SlackBridgeRuntime {
        slack_client: config.slack_client,
        reconnect_delay: config.reconnect_delay,
        router,
    };
    runtime.run().await
}

struct SlackBridgeRuntime {
    slack_client: Arc<SlackApiClient>,
    reconnect_delay: Duration,
    router: CommandRouter,
}

enum SessionEnd {
    Disconnected,
    Shutdown,
}

impl SlackBridgeRuntime {
    async fn run(&mut self) -> Result<()> {
        loop {
            match self.slack_client.open_socket_connection().await {
                Ok(socket_url) => {
                    tracing::info!("slack bridge socket connected");
                    match self.run_socket_session(&socket_url).await {
                        Ok(SessionEnd::Shutdown) => {
                            tracing::info!("slack bridge shutdown requested");
                            return Ok(());
                        }
                        Ok(SessionEnd::Disconnected) => {
                            tracing::info!("slack bridge socket disconnected; reconnecting");
                        }
                        Err(error) => {
                            tracing::warn!(
                                error = %format!("{error:#}"),
                                "slack bridge socket session error"
                            );
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        error = %format!("{error:#}"),
                        "slack bridge failed to open socket connection"
                    );
                }
            }

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("slack bridge shutdown requested");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }
    }

    async fn run_socket_session(&mut self, socket_url: &str) -> Result<SessionEnd> {
        let (stream, _response) = connect_async(socket_url)
            .await
            .with_context(|| "failed to connect slack socket mode websocket")?;
        let (mut sink, mut source) = stream.split();

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    return Ok(SessionEnd::Shutdown);
                }
                maybe_message = source.next() => {
                    let Some(message_result) = maybe_message else {
                        return Ok(SessionEnd::Disconnected);
                    };
                    let message = message_result.context("failed reading slack websocket message")?;
                    let Some(envelope) = parse_socket_envelope(message)? else {
                        continue;
                    };
                    if envelope.envelope_type == "disconnect" {
                        return Ok(SessionEnd::Disconnected);
                    }
                    if let Some(envelope_id) = envelope.envelope_id.as_deref() {
                        ack_envelope(&mut sink, envelope_id).await?;
                    }
                    self.handle_envelope(&envelope);
                }
            }
        }
    }

    fn handle_envelope(&self, envelope: &SlackSocketEnvelope) {
        let event = match normalize_socket_envelope(envelope, self.router.bot_user_id()) {
            Ok(Some(event)) => event,
            Ok(None) => return,
            Err(error) => {
                tracing::warn!(
                    error = %format!("{error:#}"),
                    "ignoring malformed slack event envelope"
                );
                return;
            }
        };

        let router = self.router.clone();
        let chat = Arc::clone(&self.slack_client);
        tokio::spawn(async move {
            if let Err(error) = process_chat_event(&router, &*chat, &event).await {
                tracing::warn!(
                    channel = %event.channel_id,
                    error = %format!("{error:#}"),
                    "failed to post chat reply"
                );
            }
        });
    }
}

/// Routes one chat event and posts any reply into the originating thread.
pub async fn process_chat_event(
    router: &CommandRouter,
    chat: &dyn ChatClient,
    event: &ChatEvent,
) -> Result<Option<PostedMessage>> {
    let Some(response_text) = router.handle_event(event) else {
        return Ok(None);
    };
    let posted = chat
        .send_message(
            &event.channel_id,
            &response_text,
            Some(event.reply_thread_ts()),
        )
        .await?;
    Ok(Some(posted))
}

async fn ack_envelope<S>(sink: &mut S, envelope_id: &str) -> Result<()>
where
    S: futures_util::Sink<WsMessage> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    let ack = json!({ "envelope_id": envelope_id }).to_string();
    sink.send(WsMessage::Text(ack.into()))
        .await
        .context("failed to send slack socket ack")
}

#[derive(Debug, Clone, Deserialize)]
struct SlackSocketEnvelope {
    #[serde(default)]
    envelope_id: Option<String>,
    #[serde(rename = "type")]
    envelope_type: String,
    #[serde(default)]
    payload: Value,
}

fn parse_socket_envelope(message: WsMessage) -> Result<Option<SlackSocketEnvelope>> {
    let text = match message {
        WsMessage::Text(text) => text.as_str().to_string(),
        WsMessage::Binary(bytes) => {
            String::from_utf8(bytes.to_vec()).context("invalid utf-8 slack socket payload")?
        }
        WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Close(_) | WsMessage::Frame(_) => {
            return Ok(None)
        }
    };
    let envelope = serde_json::from_str::<SlackSocketEnvelope>(&text)
        .context("failed to parse slack socket envelope")?;
    Ok(Some(envelope))
}

#[derive(Debug, Deserialize)]
struct SlackEventCallbackEnvelope {
    #[serde(rename = "type")]
    callback_type: String,
    event: SlackEventPayload,
}

#[derive(Debug, Deserialize)]
struct SlackEventPayload {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    thread_ts: Option<String>,
}

/// Channel messages only. `app_mention` duplicates every mention already
/// delivered as a `message`, so it is dropped here.
fn normalize_socket_envelope(
    envelope: &SlackSocketEnvelope,
    bot_user_id: &str,
) -> Result<Option<ChatEvent>> {
    if envelope.envelope_type != "events_api" {
        return Ok(None);
    }

    let callback = serde_json::from_value::<SlackEventCallbackEnvelope>(envelope.payload.clone())
        .context("failed to decode slack event callback payload")?;
    if callback.callback_type != "event_callback" {
        return Ok(None);
    }

    let event = callback.event;
    if event.event_type != "message" || event.subtype.is_some() {
        return Ok(None);
    }
    let user_id = match event.user {
        Some(user) if !user.trim().is_empty() => user,
        _ => return Ok(None),
    };
    if user_id == bot_user_id {
        return Ok(None);
    }
    let channel_id = match event.channel {
        Some(channel) if !channel.trim().is_empty() => channel,
        _ => return Ok(None),
    };
    let ts = match event.ts {
        Some(ts) if !ts.trim().is_empty() => ts,
        _ => return Ok(None),
    };

    let mut chat_event = ChatEvent::new(user_id, channel_id, ts, event.text.unwrap_or_default());
    chat_event.thread_ts = event.thread_ts.filter(|value| !value.trim().is_empty());
    Ok(Some(chat_event))
}
