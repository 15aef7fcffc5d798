//! Wires configuration into the Slack bridge and the callback listener.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use hubbot_callback::{run_callback_server, CallbackCorrelator, CallbackServerConfig};
use hubbot_commands::{CommandClassifier, CommandRouter};
use hubbot_core::EnvironmentRegistry;
use hubbot_jenkins::{JenkinsClient, JenkinsClientConfig};
use hubbot_slack_runtime::{
    run_slack_bridge, SlackApiClient, SlackApiClientConfig, SlackBridgeRuntimeConfig,
};

use crate::cli_args::Cli;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Values the chat side cannot run without, after trimming.
pub(crate) struct ChatBridgeSettings {
    pub(crate) bot_user_id: String,
    pub(crate) hub_environment: String,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Resolves chat settings, or names every missing setting.
pub(crate) fn resolve_chat_bridge_settings(
    cli: &Cli,
) -> std::result::Result<ChatBridgeSettings, Vec<&'static str>> {
    let required = [
        ("SLACK_TOKEN", &cli.slack_bot_token),
        ("SLACK_APP_TOKEN", &cli.slack_app_token),
        ("BOT_USER_ID", &cli.bot_user_id),
        ("HUB_ENVIRONMENT", &cli.hub_environment),
        ("JENKINS_USER", &cli.jenkins_user),
        ("JENKINS_KEY", &cli.jenkins_key),
    ];
    let missing = required
        .iter()
        .filter(|(_, value)| non_empty(value).is_none())
        .map(|(name, _)| *name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(missing);
    }

    Ok(ChatBridgeSettings {
        bot_user_id: non_empty(&cli.bot_user_id).unwrap_or_default().to_string(),
        hub_environment: non_empty(&cli.hub_environment)
            .unwrap_or_default()
            .to_string(),
    })
}

pub(crate) fn build_environment_registry(cli: &Cli, hub_environment: &str) -> EnvironmentRegistry {
    EnvironmentRegistry::new(
        cli.known_environments.clone(),
        hub_environment,
        cli.default_environment.trim(),
    )
}

pub(crate) fn build_slack_client(cli: &Cli) -> Result<SlackApiClient> {
    SlackApiClient::new(SlackApiClientConfig {
        api_base: cli.slack_api_base.clone(),
        app_token: non_empty(&cli.slack_app_token).unwrap_or_default().to_string(),
        bot_token: non_empty(&cli.slack_bot_token).unwrap_or_default().to_string(),
        request_timeout_ms: cli.request_timeout_ms,
        retry_max_attempts: cli.slack_retry_max_attempts,
        retry_base_delay_ms: cli.slack_retry_base_delay_ms,
    })
}

pub(crate) fn build_jenkins_client(cli: &Cli) -> Result<JenkinsClient> {
    JenkinsClient::new(JenkinsClientConfig {
        base_url: cli.jenkins_base_url.clone(),
        user: non_empty(&cli.jenkins_user).unwrap_or_default().to_string(),
        api_key: non_empty(&cli.jenkins_key).unwrap_or_default().to_string(),
        request_timeout_ms: cli.request_timeout_ms,
    })
}

/// Runs until Ctrl-C. The callback listener always starts; the chat bridge
/// only when fully configured.
pub(crate) async fn run_hub(cli: Cli) -> Result<()> {
    let slack_client = Arc::new(build_slack_client(&cli)?);
    let jenkins_client = Arc::new(build_jenkins_client(&cli)?);
    let hub_environment = non_empty(&cli.hub_environment)
        .unwrap_or_default()
        .to_string();

    let correlator = CallbackCorrelator::new(
        slack_client.clone(),
        jenkins_client.clone(),
        &hub_environment,
        Duration::from_millis(cli.callback_delay_ms),
    );
    let callback_server = run_callback_server(
        CallbackServerConfig {
            bind: cli.callback_bind.clone(),
        },
        correlator,
    );

    let settings = match resolve_chat_bridge_settings(&cli) {
        Ok(settings) => settings,
        Err(missing) => {
            tracing::error!(
                missing = %missing.join(", "),
                "unable to start chat listener: missing configuration: {}",
                missing.join(", ")
            );
            return callback_server.await;
        }
    };

    let registry = build_environment_registry(&cli, &settings.hub_environment);
    tracing::info!(
        hub_environment = registry.hub_environment(),
        default_environment = registry.default_environment(),
        known_environments = %registry.known_list(),
        "starting chat bridge"
    );
    let router = CommandRouter::new(
        CommandClassifier::new(settings.bot_user_id, cli.attention_terms.clone()),
        registry,
        jenkins_client,
    );
    let bridge = run_slack_bridge(
        SlackBridgeRuntimeConfig {
            slack_client,
            reconnect_delay: Duration::from_millis(cli.slack_reconnect_delay_ms),
        },
        router,
    );

    tokio::try_join!(callback_server, bridge)?;
    Ok(())
}
