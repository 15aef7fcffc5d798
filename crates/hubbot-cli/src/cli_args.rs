use clap::Parser;
use hubbot_callback::DEFAULT_CALLBACK_BIND;
use hubbot_commands::DEFAULT_ATTENTION_TERMS;
use hubbot_core::{DEFAULT_ENVIRONMENT, DEFAULT_KNOWN_ENVIRONMENTS};
use hubbot_jenkins::DEFAULT_JENKINS_BASE_URL;
use hubbot_slack_runtime::DEFAULT_SLACK_API_BASE;

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "hubbot",
    about = "Slack command hub for Jenkins deploy, screenshot and status jobs",
    version
)]
pub(crate) struct Cli {
    #[arg(
        long = "slack-bot-token",
        env = "SLACK_TOKEN",
        hide_env_values = true,
        help = "Slack bot token for Web API (xoxb-...)"
    )]
    pub(crate) slack_bot_token: Option<String>,

    #[arg(
        long = "slack-app-token",
        env = "SLACK_APP_TOKEN",
        hide_env_values = true,
        help = "Slack Socket Mode app token (xapp-...)"
    )]
    pub(crate) slack_app_token: Option<String>,

    #[arg(
        long = "bot-user-id",
        env = "BOT_USER_ID",
        help = "Slack user id of this bot; messages must mention it to be routed"
    )]
    pub(crate) bot_user_id: Option<String>,

    #[arg(
        long = "hub-environment",
        env = "HUB_ENVIRONMENT",
        help = "Environment this instance serves; commands for other environments are ignored"
    )]
    pub(crate) hub_environment: Option<String>,

    #[arg(
        long = "jenkins-user",
        env = "JENKINS_USER",
        help = "Jenkins user for job triggers and artifact reads"
    )]
    pub(crate) jenkins_user: Option<String>,

    #[arg(
        long = "jenkins-key",
        env = "JENKINS_KEY",
        hide_env_values = true,
        help = "Jenkins API token paired with --jenkins-user"
    )]
    pub(crate) jenkins_key: Option<String>,

    #[arg(
        long = "jenkins-base-url",
        env = "HUBBOT_JENKINS_BASE_URL",
        default_value = DEFAULT_JENKINS_BASE_URL,
        help = "Base URL of the Jenkins automation server"
    )]
    pub(crate) jenkins_base_url: String,

    #[arg(
        long = "callback-bind",
        env = "HUBBOT_CALLBACK_BIND",
        default_value = DEFAULT_CALLBACK_BIND,
        help = "Socket address for the Jenkins callback listener"
    )]
    pub(crate) callback_bind: String,

    #[arg(
        long = "callback-delay-ms",
        env = "HUBBOT_CALLBACK_DELAY_MS",
        default_value_t = 2_000,
        help = "Delay between acknowledging a callback and fetching its artifact"
    )]
    pub(crate) callback_delay_ms: u64,

    #[arg(
        long = "known-environments",
        env = "HUBBOT_KNOWN_ENVIRONMENTS",
        value_delimiter = ',',
        default_values_t = DEFAULT_KNOWN_ENVIRONMENTS.iter().map(|value| value.to_string()),
        help = "Comma-separated environments accepted as command targets"
    )]
    pub(crate) known_environments: Vec<String>,

    #[arg(
        long = "default-environment",
        env = "HUBBOT_DEFAULT_ENVIRONMENT",
        default_value = DEFAULT_ENVIRONMENT,
        help = "Environment whose instance answers help and unknown commands"
    )]
    pub(crate) default_environment: String,

    #[arg(
        long = "attention-terms",
        env = "HUBBOT_ATTENTION_TERMS",
        value_delimiter = ',',
        default_values_t = DEFAULT_ATTENTION_TERMS.iter().map(|value| value.to_string()),
        help = "Comma-separated words that must precede the bot mention"
    )]
    pub(crate) attention_terms: Vec<String>,

    #[arg(
        long = "slack-api-base",
        env = "HUBBOT_SLACK_API_BASE",
        default_value = DEFAULT_SLACK_API_BASE,
        help = "Slack Web API base URL"
    )]
    pub(crate) slack_api_base: String,

    #[arg(
        long = "request-timeout-ms",
        env = "HUBBOT_REQUEST_TIMEOUT_MS",
        default_value_t = 30_000,
        value_parser = parse_positive_u64,
        help = "Timeout for each outbound Slack or Jenkins HTTP request"
    )]
    pub(crate) request_timeout_ms: u64,

    #[arg(
        long = "slack-retry-max-attempts",
        env = "HUBBOT_SLACK_RETRY_MAX_ATTEMPTS",
        default_value_t = 4,
        value_parser = parse_positive_usize,
        help = "Maximum attempts for a Slack Web API call on 429/5xx or transport errors"
    )]
    pub(crate) slack_retry_max_attempts: usize,

    #[arg(
        long = "slack-retry-base-delay-ms",
        env = "HUBBOT_SLACK_RETRY_BASE_DELAY_MS",
        default_value_t = 500,
        value_parser = parse_positive_u64,
        help = "Base backoff between Slack retries when no Retry-After is given"
    )]
    pub(crate) slack_retry_base_delay_ms: u64,

    #[arg(
        long = "slack-reconnect-delay-ms",
        env = "HUBBOT_SLACK_RECONNECT_DELAY_MS",
        default_value_t = 5_000,
        value_parser = parse_positive_u64,
        help = "Wait before reopening a dropped Socket Mode connection"
    )]
    pub(crate) slack_reconnect_delay_ms: u64,
}
