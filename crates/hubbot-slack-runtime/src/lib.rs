//! Slack transport for the hub bot.
//!
//! [`SlackApiClient`] implements the hub's [`hubbot_core::ChatClient`] over
//! the Slack Web API, and [`run_slack_bridge`] drives a Socket Mode session
//! that feeds channel messages into the command router.

mod slack_helpers;
pub mod slack_runtime;

pub use slack_runtime::{
    process_chat_event, run_slack_bridge, SlackApiClient, SlackApiClientConfig,
    SlackBridgeRuntimeConfig, DEFAULT_SLACK_API_BASE,
};
