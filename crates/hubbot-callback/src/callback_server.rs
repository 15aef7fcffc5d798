//! HTTP listener that acknowledges Jenkins callbacks and schedules correlation.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::Router;
use hubbot_core::CallbackCommand;
use tokio::net::TcpListener;

use crate::callback_path::parse_callback_path;
use crate::correlator::CallbackCorrelator;

pub const DEFAULT_CALLBACK_BIND: &str = "0.0.0.0:4420";

#[derive(Debug, Clone)]
pub struct CallbackServerConfig {
    pub bind: String,
}

impl Default for CallbackServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_CALLBACK_BIND.to_string(),
        }
    }
}

pub async fn run_callback_server(
    config: CallbackServerConfig,
    correlator: CallbackCorrelator,
) -> Result<()> {
    let bind_addr = config
        .bind
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid --callback-bind '{}'", config.bind))?;
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind callback listener on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve bound callback listener address")?;

    tracing::info!(
        addr = %local_addr,
        delay_ms = correlator.delay().as_millis() as u64,
        "callback listener monitoring jenkins callbacks"
    );

    axum::serve(listener, build_callback_router(correlator))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("callback listener exited unexpectedly")
}

/// Every method and path lands on one handler that always answers `200`.
pub fn build_callback_router(correlator: CallbackCorrelator) -> Router {
    Router::new()
        .fallback(handle_callback)
        .with_state(Arc::new(correlator))
}

async fn handle_callback(
    State(correlator): State<Arc<CallbackCorrelator>>,
    uri: Uri,
) -> StatusCode {
    let path = uri.path();
    match parse_callback_path(path) {
        Ok(Some(callback)) if callback.command == CallbackCommand::JobComplete => {
            tracing::info!(
                job = %callback.job_name,
                build = %callback.build_number,
                owner = %callback.owner_user_id,
                channel = %callback.channel_id,
                "job completion callback received"
            );
            drop(correlator.schedule(callback));
        }
        Ok(Some(callback)) => {
            tracing::debug!(
                command = callback.command.as_str(),
                "callback acknowledged without follow-up"
            );
        }
        Ok(None) => {
            tracing::debug!(path, "ignoring request for unknown callback command");
        }
        Err(error) => {
            tracing::warn!(error = %error, "malformed callback path");
        }
    }
    StatusCode::OK
}
