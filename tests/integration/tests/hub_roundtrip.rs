use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use httpmock::prelude::*;
use hubbot_callback::{build_callback_router, CallbackCorrelator};
use hubbot_commands::{CommandClassifier, CommandRouter};
use hubbot_core::{ChatEvent, EnvironmentRegistry};
use hubbot_jenkins::{JenkinsClient, JenkinsClientConfig};
use hubbot_slack_runtime::{process_chat_event, SlackApiClient, SlackApiClientConfig};
use serde_json::json;
use tokio::net::TcpListener;

fn slack_client(server: &MockServer) -> Arc<SlackApiClient> {
    Arc::new(
        SlackApiClient::new(SlackApiClientConfig {
            api_base: server.base_url(),
            app_token: "xapp-test".to_string(),
            bot_token: "xoxb-test".to_string(),
            request_timeout_ms: 2_000,
            retry_max_attempts: 2,
            retry_base_delay_ms: 1,
        })
        .expect("slack client"),
    )
}

fn jenkins_client(server: &MockServer) -> Arc<JenkinsClient> {
    Arc::new(
        JenkinsClient::new(JenkinsClientConfig {
            base_url: server.base_url(),
            user: "jenkins".to_string(),
            api_key: "secret".to_string(),
            request_timeout_ms: 2_000,
        })
        .expect("jenkins client"),
    )
}

async fn spawn_callback_listener(
    correlator: CallbackCorrelator,
) -> Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind ephemeral listener")?;
    let addr = listener.local_addr().context("resolve listener addr")?;
    let app = build_callback_router(correlator);
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    Ok((addr, handle))
}

async fn wait_for_calls(mock: &httpmock::Mock<'_>, expected: usize) {
    for _ in 0..200 {
        if mock.calls() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn integration_deploy_command_acknowledges_in_thread_and_triggers_jenkins() {
    let slack = MockServer::start();
    let jenkins = MockServer::start();
    let reply = slack.mock(|when, then| {
        when.method(POST)
            .path("/chat.postMessage")
            .body_includes("\"thread_ts\":\"100.1\"")
            .body_includes("*[dev01]* Rebuild and redeploy will be issued for service *svc-a* shortly <@U1>.");
        then.status(200)
            .json_body(json!({"ok": true, "channel": "C1", "ts": "100.2"}));
    });
    let trigger = jenkins.mock(|when, then| {
        when.method(POST)
            .path("/job/service_deploy/buildWithParameters")
            .header_exists("authorization")
            .body_includes("SLACK_OWNER=U1")
            .body_includes("SLACK_CHAN=C1")
            .body_includes("SLACK_THREAD=100.1")
            .body_includes("SERVICE_NAME=svc-a");
        then.status(201);
    });

    let router = CommandRouter::new(
        CommandClassifier::with_default_terms("UBOT"),
        EnvironmentRegistry::with_defaults("dev01"),
        jenkins_client(&jenkins),
    );
    let chat = slack_client(&slack);
    let event = ChatEvent::new("U1", "C1", "100.1", "please <@UBOT> redeploy dev01 svc-a");

    process_chat_event(&router, &*chat, &event)
        .await
        .expect("process chat event")
        .expect("reply posted");
    wait_for_calls(&trigger, 1).await;

    reply.assert_calls(1);
    trigger.assert_calls(1);
}

#[tokio::test]
async fn integration_help_is_answered_only_by_default_instance() {
    let slack = MockServer::start();
    let jenkins = MockServer::start();
    let reply = slack.mock(|when, then| {
        when.method(POST)
            .path("/chat.postMessage")
            .body_includes("*[arrondev]*");
        then.status(200)
            .json_body(json!({"ok": true, "channel": "C1", "ts": "1.2"}));
    });

    let chat = slack_client(&slack);
    let event = ChatEvent::new("U1", "C1", "1.1", "hey <@UBOT> help");
    for hub in ["arrondev", "dev01", "prod"] {
        let router = CommandRouter::new(
            CommandClassifier::with_default_terms("UBOT"),
            EnvironmentRegistry::with_defaults(hub),
            jenkins_client(&jenkins),
        );
        process_chat_event(&router, &*chat, &event)
            .await
            .expect("process chat event");
    }

    reply.assert_calls(1);
}

#[tokio::test]
async fn integration_log_callback_uploads_console_and_reacts() {
    let slack = MockServer::start();
    let jenkins = MockServer::start();
    let console = jenkins.mock(|when, then| {
        when.method(GET).path("/job/service_deploy/12/consoleText");
        then.status(200).body("deploying\nFinished: SUCCESS\n");
    });
    let reserve = slack.mock(|when, then| {
        when.method(POST)
            .path("/files.getUploadURLExternal")
            .body_includes("\"filename\":\"service_deploy_12_log.txt\"");
        then.status(200).json_body(json!({
            "ok": true,
            "upload_url": slack.url("/upload/F12"),
            "file_id": "F12"
        }));
    });
    let push = slack.mock(|when, then| {
        when.method(POST).path("/upload/F12");
        then.status(200).body("OK");
    });
    let complete = slack.mock(|when, then| {
        when.method(POST)
            .path("/files.completeUploadExternal")
            .body_includes("\"channel_id\":\"C1\"")
            .body_includes("\"thread_ts\":\"100.1\"")
            .body_includes("*[dev01]* Hey <@U1> - service_deploy build 12 finished!");
        then.status(200).json_body(json!({"ok": true}));
    });
    let reaction = slack.mock(|when, then| {
        when.method(POST)
            .path("/reactions.add")
            .body_includes("\"name\":\"thumbsup\"")
            .body_includes("\"file\":\"F12\"");
        then.status(200).json_body(json!({"ok": true}));
    });

    let correlator = CallbackCorrelator::new(
        slack_client(&slack),
        jenkins_client(&jenkins),
        "dev01",
        Duration::ZERO,
    );
    let (addr, handle) = spawn_callback_listener(correlator)
        .await
        .expect("spawn listener");

    let response = reqwest::get(format!(
        "http://{addr}/jobComplete/service_deploy/12/U1/C1/100.1"
    ))
    .await
    .expect("callback request");
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.expect("body"), "");

    wait_for_calls(&reaction, 1).await;
    reserve.assert_calls(1);
    push.assert_calls(1);
    complete.assert_calls(1);
    reaction.assert_calls(1);
    console.assert_calls(2);
    handle.abort();
}

#[tokio::test]
async fn integration_status_callback_posts_branch_lines() {
    let slack = MockServer::start();
    let jenkins = MockServer::start();
    jenkins.mock(|when, then| {
        when.method(GET).path("/job/git_status/4/consoleText");
        then.status(200)
            .body("+ git fetch\nOn branch main\nYour branch is behind 'origin/main'\n");
    });
    let post = slack.mock(|when, then| {
        when.method(POST)
            .path("/chat.postMessage")
            .body_includes("\"channel\":\"C1\"")
            .body_includes("got a response: \\n```On branch main\\nYour branch is behind 'origin/main'```");
        then.status(200)
            .json_body(json!({"ok": true, "channel": "C1", "ts": "5.5"}));
    });
    let upload = slack.mock(|when, then| {
        when.method(POST).path("/files.getUploadURLExternal");
        then.status(200).json_body(json!({"ok": false}));
    });

    let correlator = CallbackCorrelator::new(
        slack_client(&slack),
        jenkins_client(&jenkins),
        "dev01",
        Duration::ZERO,
    );
    let (addr, handle) = spawn_callback_listener(correlator)
        .await
        .expect("spawn listener");

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/jobComplete/git_status/4/U1/C1"))
        .send()
        .await
        .expect("callback request");
    assert_eq!(response.status().as_u16(), 200);

    wait_for_calls(&post, 1).await;
    post.assert_calls(1);
    upload.assert_calls(0);
    handle.abort();
}

#[tokio::test]
async fn regression_malformed_callback_is_acknowledged_without_side_effects() {
    let slack = MockServer::start();
    let jenkins = MockServer::start();
    let any_jenkins = jenkins.mock(|when, then| {
        when.method(GET).path("/job/service_deploy/12/consoleText");
        then.status(200).body("Finished: SUCCESS");
    });

    let correlator = CallbackCorrelator::new(
        slack_client(&slack),
        jenkins_client(&jenkins),
        "dev01",
        Duration::ZERO,
    );
    let (addr, handle) = spawn_callback_listener(correlator)
        .await
        .expect("spawn listener");

    for path in ["/jobComplete/service_deploy/12", "/ciComplete/x/1", "/nope"] {
        let response = reqwest::get(format!("http://{addr}{path}"))
            .await
            .expect("callback request");
        assert_eq!(response.status().as_u16(), 200, "{path}");
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    any_jenkins.assert_calls(0);
    handle.abort();
}
