use hubbot_core::{
    ArtifactFetcher, ArtifactLocation, ChatEvent, JobRequest, JobTrigger, JobType,
};
use httpmock::prelude::*;

use super::{JenkinsClient, JenkinsClientConfig};

const BASIC_AUTH: &str = "Basic amVua2luczpzZWNyZXQ=";

fn client(base_url: &str) -> JenkinsClient {
    JenkinsClient::new(JenkinsClientConfig {
        base_url: format!("{base_url}/"),
        user: "jenkins".to_string(),
        api_key: "secret".to_string(),
        request_timeout_ms: 2_000,
    })
    .expect("client")
}

fn event() -> ChatEvent {
    ChatEvent::new("U1", "C123", "42.7", "hey <@UBOT> deploy dev01 svc-a")
}

#[tokio::test]
async fn integration_trigger_posts_form_with_basic_auth() {
    let server = MockServer::start();
    let deploy = server.mock(|when, then| {
        when.method(POST)
            .path("/job/service_deploy/buildWithParameters")
            .header("authorization", BASIC_AUTH)
            .header("content-type", "application/x-www-form-urlencoded")
            .body_includes("SLACK_OWNER=U1")
            .body_includes("SLACK_CHAN=C123")
            .body_includes("SLACK_THREAD=42.7")
            .body_includes("SERVICE_NAME=svc-a");
        then.status(201);
    });

    let request = JobRequest::for_service(JobType::Redeploy, &event(), "svc-a");
    client(&server.base_url())
        .trigger(&request)
        .await
        .expect("trigger");
    deploy.assert_calls(1);
}

#[tokio::test]
async fn integration_screenshot_trigger_double_encodes_target_url() {
    let server = MockServer::start();
    let screenshot = server.mock(|when, then| {
        when.method(POST)
            .path("/job/screenshot_image/buildWithParameters")
            .body_includes("TARGET_URL=https%253A%252F%252Fexample.com")
            .body_includes("TARGET_DEVICE=iPad");
        then.status(201);
    });

    let request = JobRequest::screenshot(&event(), "https://example.com", "iPad");
    client(&server.base_url())
        .trigger(&request)
        .await
        .expect("trigger");
    screenshot.assert_calls(1);
}

#[tokio::test]
async fn regression_trigger_surfaces_non_success_status_without_retry() {
    let server = MockServer::start();
    let failing = server.mock(|when, then| {
        when.method(POST).path("/job/git_status/buildWithParameters");
        then.status(503).body("jenkins is restarting");
    });

    let request = JobRequest::for_service(JobType::GitCheck, &event(), "svc-a");
    let error = client(&server.base_url())
        .trigger(&request)
        .await
        .expect_err("503 should fail");
    let message = format!("{error:#}");
    assert!(message.contains("git_status"));
    assert!(message.contains("503"));
    assert!(message.contains("jenkins is restarting"));
    failing.assert_calls(1);
}

#[tokio::test]
async fn integration_fetch_reads_console_text_and_screenshots() {
    let server = MockServer::start();
    let console = server.mock(|when, then| {
        when.method(GET)
            .path("/job/service_deploy/9/consoleText")
            .header("authorization", BASIC_AUTH);
        then.status(200).body("Started\nFinished: SUCCESS\n");
    });
    let image = server.mock(|when, then| {
        when.method(GET).path("/userContent/screenshot_7.png");
        then.status(200).body(vec![0x89, b'P', b'N', b'G']);
    });

    let jenkins = client(&server.base_url());
    let log = jenkins
        .fetch(&ArtifactLocation::for_job("service_deploy", "9"))
        .await
        .expect("console text");
    assert_eq!(String::from_utf8(log).expect("utf8"), "Started\nFinished: SUCCESS\n");

    let png = jenkins
        .fetch(&ArtifactLocation::for_job("screenshot_image", "7"))
        .await
        .expect("screenshot");
    assert_eq!(png, vec![0x89, b'P', b'N', b'G']);
    console.assert_calls(1);
    image.assert_calls(1);
}

#[tokio::test]
async fn regression_fetch_missing_artifact_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/job/security_status/1/consoleText");
        then.status(404);
    });

    let error = client(&server.base_url())
        .fetch(&ArtifactLocation::for_job("security_status", "1"))
        .await
        .expect_err("404 should fail");
    assert!(error.to_string().contains("404"));
}
