//! Jenkins client used to trigger hub jobs and fetch their artifacts.
//!
//! Jobs are started through `buildWithParameters` with a form-encoded body.
//! Artifacts are read back from the console-text endpoint or from
//! `userContent`. Calls are made once; failures surface to the caller, which
//! logs them.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use hubbot_core::{truncate_for_error, ArtifactFetcher, ArtifactLocation, JobRequest, JobTrigger};

pub const DEFAULT_JENKINS_BASE_URL: &str = "http://automation:8080";

#[derive(Debug, Clone)]
pub struct JenkinsClientConfig {
    pub base_url: String,
    pub user: String,
    pub api_key: String,
    pub request_timeout_ms: u64,
}

#[derive(Clone)]
pub struct JenkinsClient {
    http: reqwest::Client,
    base_url: String,
    user: String,
    api_key: String,
}

impl JenkinsClient {
    pub fn new(config: JenkinsClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("hubbot-jenkins")
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .context("failed to create jenkins http client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            user: config.user.trim().to_string(),
            api_key: config.api_key.trim().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_with_parameters_url(&self, job_name: &str) -> String {
        format!("{}/job/{job_name}/buildWithParameters", self.base_url)
    }

    fn artifact_url(&self, location: &ArtifactLocation) -> String {
        format!("{}{}", self.base_url, location.path())
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.basic_auth(&self.user, Some(&self.api_key))
    }
}

#[async_trait]
impl JobTrigger for JenkinsClient {
    async fn trigger(&self, request: &JobRequest) -> Result<()> {
        let job_name = request.job.job_name();
        let url = self.build_with_parameters_url(job_name);
        let response = self
            .authorize(self.http.post(&url))
            .form(&request.form_fields())
            .send()
            .await
            .with_context(|| format!("jenkins trigger for job '{job_name}' failed"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "jenkins trigger for job '{job_name}' returned status {}: {}",
                status.as_u16(),
                truncate_for_error(&body, 400)
            );
        }
        tracing::debug!(job = job_name, status = status.as_u16(), "jenkins accepted job");
        Ok(())
    }
}

#[async_trait]
impl ArtifactFetcher for JenkinsClient {
    async fn fetch(&self, location: &ArtifactLocation) -> Result<Vec<u8>> {
        let url = self.artifact_url(location);
        let response = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .with_context(|| format!("jenkins artifact fetch {} failed", location.path()))?;
        let status = response.status();
        if !status.is_success() {
            bail!(
                "jenkins artifact fetch {} returned status {}",
                location.path(),
                status.as_u16()
            );
        }
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("failed to read jenkins artifact {}", location.path()))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests;
