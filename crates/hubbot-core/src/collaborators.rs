//! Seams between routing logic and the outside world.
//!
//! The Slack and Jenkins clients implement these traits at process start and
//! are handed to the router and correlator as `Arc<dyn ...>`, so both can be
//! exercised against in-memory doubles.

use anyhow::Result;
use async_trait::async_trait;

use crate::jobs::{ArtifactLocation, JobRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel: String,
    pub ts: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// File attachment destined for a single channel.
pub struct FileUpload {
    pub channel: String,
    pub thread_ts: Option<String>,
    pub filename: String,
    pub bytes: Vec<u8>,
    pub initial_comment: Option<String>,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<PostedMessage>;

    async fn upload_file(&self, upload: FileUpload) -> Result<UploadedFile>;

    async fn add_reaction(&self, channel: &str, file_id: &str, reaction: &str) -> Result<()>;
}

#[async_trait]
/// Starts a remote job. Completion arrives later through the callback listener.
pub trait JobTrigger: Send + Sync {
    async fn trigger(&self, request: &JobRequest) -> Result<()>;
}

#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn fetch(&self, location: &ArtifactLocation) -> Result<Vec<u8>>;
}
