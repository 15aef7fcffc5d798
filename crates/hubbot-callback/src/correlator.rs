//! Turns a parsed completion callback into chat uploads, reactions and replies.

use std::sync::Arc;
use std::time::Duration;

use hubbot_core::{
    environment_banner, ArtifactFetcher, CallbackCommand, ChatClient, FileUpload, JobCallback,
    JobKind,
};

/// Console text marker Jenkins prints for a passing build.
pub const JOB_SUCCESS_MARKER: &str = "Finished: SUCCESS";
pub const SUCCESS_REACTION: &str = "thumbsup";
pub const FAILURE_REACTION: &str = "thumbsdown";
const BRANCH_MARKER: &str = "branch";
const NO_BRANCH_LINES: &str = "(no branch lines found)";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Terminal state of one callback. Failures are already logged when returned.
pub enum CallbackOutcome {
    Ignored,
    Uploaded {
        file_id: String,
        reaction: Option<&'static str>,
    },
    StatusPosted {
        ts: String,
    },
    ArtifactUnavailable,
    UploadFailed,
    PostFailed,
}

#[derive(Clone)]
pub struct CallbackCorrelator {
    chat: Arc<dyn ChatClient>,
    artifacts: Arc<dyn ArtifactFetcher>,
    banner: String,
    delay: Duration,
}

impl CallbackCorrelator {
    pub fn new(
        chat: Arc<dyn ChatClient>,
        artifacts: Arc<dyn ArtifactFetcher>,
        hub_environment: &str,
        delay: Duration,
    ) -> Self {
        Self {
            chat,
            artifacts,
            banner: environment_banner(hub_environment),
            delay,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Processes `callback` on a detached task once the configured delay elapses.
    pub fn schedule(&self, callback: JobCallback) -> tokio::task::JoinHandle<CallbackOutcome> {
        let correlator = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(correlator.delay).await;
            correlator.process(&callback).await
        })
    }

    pub async fn process(&self, callback: &JobCallback) -> CallbackOutcome {
        if callback.command != CallbackCommand::JobComplete {
            tracing::debug!(
                command = callback.command.as_str(),
                job = %callback.job_name,
                "callback command has no chat side effect"
            );
            return CallbackOutcome::Ignored;
        }

        let kind = callback.kind();
        tracing::info!(
            job = %callback.job_name,
            build = %callback.build_number,
            kind = kind.as_str(),
            channel = %callback.channel_id,
            "processing job completion"
        );
        match kind {
            JobKind::LogJob | JobKind::ImageJob => self.upload_artifact(callback, kind).await,
            JobKind::StatusJob => self.post_status_lines(callback).await,
        }
    }

    async fn fetch_artifact(&self, callback: &JobCallback) -> Option<Vec<u8>> {
        let location = callback.artifact_location();
        match self.artifacts.fetch(&location).await {
            Ok(bytes) => Some(bytes),
            Err(error) => {
                tracing::warn!(
                    job = %callback.job_name,
                    build = %callback.build_number,
                    path = %location.path(),
                    error = %format!("{error:#}"),
                    "failed to fetch job artifact"
                );
                None
            }
        }
    }

    async fn upload_artifact(&self, callback: &JobCallback, kind: JobKind) -> CallbackOutcome {
        let Some(bytes) = self.fetch_artifact(callback).await else {
            return CallbackOutcome::ArtifactUnavailable;
        };

        let upload = FileUpload {
            channel: callback.channel_id.clone(),
            thread_ts: callback.thread_ts.clone(),
            filename: artifact_filename(callback, kind),
            bytes,
            initial_comment: Some(format!(
                "{}Hey <@{}> - {} build {} finished!",
                self.banner, callback.owner_user_id, callback.job_name, callback.build_number
            )),
        };
        let uploaded = match self.chat.upload_file(upload).await {
            Ok(uploaded) => uploaded,
            Err(error) => {
                tracing::warn!(
                    job = %callback.job_name,
                    build = %callback.build_number,
                    channel = %callback.channel_id,
                    error = %format!("{error:#}"),
                    "failed to upload job artifact"
                );
                return CallbackOutcome::UploadFailed;
            }
        };

        let reaction = if kind == JobKind::LogJob {
            self.react_to_log(callback, &uploaded.file_id).await
        } else {
            None
        };
        CallbackOutcome::Uploaded {
            file_id: uploaded.file_id,
            reaction,
        }
    }

    /// Re-reads the console text so the verdict reflects the finished log.
    async fn react_to_log(&self, callback: &JobCallback, file_id: &str) -> Option<&'static str> {
        let console_text = self.fetch_artifact(callback).await?;
        let reaction = if String::from_utf8_lossy(&console_text).contains(JOB_SUCCESS_MARKER) {
            SUCCESS_REACTION
        } else {
            FAILURE_REACTION
        };
        match self
            .chat
            .add_reaction(&callback.channel_id, file_id, reaction)
            .await
        {
            Ok(()) => Some(reaction),
            Err(error) => {
                tracing::warn!(
                    job = %callback.job_name,
                    file_id,
                    reaction,
                    error = %format!("{error:#}"),
                    "failed to add build verdict reaction"
                );
                None
            }
        }
    }

    async fn post_status_lines(&self, callback: &JobCallback) -> CallbackOutcome {
        let Some(bytes) = self.fetch_artifact(callback).await else {
            return CallbackOutcome::ArtifactUnavailable;
        };
        let console_text = String::from_utf8_lossy(&bytes);
        let lines = extract_branch_lines(&console_text);
        let block = if lines.is_empty() {
            NO_BRANCH_LINES.to_string()
        } else {
            lines.join("\n")
        };
        let text = format!(
            "{}Hey <@{}> - got a response: \n```{block}```",
            self.banner, callback.owner_user_id
        );
        match self
            .chat
            .send_message(&callback.channel_id, &text, callback.thread_ts.as_deref())
            .await
        {
            Ok(posted) => CallbackOutcome::StatusPosted { ts: posted.ts },
            Err(error) => {
                tracing::warn!(
                    job = %callback.job_name,
                    channel = %callback.channel_id,
                    error = %format!("{error:#}"),
                    "failed to post status lines"
                );
                CallbackOutcome::PostFailed
            }
        }
    }
}

fn artifact_filename(callback: &JobCallback, kind: JobKind) -> String {
    match kind {
        JobKind::ImageJob => format!("{}_{}.png", callback.job_name, callback.build_number),
        JobKind::LogJob | JobKind::StatusJob => {
            format!("{}_{}_log.txt", callback.job_name, callback.build_number)
        }
    }
}

/// Every console line that mentions a branch, in order, without line endings.
pub fn extract_branch_lines(console_text: &str) -> Vec<&str> {
    console_text
        .lines()
        .filter(|line| line.contains(BRANCH_MARKER))
        .collect()
}
