//! Jenkins job model: outbound trigger requests and inbound completion callbacks.
//!
//! Correlation between a triggered job and its completion notice is carried
//! entirely by the job parameters (`SLACK_OWNER`, `SLACK_CHAN`,
//! `SLACK_THREAD`) that Jenkins echoes back in the callback path. No
//! in-process record of pending jobs exists.

use crate::chat_event::ChatEvent;

const IMAGE_JOB_MARKER: &str = "_image";
const STATUS_JOB_MARKER: &str = "_status";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Remote jobs the hub knows how to trigger.
pub enum JobType {
    Redeploy,
    Screenshot,
    GitCheck,
    SecurityCheck,
}

impl JobType {
    /// Jenkins job name backing this trigger.
    pub fn job_name(self) -> &'static str {
        match self {
            Self::Redeploy => "service_deploy",
            Self::Screenshot => "screenshot_image",
            Self::GitCheck => "git_status",
            Self::SecurityCheck => "security_status",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub job: JobType,
    pub owner_user_id: String,
    pub channel_id: String,
    pub thread_ts: Option<String>,
    pub parameters: Vec<(String, String)>,
}

impl JobRequest {
    /// Builds a request for a job that operates on a single named service.
    pub fn for_service(job: JobType, event: &ChatEvent, service_name: &str) -> Self {
        Self::from_event(
            job,
            event,
            vec![("SERVICE_NAME".to_string(), service_name.to_string())],
        )
    }

    /// Builds a screenshot request. Url and device are percent-encoded here,
    /// before the form body applies its own encoding.
    pub fn screenshot(event: &ChatEvent, target_url: &str, target_device: &str) -> Self {
        Self::from_event(
            JobType::Screenshot,
            event,
            vec![
                (
                    "TARGET_URL".to_string(),
                    urlencoding::encode(target_url).into_owned(),
                ),
                (
                    "TARGET_DEVICE".to_string(),
                    urlencoding::encode(target_device).into_owned(),
                ),
            ],
        )
    }

    fn from_event(job: JobType, event: &ChatEvent, parameters: Vec<(String, String)>) -> Self {
        Self {
            job,
            owner_user_id: event.user_id.clone(),
            channel_id: event.channel_id.clone(),
            thread_ts: Some(event.reply_thread_ts().to_string()),
            parameters,
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Form fields posted to `buildWithParameters`, correlation fields first.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("SLACK_OWNER".to_string(), self.owner_user_id.clone()),
            ("SLACK_CHAN".to_string(), self.channel_id.clone()),
        ];
        if let Some(thread_ts) = self.thread_ts.as_deref().filter(|ts| !ts.is_empty()) {
            fields.push(("SLACK_THREAD".to_string(), thread_ts.to_string()));
        }
        fields.extend(self.parameters.iter().cloned());
        fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackCommand {
    JobComplete,
    CiComplete,
}

impl CallbackCommand {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "jobComplete" => Some(Self::JobComplete),
            "ciComplete" => Some(Self::CiComplete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::JobComplete => "jobComplete",
            Self::CiComplete => "ciComplete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Completion notice decoded from a callback path.
pub struct JobCallback {
    pub command: CallbackCommand,
    pub job_name: String,
    pub build_number: String,
    pub owner_user_id: String,
    pub channel_id: String,
    pub thread_ts: Option<String>,
}

impl JobCallback {
    pub fn kind(&self) -> JobKind {
        JobKind::classify(&self.job_name)
    }

    pub fn artifact_location(&self) -> ArtifactLocation {
        ArtifactLocation::for_job(&self.job_name, &self.build_number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// What a finished job produced, inferred from its name.
pub enum JobKind {
    /// Console log, uploaded as a file and tagged with a pass/fail reaction.
    LogJob,
    /// Screenshot published to Jenkins `userContent`.
    ImageJob,
    /// Console output grepped for branch lines and posted inline.
    StatusJob,
}

impl JobKind {
    /// Image marker wins over status marker; anything else is a log job.
    pub fn classify(job_name: &str) -> Self {
        if job_name.contains(IMAGE_JOB_MARKER) {
            Self::ImageJob
        } else if job_name.contains(STATUS_JOB_MARKER) {
            Self::StatusJob
        } else {
            Self::LogJob
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LogJob => "log",
            Self::ImageJob => "image",
            Self::StatusJob => "status",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocation {
    ConsoleText {
        job_name: String,
        build_number: String,
    },
    Screenshot {
        build_number: String,
    },
}

impl ArtifactLocation {
    /// Log and status jobs read console text; only image jobs read `userContent`.
    pub fn for_job(job_name: &str, build_number: &str) -> Self {
        match JobKind::classify(job_name) {
            JobKind::ImageJob => Self::Screenshot {
                build_number: build_number.to_string(),
            },
            JobKind::LogJob | JobKind::StatusJob => Self::ConsoleText {
                job_name: job_name.to_string(),
                build_number: build_number.to_string(),
            },
        }
    }

    /// Path relative to the Jenkins base url.
    pub fn path(&self) -> String {
        match self {
            Self::ConsoleText {
                job_name,
                build_number,
            } => format!("/job/{job_name}/{build_number}/consoleText"),
            Self::Screenshot { build_number } => {
                format!("/userContent/screenshot_{build_number}.png")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ArtifactLocation, CallbackCommand, JobKind, JobRequest, JobType};
    use crate::ChatEvent;

    fn event() -> ChatEvent {
        ChatEvent::new("U1", "C1", "17.5", "hey")
    }

    #[test]
    fn unit_job_kind_classification_is_total_with_image_precedence() {
        assert_eq!(JobKind::classify("screenshot_image"), JobKind::ImageJob);
        assert_eq!(JobKind::classify("security_status"), JobKind::StatusJob);
        assert_eq!(JobKind::classify("git_status"), JobKind::StatusJob);
        assert_eq!(JobKind::classify("service_deploy"), JobKind::LogJob);
        assert_eq!(JobKind::classify(""), JobKind::LogJob);
        assert_eq!(JobKind::classify("odd_status_image"), JobKind::ImageJob);
        assert_eq!(JobKind::classify("odd_image_status"), JobKind::ImageJob);
    }

    #[test]
    fn unit_artifact_location_uses_console_text_for_log_and_status_jobs() {
        assert_eq!(
            ArtifactLocation::for_job("service_deploy", "3").path(),
            "/job/service_deploy/3/consoleText"
        );
        assert_eq!(
            ArtifactLocation::for_job("security_status", "42").path(),
            "/job/security_status/42/consoleText"
        );
        assert_eq!(
            ArtifactLocation::for_job("screenshot_image", "7").path(),
            "/userContent/screenshot_7.png"
        );
    }

    #[test]
    fn unit_service_request_form_fields_carry_correlation_and_service() {
        let request = JobRequest::for_service(JobType::Redeploy, &event(), "svc-a");
        assert_eq!(request.job.job_name(), "service_deploy");
        assert_eq!(
            request.form_fields(),
            vec![
                ("SLACK_OWNER".to_string(), "U1".to_string()),
                ("SLACK_CHAN".to_string(), "C1".to_string()),
                ("SLACK_THREAD".to_string(), "17.5".to_string()),
                ("SERVICE_NAME".to_string(), "svc-a".to_string()),
            ]
        );
    }

    #[test]
    fn unit_screenshot_request_percent_encodes_url_and_device() {
        let request = JobRequest::screenshot(&event(), "https://a.b/c?d=1 2", "iPhone X");
        assert_eq!(
            request.parameter("TARGET_URL"),
            Some("https%3A%2F%2Fa.b%2Fc%3Fd%3D1%202")
        );
        assert_eq!(request.parameter("TARGET_DEVICE"), Some("iPhone%20X"));
        assert_eq!(request.parameter("SERVICE_NAME"), None);
    }

    #[test]
    fn unit_callback_command_parse_is_case_sensitive() {
        assert_eq!(
            CallbackCommand::parse("jobComplete"),
            Some(CallbackCommand::JobComplete)
        );
        assert_eq!(
            CallbackCommand::parse("ciComplete"),
            Some(CallbackCommand::CiComplete)
        );
        assert_eq!(CallbackCommand::parse("jobcomplete"), None);
    }
}
