use hubbot_core::{CallbackCommand, JobCallback};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackPathError {
    #[error("callback path '{path}' is missing required segment '{segment}'")]
    MissingSegment {
        path: String,
        segment: &'static str,
    },
}

/// Decodes a callback request path into a [`JobCallback`].
///
/// Returns `Ok(None)` for paths whose first segment is not a known callback
/// command. `jobComplete` needs job, build, owner and channel; `ciComplete`
/// accepts whatever segments are present.
pub fn parse_callback_path(path: &str) -> Result<Option<JobCallback>, CallbackPathError> {
    let path_only = path.split(['?', '#']).next().unwrap_or_default();
    let mut segments = path_only.strip_prefix('/').unwrap_or(path_only).split('/');

    let Some(command) = segments.next().and_then(CallbackCommand::parse) else {
        return Ok(None);
    };

    let mut next_segment = || segments.next().unwrap_or_default().trim().to_string();
    let job_name = next_segment();
    let build_number = next_segment();
    let owner_user_id = next_segment();
    let channel_id = next_segment();
    let thread_ts = Some(next_segment()).filter(|value| !value.is_empty());

    if command == CallbackCommand::JobComplete {
        let required = [
            ("jobName", &job_name),
            ("buildNumber", &build_number),
            ("owner", &owner_user_id),
            ("channel", &channel_id),
        ];
        if let Some((segment, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(CallbackPathError::MissingSegment {
                path: path.to_string(),
                segment: *segment,
            });
        }
    }

    Ok(Some(JobCallback {
        command,
        job_name,
        build_number,
        owner_user_id,
        channel_id,
        thread_ts,
    }))
}
