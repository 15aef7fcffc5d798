use std::time::Duration;

/// Upper bound on backoff doubling; later attempts reuse the last step.
const MAX_BACKOFF_DOUBLINGS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How often and how patiently a Slack Web API call is repeated.
pub(crate) struct SlackRetryPolicy {
    max_attempts: usize,
    base_delay: Duration,
}

impl SlackRetryPolicy {
    pub(crate) fn new(max_attempts: usize, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(base_delay_ms.max(1)),
        }
    }

    /// `attempt` is 1-based and counts the call that just failed.
    pub(crate) fn has_attempts_left(&self, attempt: usize) -> bool {
        attempt < self.max_attempts
    }

    /// Slack's `Retry-After` wins; otherwise double the base delay per attempt.
    pub(crate) fn backoff(&self, attempt: usize, retry_after: Option<Duration>) -> Duration {
        retry_after.unwrap_or_else(|| {
            let doublings = (attempt.saturating_sub(1) as u32).min(MAX_BACKOFF_DOUBLINGS);
            self.base_delay.saturating_mul(1 << doublings)
        })
    }
}

/// Seconds form only; Slack does not send HTTP-date values here.
pub(crate) fn retry_after_header(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    let raw = headers.get(reqwest::header::RETRY_AFTER)?.to_str().ok()?;
    raw.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Rate limits and server-side failures.
pub(crate) fn is_transient_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

pub(crate) fn is_transient_transport_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}
