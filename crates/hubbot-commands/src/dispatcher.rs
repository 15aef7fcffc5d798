//! Executes validated commands and renders their chat replies.
//!
//! Dispatch is pure: it returns the reply text together with the job request
//! (if any) that the caller must fire. Nothing here performs I/O.

use hubbot_core::{EnvironmentRegistry, JobRequest, JobType};

use crate::classifier::{Command, CommandKind};
use crate::environment_gate::{
    evaluate_environment_gate, render_unknown_environment, GateDecision,
};

pub const HELP_TEXT: &str = "Usage: hey <@mention> {help|status|who|deploy|screenshot|check-git|check-security} [environment] [args...]";
pub const SORRY_TEXT: &str = "I didn't understand the command :( \n";
pub const REDEPLOY_USAGE: &str = "Usage: deploy <environment name> <service name>";
pub const CHECK_GIT_USAGE: &str = "Usage: check-git <environment name> <service name>";
pub const CHECK_SECURITY_USAGE: &str = "Usage: check-security <environment name> <service name>";
pub const SCREENSHOT_USAGE: &str =
    "Usage: screenshot <environment name> <url> [device emulation string]";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DispatchResult {
    /// `None` means post nothing.
    pub response_text: Option<String>,
    pub job: Option<JobRequest>,
}

impl DispatchResult {
    fn silent() -> Self {
        Self::default()
    }

    fn reply(text: String) -> Self {
        Self {
            response_text: Some(text),
            job: None,
        }
    }

    fn reply_and_trigger(text: String, job: JobRequest) -> Self {
        Self {
            response_text: Some(text),
            job: Some(job),
        }
    }

    pub fn side_effect_triggered(&self) -> bool {
        self.job.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: EnvironmentRegistry,
}

impl Dispatcher {
    pub fn new(registry: EnvironmentRegistry) -> Self {
        Self { registry }
    }

    /// Never fails: malformed commands become usage text, addressing
    /// mismatches become silence.
    pub fn dispatch(&self, command: &Command) -> DispatchResult {
        match evaluate_environment_gate(command, &self.registry) {
            GateDecision::UnknownEnvironment(environment) => {
                return DispatchResult::reply(render_unknown_environment(
                    &self.registry,
                    &environment,
                ));
            }
            GateDecision::NotForThisInstance => {
                tracing::debug!(
                    environment = command.target_environment(),
                    command = command.kind.as_str(),
                    "ignoring message intended for another environment"
                );
                return DispatchResult::silent();
            }
            GateDecision::Proceed => {}
        }

        self.dispatch_validated(command)
    }

    fn dispatch_validated(&self, command: &Command) -> DispatchResult {
        let banner = self.registry.banner();
        let user = &command.source_event.user_id;
        let args = &command.arguments;

        match command.kind {
            CommandKind::Help => {
                if !self.registry.hub_is_default() {
                    return DispatchResult::silent();
                }
                DispatchResult::reply(format!("{banner}{HELP_TEXT}"))
            }
            CommandKind::Sorry => {
                if !self.registry.hub_is_default() {
                    return DispatchResult::silent();
                }
                DispatchResult::reply(format!("{banner}{SORRY_TEXT}{HELP_TEXT}"))
            }
            CommandKind::Status => DispatchResult::reply(format!(
                "{banner}Thanks for asking, <@{user}>.\nRight now, everything seems good!"
            )),
            CommandKind::Who => DispatchResult::reply(format!("{banner}I am attached!")),
            CommandKind::Redeploy => match single_service(args) {
                Some(service) => DispatchResult::reply_and_trigger(
                    format!(
                        "{banner}Rebuild and redeploy will be issued for service *{service}* shortly <@{user}>."
                    ),
                    JobRequest::for_service(JobType::Redeploy, &command.source_event, service),
                ),
                None => usage_reply(&banner, REDEPLOY_USAGE),
            },
            CommandKind::CheckGit => match single_service(args) {
                Some(service) => DispatchResult::reply_and_trigger(
                    format!(
                        "{banner}Issuing `git-fetch && git-status` for service *{service}*..."
                    ),
                    JobRequest::for_service(JobType::GitCheck, &command.source_event, service),
                ),
                None => usage_reply(&banner, CHECK_GIT_USAGE),
            },
            CommandKind::CheckSecurity => match single_service(args) {
                Some(service) => DispatchResult::reply_and_trigger(
                    format!(
                        "{banner}Running `apt-get upgrade -s | grep -i security` on container for service *{service}*..."
                    ),
                    JobRequest::for_service(
                        JobType::SecurityCheck,
                        &command.source_event,
                        service,
                    ),
                ),
                None => usage_reply(&banner, CHECK_SECURITY_USAGE),
            },
            CommandKind::Screenshot => {
                let Some(screenshot_url) = args.first() else {
                    return usage_reply(&banner, SCREENSHOT_USAGE);
                };
                let device = args.get(1).map(String::as_str).unwrap_or_default();
                DispatchResult::reply_and_trigger(
                    format!("{banner}Screenshot for url *{screenshot_url}* has been requested."),
                    JobRequest::screenshot(
                        &command.source_event,
                        strip_link_delimiters(screenshot_url),
                        device,
                    ),
                )
            }
        }
    }
}

fn usage_reply(banner: &str, usage: &str) -> DispatchResult {
    DispatchResult::reply(format!("{banner}{SORRY_TEXT}{usage}"))
}

/// `None` when the argument count is wrong, which renders usage text.
/// The service name itself is forwarded to Jenkins as given.
fn single_service(args: &[String]) -> Option<&str> {
    match args {
        [service] => Some(service.as_str()),
        _ => None,
    }
}

/// Slack wraps links as `<https://...>`; drop exactly one character from each end.
/// Inputs of two characters or fewer strip to an empty url, which is still sent.
pub fn strip_link_delimiters(raw: &str) -> &str {
    let mut chars = raw.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}
