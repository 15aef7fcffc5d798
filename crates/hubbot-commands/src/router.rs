//! Chat event entry point: filter, classify, gate, dispatch, then fire.

use std::sync::Arc;

use hubbot_core::{ChatEvent, EnvironmentRegistry, JobRequest, JobTrigger};

use crate::classifier::CommandClassifier;
use crate::dispatcher::{DispatchResult, Dispatcher};

#[derive(Clone)]
pub struct CommandRouter {
    classifier: CommandClassifier,
    dispatcher: Dispatcher,
    trigger: Arc<dyn JobTrigger>,
}

impl CommandRouter {
    pub fn new(
        classifier: CommandClassifier,
        registry: EnvironmentRegistry,
        trigger: Arc<dyn JobTrigger>,
    ) -> Self {
        Self {
            classifier,
            dispatcher: Dispatcher::new(registry),
            trigger,
        }
    }

    pub fn bot_user_id(&self) -> &str {
        self.classifier.bot_user_id()
    }

    /// Resolves the reply and pending job for `event` without side effects.
    pub fn route(&self, event: &ChatEvent) -> DispatchResult {
        if event.subtype.is_some() || event.is_from(self.bot_user_id()) {
            return DispatchResult::default();
        }
        if !event.mentions(self.bot_user_id()) {
            return DispatchResult::default();
        }
        let Some(command) = self.classifier.classify(event) else {
            tracing::debug!(
                channel = %event.channel_id,
                user = %event.user_id,
                "bot mentioned in chat but not summoned"
            );
            return DispatchResult::default();
        };
        tracing::info!(
            channel = %event.channel_id,
            user = %event.user_id,
            command = command.kind.as_str(),
            environment = command.target_environment(),
            "routing chat command"
        );
        self.dispatcher.dispatch(&command)
    }

    /// Routes `event` and fires any resulting job without waiting on it.
    /// Returns the text to post back, if any.
    pub fn handle_event(&self, event: &ChatEvent) -> Option<String> {
        let DispatchResult { response_text, job } = self.route(event);
        if let Some(job) = job {
            self.fire(job);
        }
        response_text
    }

    fn fire(&self, job: JobRequest) {
        let trigger = Arc::clone(&self.trigger);
        tokio::spawn(async move {
            let job_name = job.job.job_name();
            match trigger.trigger(&job).await {
                Ok(()) => tracing::info!(
                    job = job_name,
                    owner = %job.owner_user_id,
                    channel = %job.channel_id,
                    "job trigger issued"
                ),
                Err(error) => tracing::warn!(
                    job = job_name,
                    owner = %job.owner_user_id,
                    channel = %job.channel_id,
                    error = %format!("{error:#}"),
                    "job trigger failed"
                ),
            }
        });
    }
}
