//! Foundational types shared across hubbot crates.
//!
//! Holds the chat event model, the environment registry that scopes each
//! running instance, the Jenkins job/callback model, and the collaborator
//! traits through which the command router and callback correlator reach
//! Slack and Jenkins.

pub mod chat_event;
pub mod collaborators;
pub mod environment;
pub mod jobs;
pub mod text_utils;

pub use chat_event::{bot_mention, ChatEvent};
pub use collaborators::{
    ArtifactFetcher, ChatClient, FileUpload, JobTrigger, PostedMessage, UploadedFile,
};
pub use environment::{
    environment_banner, EnvironmentRegistry, DEFAULT_ENVIRONMENT, DEFAULT_KNOWN_ENVIRONMENTS,
};
pub use jobs::{ArtifactLocation, CallbackCommand, JobCallback, JobKind, JobRequest, JobType};
pub use text_utils::truncate_for_error;
