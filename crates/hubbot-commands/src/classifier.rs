//! Turns an addressed chat message into a typed [`Command`].
//!
//! A message counts as addressed to the bot only when it opens with an
//! attention term followed directly by the bot mention. Everything after
//! that maps positionally: verb, target environment, then arguments.

use hubbot_core::{bot_mention, ChatEvent};

use crate::tokenizer::tokenize;

pub const DEFAULT_ATTENTION_TERMS: [&str; 6] = ["hello", "yo", "pls", "hey", "please", "bitte"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Help,
    Redeploy,
    Status,
    Sorry,
    Who,
    CheckGit,
    CheckSecurity,
    Screenshot,
}

impl CommandKind {
    /// Maps a verb token. Unknown verbs fall back to [`CommandKind::Sorry`].
    pub fn from_verb(verb: Option<&str>) -> Self {
        match verb {
            Some("help") => Self::Help,
            Some("status") => Self::Status,
            Some("deploy") | Some("redeploy") => Self::Redeploy,
            Some("who") => Self::Who,
            Some("check-git") => Self::CheckGit,
            Some("screenshot") => Self::Screenshot,
            Some("check-security") => Self::CheckSecurity,
            _ => Self::Sorry,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Redeploy => "redeploy",
            Self::Status => "status",
            Self::Sorry => "sorry",
            Self::Who => "who",
            Self::CheckGit => "check-git",
            Self::CheckSecurity => "check-security",
            Self::Screenshot => "screenshot",
        }
    }

    /// Help and who are answered whatever environment the message names.
    pub fn is_environment_agnostic(self) -> bool {
        matches!(self, Self::Help | Self::Who)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub target_environment: Option<String>,
    pub arguments: Vec<String>,
    pub source_event: ChatEvent,
}

impl Command {
    pub fn target_environment(&self) -> &str {
        self.target_environment.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandClassifier {
    bot_user_id: String,
    attention_terms: Vec<String>,
}

impl CommandClassifier {
    pub fn new(bot_user_id: impl Into<String>, attention_terms: Vec<String>) -> Self {
        Self {
            bot_user_id: bot_user_id.into(),
            attention_terms,
        }
    }

    pub fn with_default_terms(bot_user_id: impl Into<String>) -> Self {
        Self::new(
            bot_user_id,
            DEFAULT_ATTENTION_TERMS
                .iter()
                .map(|term| term.to_string())
                .collect(),
        )
    }

    pub fn bot_user_id(&self) -> &str {
        &self.bot_user_id
    }

    /// Returns `None` for ordinary chatter that is not addressed to the bot.
    pub fn classify(&self, event: &ChatEvent) -> Option<Command> {
        let mut tokens = tokenize(&event.text).into_iter();
        let attention_term = tokens.next()?;
        let mention = tokens.next()?;
        if !self.attention_terms.iter().any(|term| *term == attention_term)
            || mention != bot_mention(&self.bot_user_id)
        {
            return None;
        }

        let verb = tokens.next();
        let target_environment = tokens.next();
        Some(Command {
            kind: CommandKind::from_verb(verb.as_deref()),
            target_environment,
            arguments: tokens.collect(),
            source_event: event.clone(),
        })
    }
}
