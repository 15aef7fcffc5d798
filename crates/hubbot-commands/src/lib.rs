//! Chat command pipeline for the hub bot.
//!
//! Raw message text flows through [`tokenize`], [`CommandClassifier`], the
//! environment gate, and [`Dispatcher`]. [`CommandRouter`] ties the stages
//! together and fires the resulting Jenkins job without awaiting it.
//!
//! ```rust
//! use hubbot_commands::{CommandClassifier, CommandKind};
//! use hubbot_core::ChatEvent;
//!
//! let classifier = CommandClassifier::with_default_terms("UBOT");
//! let event = ChatEvent::new("U1", "C1", "1.1", "hey <@UBOT> deploy dev01 billing");
//! let command = classifier.classify(&event).expect("addressed to the bot");
//! assert_eq!(command.kind, CommandKind::Redeploy);
//! assert_eq!(command.arguments, vec!["billing"]);
//! ```

pub mod classifier;
pub mod dispatcher;
pub mod environment_gate;
pub mod router;
pub mod tokenizer;

pub use classifier::{Command, CommandClassifier, CommandKind, DEFAULT_ATTENTION_TERMS};
pub use dispatcher::{DispatchResult, Dispatcher, HELP_TEXT};
pub use environment_gate::{evaluate_environment_gate, is_addressed_to_me, GateDecision};
pub use router::CommandRouter;
pub use tokenizer::tokenize;
