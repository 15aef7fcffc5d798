//! Decides whether this hub instance should act on a command.
//!
//! Each deployed hub is bound to one environment. Commands naming another
//! environment are left for the sibling instance that owns it.

use hubbot_core::EnvironmentRegistry;

use crate::classifier::Command;

pub(crate) const NOGOOD_TEXT: &str = "Something went wrong :( \n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    /// The named environment does not exist; reply with the known list.
    UnknownEnvironment(String),
    /// Addressed to a sibling instance; stay silent.
    NotForThisInstance,
}

/// True when this instance owns the command's target, or the command is
/// one every instance answers.
pub fn is_addressed_to_me(command: &Command, registry: &EnvironmentRegistry) -> bool {
    command.kind.is_environment_agnostic() || registry.is_hub(command.target_environment())
}

pub fn evaluate_environment_gate(command: &Command, registry: &EnvironmentRegistry) -> GateDecision {
    let target = command.target_environment();
    if !registry.is_known(target) && !command.kind.is_environment_agnostic() {
        return GateDecision::UnknownEnvironment(target.to_string());
    }
    if !is_addressed_to_me(command, registry) {
        return GateDecision::NotForThisInstance;
    }
    GateDecision::Proceed
}

pub(crate) fn render_unknown_environment(
    registry: &EnvironmentRegistry,
    environment: &str,
) -> String {
    format!(
        "{}{NOGOOD_TEXT}I don't know about the environment '{environment}'. I only know about: {}.",
        registry.banner(),
        registry.known_list()
    )
}
