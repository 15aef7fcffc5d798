//! Deployment environment registry shared by every running hub instance.
//!
//! Several hub processes, one per environment, usually listen on the same
//! channel. The registry tells an instance which environment it speaks for
//! and which one answers broadcast-style requests (help and fallback text).

pub const DEFAULT_KNOWN_ENVIRONMENTS: [&str; 5] = ["arrondev", "dev01", "dev02", "test", "prod"];
pub const DEFAULT_ENVIRONMENT: &str = "arrondev";

/// Fixed prefix stamped on every message this instance posts.
pub fn environment_banner(hub_environment: &str) -> String {
    format!("*[{hub_environment}]* ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentRegistry {
    known: Vec<String>,
    hub_environment: String,
    default_environment: String,
}

impl EnvironmentRegistry {
    pub fn new(
        known: Vec<String>,
        hub_environment: impl Into<String>,
        default_environment: impl Into<String>,
    ) -> Self {
        let mut deduped: Vec<String> = Vec::with_capacity(known.len());
        for name in known {
            let name = name.trim().to_string();
            if !name.is_empty() && !deduped.contains(&name) {
                deduped.push(name);
            }
        }
        Self {
            known: deduped,
            hub_environment: hub_environment.into().trim().to_string(),
            default_environment: default_environment.into().trim().to_string(),
        }
    }

    pub fn with_defaults(hub_environment: impl Into<String>) -> Self {
        Self::new(
            DEFAULT_KNOWN_ENVIRONMENTS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            hub_environment,
            DEFAULT_ENVIRONMENT,
        )
    }

    pub fn known(&self) -> &[String] {
        &self.known
    }

    pub fn hub_environment(&self) -> &str {
        &self.hub_environment
    }

    pub fn default_environment(&self) -> &str {
        &self.default_environment
    }

    pub fn is_known(&self, environment: &str) -> bool {
        self.known.iter().any(|name| name == environment)
    }

    pub fn is_hub(&self, environment: &str) -> bool {
        self.hub_environment == environment
    }

    /// True when this instance is the one that emits help and fallback text.
    pub fn hub_is_default(&self) -> bool {
        self.hub_environment == self.default_environment
    }

    /// Known environments in declaration order, joined for display.
    pub fn known_list(&self) -> String {
        self.known.join(", ")
    }

    pub fn banner(&self) -> String {
        environment_banner(&self.hub_environment)
    }
}
