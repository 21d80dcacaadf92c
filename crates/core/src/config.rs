// Engine Configuration
// Environment-driven with defaults for every value.

const ENV_ENGINE_NAME: &str = "STACKRPC_ENGINE_NAME";
const ENV_LOG_PAYLOADS: &str = "STACKRPC_LOG_PAYLOADS";

pub const DEFAULT_ENGINE_NAME: &str = "stackrpc";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Label recorded on every request span
    pub name: String,
    /// Include params and results in debug events
    pub log_payloads: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_ENGINE_NAME.to_string(),
            log_payloads: false,
        }
    }
}

impl EngineConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Load from `STACKRPC_ENGINE_NAME` / `STACKRPC_LOG_PAYLOADS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let name = lookup(ENV_ENGINE_NAME)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.name);

        let log_payloads = lookup(ENV_LOG_PAYLOADS)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.log_payloads);

        Self { name, log_payloads }
    }
}
