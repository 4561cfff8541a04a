//! Registry configuration

use serde::{Deserialize, Serialize};

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Emit `tracing` records; inherited by every declared event
    pub enable_logging: bool,

    /// Start with triggers suppressed until `block_events(false)`
    pub start_blocked: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            enable_logging: true,
            start_blocked: false,
        }
    }
}
