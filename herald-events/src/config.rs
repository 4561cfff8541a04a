//! Event configuration

use serde::{Deserialize, Serialize};

/// Per-event configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Emit `tracing` records for listener changes and triggers
    pub enable_logging: bool,

    /// Name attached to log records; unnamed events log as `"event"`
    pub name: Option<String>,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            enable_logging: true,
            name: None,
        }
    }
}

impl EventConfig {
    pub(crate) fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("event")
    }
}
