//! Planner configuration.

use serde::{Deserialize, Serialize};

/// Tunables shared by a planner and the child planners it spawns for
/// dynamic sub-templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Initial capacity of the output buffer of each new state.
    pub buffer_size: usize,
    /// Maximum number of cached sub-template plans; 0 means unbounded.
    pub cache_size: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1024,
            cache_size: 0,
        }
    }
}

impl PlannerConfig {
    /// Load from JSON; missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
