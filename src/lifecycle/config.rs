//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Settings for an [`Orchestrator`](crate::lifecycle::Orchestrator).
///
/// Missing fields fall back to their defaults, so partial documents deserialize:
///
/// ```rust
/// use runsv::lifecycle::OrchestratorConfig;
///
/// let config: OrchestratorConfig = serde_json::from_str("{}").unwrap();
/// assert_eq!(config.name, "runsv");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Label attached to the tracing spans of every walk.
    pub name: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            name: "runsv".to_string(),
        }
    }
}
