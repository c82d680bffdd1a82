//! Orchestrator configuration

use std::time::Duration;

use tracing::debug;

use crate::config::StreamingConfig;
use crate::search::WATCHDOG_TIMEOUT;

/// Runtime settings for one orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Try the stream before the blocking call
    pub streaming_enabled: bool,

    /// Deadline for a streamed answer
    pub watchdog: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        debug!("OrchestratorConfig::default: called");
        Self {
            streaming_enabled: true,
            watchdog: WATCHDOG_TIMEOUT,
        }
    }
}

impl From<&StreamingConfig> for OrchestratorConfig {
    fn from(config: &StreamingConfig) -> Self {
        debug!(?config, "OrchestratorConfig::from: called");
        Self {
            streaming_enabled: config.enabled,
            watchdog: Duration::from_millis(config.watchdog_ms),
        }
    }
}
