//! config/mod.rs
//! Receive-side policy for the protocol handler.
//!
//! The core has no timers of its own. A frame gap is only enforced when the caller
//! configures one and feeds timestamps through `DiagProtocol::parse_frame_at`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to do when a single/first frame arrives while a message is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartPolicy {
    /// Drop the partial message and start over with the new frame.
    #[default]
    Restart,
    /// Refuse the new frame and keep the partial message.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub restart_policy: RestartPolicy,
    /// Longest allowed silence between two frames of one message, in milliseconds.
    pub max_frame_gap_ms: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ProtocolConfig {
    pub fn with_restart_policy(mut self, policy: RestartPolicy) -> Self {
        self.restart_policy = policy;
        self
    }

    /// Rounded up to whole milliseconds, never below 1 ms.
    pub fn with_max_frame_gap(mut self, gap: Duration) -> Self {
        let ms = gap.as_nanos().div_ceil(1_000_000);
        self.max_frame_gap_ms = Some(u64::try_from(ms).unwrap_or(u64::MAX).max(1));
        self
    }

    pub fn max_frame_gap(&self) -> Option<Duration> {
        self.max_frame_gap_ms.map(Duration::from_millis)
    }

    /// Parse and validate a JSON config document.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_frame_gap_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "max_frame_gap_ms must be non-zero when set".into(),
            ));
        }
        Ok(())
    }
}
