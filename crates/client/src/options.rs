// Path: crates/client/src/options.rs
//! Per-call overrides of the agent's polling and retry settings.

use ica_types::config::AgentConfig;
use std::time::Duration;

/// How one call is polled and retried. [`Agent::call_options`] gives the
/// agent's defaults; adjust the copy for a single call.
///
/// [`Agent::call_options`]: crate::Agent::call_options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallOptions {
    /// Time budget for submitting and polling one attempt.
    pub poll_timeout: Duration,
    /// First delay between status reads.
    pub poll_base_interval: Duration,
    /// Cap on the delay between status reads.
    pub poll_max_interval: Duration,
    /// Each delay is scaled by a factor in `[1 - ratio, 1 + ratio]`.
    pub poll_jitter_ratio: f64,
    /// Resubmissions after `SysTransient` rejects, and consecutive transient
    /// transport failures tolerated while polling.
    pub max_retransmit_attempts: u32,
}

impl CallOptions {
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn with_max_retransmit_attempts(mut self, attempts: u32) -> Self {
        self.max_retransmit_attempts = attempts;
        self
    }
}

impl From<&AgentConfig> for CallOptions {
    fn from(config: &AgentConfig) -> Self {
        Self {
            poll_timeout: config.poll_timeout(),
            poll_base_interval: config.poll_base_interval(),
            poll_max_interval: config.poll_max_interval(),
            poll_jitter_ratio: config.poll_jitter_ratio,
            max_retransmit_attempts: config.max_retransmit_attempts,
        }
    }
}
