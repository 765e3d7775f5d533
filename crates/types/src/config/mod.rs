// Path: crates/types/src/config/mod.rs

//! Shared configuration structures for the agent.
//!
//! Every option is an explicit value threaded into the agent, the verifier
//! and the decoder; nothing here is read from a process-wide singleton.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the call/poll protocol, certificate verification and decoding
/// (`agent.toml`).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Delay before the second poll; doubles on every step.
    #[serde(default = "default_poll_base_interval_ms")]
    pub poll_base_interval_ms: u64,
    /// Upper bound on the delay between polls.
    #[serde(default = "default_poll_max_interval_ms")]
    pub poll_max_interval_ms: u64,
    /// Wall-clock budget for polling a single submission.
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    /// Fraction of each delay that is randomised, in `[0, 1)`.
    #[serde(default = "default_poll_jitter_ratio")]
    pub poll_jitter_ratio: f64,
    /// Resubmissions allowed after a `SysTransient` reject.
    #[serde(default = "default_max_retransmit_attempts")]
    pub max_retransmit_attempts: u32,
    /// Allowed distance between a certificate's time and the local clock.
    #[serde(default = "default_allowed_clock_skew_ms")]
    pub allowed_clock_skew_ms: u64,
    /// Maximum number of delegations between a certificate and the root key.
    #[serde(default = "default_max_delegation_depth")]
    pub max_delegation_depth: usize,
    /// Maximum number of entries in a wire type table.
    #[serde(default = "default_max_type_table_entries")]
    pub max_type_table_entries: usize,
    /// Maximum nesting of types and values while decoding.
    #[serde(default = "default_max_decode_depth")]
    pub max_decode_depth: usize,
    /// Maximum number of values a single message may decode.
    #[serde(default = "default_max_decode_elements")]
    pub max_decode_elements: usize,
    /// Lifetime of a request envelope.
    #[serde(default = "default_ingress_expiry_ms")]
    pub ingress_expiry_ms: u64,
}

fn default_poll_base_interval_ms() -> u64 {
    500
}
fn default_poll_max_interval_ms() -> u64 {
    5_000
}
fn default_poll_timeout_ms() -> u64 {
    300_000
}
fn default_poll_jitter_ratio() -> f64 {
    0.2
}
fn default_max_retransmit_attempts() -> u32 {
    3
}
fn default_allowed_clock_skew_ms() -> u64 {
    300_000
}
fn default_max_delegation_depth() -> usize {
    1
}
fn default_max_type_table_entries() -> usize {
    10_000
}
fn default_max_decode_depth() -> usize {
    256
}
fn default_max_decode_elements() -> usize {
    2_000_000
}
fn default_ingress_expiry_ms() -> u64 {
    240_000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            poll_base_interval_ms: default_poll_base_interval_ms(),
            poll_max_interval_ms: default_poll_max_interval_ms(),
            poll_timeout_ms: default_poll_timeout_ms(),
            poll_jitter_ratio: default_poll_jitter_ratio(),
            max_retransmit_attempts: default_max_retransmit_attempts(),
            allowed_clock_skew_ms: default_allowed_clock_skew_ms(),
            max_delegation_depth: default_max_delegation_depth(),
            max_type_table_entries: default_max_type_table_entries(),
            max_decode_depth: default_max_decode_depth(),
            max_decode_elements: default_max_decode_elements(),
            ingress_expiry_ms: default_ingress_expiry_ms(),
        }
    }
}

impl AgentConfig {
    /// Parses a TOML document; missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Checks the relationships between fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_base_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_base_interval_ms must be greater than zero".into(),
            ));
        }
        if self.poll_max_interval_ms < self.poll_base_interval_ms {
            return Err(ConfigError::Invalid(format!(
                "poll_max_interval_ms ({}) is below poll_base_interval_ms ({})",
                self.poll_max_interval_ms, self.poll_base_interval_ms
            )));
        }
        if !(0.0..1.0).contains(&self.poll_jitter_ratio) {
            return Err(ConfigError::Invalid(format!(
                "poll_jitter_ratio must be in [0, 1), got {}",
                self.poll_jitter_ratio
            )));
        }
        if self.max_type_table_entries == 0 || self.max_decode_depth == 0 {
            return Err(ConfigError::Invalid(
                "decoder limits must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// `poll_base_interval_ms` as a `Duration`.
    pub fn poll_base_interval(&self) -> Duration {
        Duration::from_millis(self.poll_base_interval_ms)
    }

    /// `poll_max_interval_ms` as a `Duration`.
    pub fn poll_max_interval(&self) -> Duration {
        Duration::from_millis(self.poll_max_interval_ms)
    }

    /// `poll_timeout_ms` as a `Duration`.
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// `allowed_clock_skew_ms` as a `Duration`.
    pub fn allowed_clock_skew(&self) -> Duration {
        Duration::from_millis(self.allowed_clock_skew_ms)
    }

    /// `ingress_expiry_ms` as a `Duration`.
    pub fn ingress_expiry(&self) -> Duration {
        Duration::from_millis(self.ingress_expiry_ms)
    }
}
