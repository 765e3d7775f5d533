// Path: crates/cli/src/util.rs

use anyhow::{Context, Result};
use ica_types::app::Principal;
use ica_types::config::AgentConfig;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Loads the agent configuration, falling back to the defaults.
pub fn load_config(path: Option<&Path>) -> Result<AgentConfig> {
    match path {
        Some(path) => AgentConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(AgentConfig::default()),
    }
}

/// Decodes hex, tolerating a `0x` prefix and embedded whitespace.
pub fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let cleaned: String = input.split_whitespace().collect();
    let cleaned = cleaned.strip_prefix("0x").unwrap_or(&cleaned);
    hex::decode(cleaned).with_context(|| format!("invalid hex input {input:?}"))
}

pub fn parse_principal(text: &str) -> Result<Principal> {
    Principal::from_text(text).with_context(|| format!("invalid principal {text:?}"))
}

pub fn now() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_accepts_prefix_and_spaces() {
        assert_eq!(parse_hex("0x44 49\n44 4c").unwrap(), b"DIDL");
        assert!(parse_hex("zz").is_err());
    }

    #[test]
    fn test_missing_config_path_yields_defaults() {
        assert_eq!(
            load_config(None).unwrap().poll_timeout_ms,
            AgentConfig::default().poll_timeout_ms
        );
    }
}
