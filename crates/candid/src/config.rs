// Path: crates/candid/src/config.rs

use ica_types::config::AgentConfig;

/// Resource limits applied while decoding untrusted wire input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Maximum number of entries a wire type table may declare.
    pub max_type_table_entries: usize,
    /// Maximum nesting depth of a decoded value.
    pub max_depth: usize,
    /// Maximum number of values (including every vector element) one
    /// message may decode to.
    pub max_elements: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::from(&AgentConfig::default())
    }
}

impl From<&AgentConfig> for DecoderConfig {
    fn from(config: &AgentConfig) -> Self {
        Self {
            max_type_table_entries: config.max_type_table_entries,
            max_depth: config.max_decode_depth,
            max_elements: config.max_decode_elements,
        }
    }
}
