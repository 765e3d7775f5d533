// Path: crates/cli/src/commands/decode.rs

use crate::util::parse_hex;
use anyhow::{Context, Result};
use clap::Parser;
use ica_candid::{DecoderConfig, IdlArgs};
use ica_types::config::AgentConfig;

#[derive(Parser, Debug)]
pub struct DecodeArgs {
    /// A hex-encoded Candid message, starting with `4449444c` ("DIDL").
    pub hex: String,
}

/// Renders a Candid message as text, using the types carried on the wire.
pub fn run(args: DecodeArgs, config: &AgentConfig) -> Result<String> {
    let bytes = parse_hex(&args.hex)?;
    let decoded = IdlArgs::from_bytes(&bytes, &DecoderConfig::from(config))
        .context("decoding Candid message")?;
    tracing::debug!(target: "cli", bytes = bytes.len(), args = decoded.args.len(), "decoded");
    Ok(decoded.to_string())
}
