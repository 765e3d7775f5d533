// Path: crates/cli/src/commands/principal.rs

use crate::util::parse_hex;
use anyhow::{bail, Result};
use clap::Parser;
use ica_types::app::Principal;

#[derive(Parser, Debug)]
pub struct PrincipalArgs {
    /// A principal in textual form (`aaaaa-aa`) or as hex bytes.
    pub input: String,
}

/// Converts between the textual and the raw hex form of a principal.
pub fn run(args: PrincipalArgs) -> Result<String> {
    if let Ok(principal) = Principal::from_text(&args.input) {
        return Ok(format!("{}\nbytes: {}", principal, hex::encode(principal.as_slice())));
    }
    let bytes = match parse_hex(&args.input) {
        Ok(bytes) => bytes,
        Err(_) => bail!("{:?} is neither a principal nor hex", args.input),
    };
    let principal = Principal::try_from_slice(&bytes)?;
    Ok(format!("{}\nbytes: {}", principal, hex::encode(principal.as_slice())))
}
