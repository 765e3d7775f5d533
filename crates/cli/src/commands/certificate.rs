// Path: crates/cli/src/commands/certificate.rs

use crate::util::{now, parse_hex, parse_principal};
use anyhow::{Context, Result};
use clap::Parser;
use ica_state::CertificateVerifier;
use ica_types::config::AgentConfig;
use std::path::Path;
use std::time::Duration;

#[derive(Parser, Debug)]
pub struct VerifyCertificateArgs {
    /// A file holding the CBOR certificate, or the certificate as hex.
    #[clap(long)]
    pub certificate: String,
    /// The DER-encoded root key, as hex.
    #[clap(long)]
    pub root_key: String,
    /// The canister the certificate must be valid for.
    #[clap(long)]
    pub canister: String,
    /// Verify as of this time instead of the system clock.
    #[clap(long)]
    pub now_ns: Option<u64>,
}

fn read_certificate(source: &str) -> Result<Vec<u8>> {
    let path = Path::new(source);
    if !path.is_file() {
        return parse_hex(source);
    }
    let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    // Files may hold either raw CBOR or its hex dump.
    match std::str::from_utf8(&raw).ok().map(parse_hex) {
        Some(Ok(bytes)) => Ok(bytes),
        _ => Ok(raw),
    }
}

/// Verifies a certificate against a root key and reports its certified time.
pub fn run(args: VerifyCertificateArgs, config: &AgentConfig) -> Result<String> {
    let bytes = read_certificate(&args.certificate)?;
    let root_key = parse_hex(&args.root_key)?;
    let canister = parse_principal(&args.canister)?;
    let at = args.now_ns.map(Duration::from_nanos).unwrap_or_else(now);

    let verifier = CertificateVerifier::new(root_key, config);
    let (_, verified) = verifier
        .verify_bytes(&bytes, &canister, at)
        .context("certificate verification failed")?;
    tracing::info!(
        target: "cli",
        time_ns = verified.time_ns,
        delegations = verified.delegation_depth,
        "certificate verified"
    );
    Ok(format!(
        "valid\ntime_ns: {}\nroot_hash: {}\ndelegations: {}",
        verified.time_ns,
        hex::encode(verified.root_hash),
        verified.delegation_depth
    ))
}
