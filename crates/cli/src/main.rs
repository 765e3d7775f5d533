// Path: crates/cli/src/main.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # ICA CLI
//!
//! Offline tools for inspecting what the agent sends and receives.

use anyhow::Result;
use clap::{Parser, Subcommand};
use ica_cli::commands::*;
use ica_cli::util::load_config;
use ica_telemetry::{init_tracing_with, LogFormat};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "ica",
    version,
    about = "Inspect Candid messages, certificates, request ids and principals."
)]
struct Cli {
    /// Agent configuration (TOML). Decoder limits and clock skew are read from it.
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Log as JSON instead of compact text.
    #[clap(long, global = true)]
    log_json: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a hex-encoded Candid message as text.
    Decode(decode::DecodeArgs),

    /// Verify a certificate against a root key.
    VerifyCertificate(certificate::VerifyCertificateArgs),

    /// Compute the request id of a call.
    RequestId(request_id::RequestIdArgs),

    /// Convert a principal between text and hex.
    Principal(principal::PrincipalArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing_with(LogFormat::from_json_flag(cli.log_json))?;
    let config = load_config(cli.config.as_deref())?;

    let output = match cli.command {
        Commands::Decode(args) => decode::run(args, &config)?,
        Commands::VerifyCertificate(args) => certificate::run(args, &config)?,
        Commands::RequestId(args) => request_id::run(args)?,
        Commands::Principal(args) => principal::run(args)?,
    };
    println!("{output}");
    Ok(())
}
