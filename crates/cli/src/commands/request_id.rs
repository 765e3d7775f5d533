// Path: crates/cli/src/commands/request_id.rs

use crate::util::{parse_hex, parse_principal};
use anyhow::Result;
use clap::Parser;
use ica_client::request_id;
use ica_types::app::{CallRequest, Principal, RequestContent};

#[derive(Parser, Debug)]
pub struct RequestIdArgs {
    /// The target canister, in textual form.
    #[clap(long)]
    pub canister: String,
    #[clap(long)]
    pub method: String,
    /// The Candid-encoded argument, as hex.
    #[clap(long, default_value = "")]
    pub arg: String,
    /// The sender principal; anonymous when omitted.
    #[clap(long)]
    pub sender: Option<String>,
    /// Expiry in nanoseconds since the epoch.
    #[clap(long)]
    pub ingress_expiry: u64,
    /// Nonce bytes, as hex.
    #[clap(long)]
    pub nonce: Option<String>,
}

/// Prints the request id of a `call` with the given content.
pub fn run(args: RequestIdArgs) -> Result<String> {
    let sender = match &args.sender {
        Some(text) => parse_principal(text)?,
        None => Principal::anonymous(),
    };
    let content = RequestContent::Call(CallRequest {
        canister_id: parse_principal(&args.canister)?,
        method_name: args.method,
        arg: parse_hex(&args.arg)?,
        sender,
        ingress_expiry: args.ingress_expiry,
        nonce: args.nonce.as_deref().map(parse_hex).transpose()?,
    });
    Ok(request_id(&content).to_string())
}
