//! `verify` command implementation.

use std::io::Read;

use anyhow::{Context, Result};
use dispatcher::verify_signature;
use tracing::debug;

use crate::cli::VerifyArgs;
use crate::pipeline::ExitStatus;

/// Execute the `verify` command.
///
/// The body is used byte-for-byte; no trailing newline is stripped.
pub fn run_verify(args: &VerifyArgs) -> Result<ExitStatus> {
    let body = match &args.body_file {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("Failed to read body from {}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read body from stdin")?;
            buf
        }
    };

    Ok(check(&body, &args.signature, &args.secret))
}

fn check(body: &[u8], signature: &str, secret: &str) -> ExitStatus {
    debug!(body_bytes = body.len(), "Verifying signature");
    if verify_signature(body, signature, secret) {
        println!("Signature valid");
        ExitStatus::Success
    } else {
        eprintln!("Signature invalid");
        ExitStatus::Failed
    }
}
