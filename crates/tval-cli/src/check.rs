//! # Check Subcommand
//!
//! Validates a JSON document against a type. Prints `ok`, or the first
//! mismatch with its path and exits with [`EXIT_MISMATCH`].

use std::io::Write;

use anyhow::Result;
use clap::Args;

use crate::{decode_document, DocumentArgs, EXIT_MISMATCH};

/// Arguments for the check subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub document: DocumentArgs,
}

/// Execute the check subcommand.
pub fn run_check(args: &CheckArgs, out: &mut impl Write) -> Result<u8> {
    match decode_document(&args.document)? {
        Ok(value) => {
            tracing::info!(signature = %value.signature(), "document is valid");
            writeln!(out, "ok")?;
            Ok(0)
        }
        Err(mismatch) => {
            writeln!(out, "{mismatch}")?;
            Ok(EXIT_MISMATCH)
        }
    }
}
