//! # Encode Subcommand
//!
//! Validates a JSON document and prints its canonical encoding: object keys
//! sorted, enum tags and constructors as indices. `--pretty` indents
//! instead and keeps record fields in declaration order.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use crate::{decode_document, DocumentArgs, EXIT_MISMATCH};

/// Arguments for the encode subcommand.
#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Indent the output.
    #[arg(long)]
    pub pretty: bool,

    /// Also print the content digest of the value.
    #[arg(long)]
    pub digest: bool,
}

/// Execute the encode subcommand.
pub fn run_encode(args: &EncodeArgs, out: &mut impl Write) -> Result<u8> {
    let value = match decode_document(&args.document)? {
        Ok(value) => value,
        Err(mismatch) => {
            writeln!(out, "{mismatch}")?;
            return Ok(EXIT_MISMATCH);
        }
    };
    let text = if args.pretty {
        value.encode_pretty()?
    } else {
        value.encode()?
    };
    writeln!(out, "{text}")?;
    if args.digest {
        writeln!(out, "{}", value.content_digest()?)?;
    }
    Ok(0)
}
