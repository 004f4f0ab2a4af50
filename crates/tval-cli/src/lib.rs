//! # tval-cli: The `tval` Command-Line Tool
//!
//! Works against a YAML schema bundle (see
//! [`SchemaBundle`](tval_schema::SchemaBundle)).
//!
//! ## Subcommands
//!
//! - `tval check`: validate a JSON document against a type; prints `ok` or
//!   the first mismatch with its path.
//! - `tval encode`: validate and print the canonical encoding.
//! - `tval describe`: print the compact form and digest of each type.
//!
//! ```bash
//! tval check --bundle types.yaml --type User --input user.json
//! tval encode --bundle types.yaml --type Scene --input scene.json --pretty
//! tval describe --bundle types.yaml
//! ```
//!
//! Exit codes: `0` success, `1` usage or I/O failure, `2` validation
//! mismatch.

pub mod check;
pub mod describe;
pub mod encode;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tval_core::{TvalError, ValidationError};
use tval_schema::{SchemaBundle, TypeRegistry};
use tval_value::TypedValue;

/// Exit code for a document that does not match its type.
pub const EXIT_MISMATCH: u8 = 2;

/// Arguments shared by subcommands that read one document.
#[derive(Args, Debug, Clone)]
pub struct DocumentArgs {
    /// YAML schema bundle.
    #[arg(long)]
    pub bundle: PathBuf,

    /// Type to check the document against (a declared type, a template
    /// instance such as `MaybeUser`, or a scalar keyword).
    #[arg(long = "type", value_name = "TYPE")]
    pub type_name: String,

    /// JSON document, or `-` for standard input.
    #[arg(long)]
    pub input: PathBuf,
}

/// Load a schema bundle into a registry.
pub fn load_registry(path: &Path) -> Result<TypeRegistry> {
    let bundle = SchemaBundle::load(path)?;
    let registry = TypeRegistry::from_bundle(&bundle)
        .with_context(|| format!("failed to register types from {}", path.display()))?;
    tracing::debug!(
        bundle = %path.display(),
        types = registry.names().len(),
        "schema bundle loaded"
    );
    Ok(registry)
}

/// Read a document from a file, or from standard input for `-`.
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read standard input")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Decode the document named by `args`. A validation mismatch is returned
/// as the inner error; every other failure is the outer one.
pub(crate) fn decode_document(
    args: &DocumentArgs,
) -> Result<std::result::Result<TypedValue, ValidationError>> {
    let registry = load_registry(&args.bundle)?;
    let signature = registry
        .reference(&args.type_name)
        .with_context(|| format!("unknown type \"{}\"", args.type_name))?;
    let text = read_input(&args.input)?;
    match TypedValue::decode(signature, &text) {
        Ok(value) => Ok(Ok(value)),
        Err(TvalError::Validation(mismatch)) => Ok(Err(mismatch)),
        Err(e) => Err(e).with_context(|| format!("failed to decode {}", args.input.display())),
    }
}
