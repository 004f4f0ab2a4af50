//! # Describe Subcommand
//!
//! Prints each type of a bundle in compact form with its signature digest,
//! followed by the registered templates.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tval_schema::{Resolved, TypeRegistry};

use crate::load_registry;

/// Arguments for the describe subcommand.
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// YAML schema bundle.
    #[arg(long)]
    pub bundle: PathBuf,

    /// Describe only this type (a template instance or scalar keyword also
    /// works).
    #[arg(long = "type", value_name = "TYPE")]
    pub type_name: Option<String>,

    /// Also print each declaration as JSON.
    #[arg(long)]
    pub declarations: bool,
}

/// Execute the describe subcommand.
pub fn run_describe(args: &DescribeArgs, out: &mut impl Write) -> Result<u8> {
    let registry = load_registry(&args.bundle)?;
    match &args.type_name {
        Some(name) => describe_one(&registry, name, args.declarations, out)?,
        None => {
            for name in registry.names() {
                describe_one(&registry, &name, args.declarations, out)?;
            }
            for pattern in registry.template_patterns() {
                match registry.template_declaration(&pattern) {
                    Some(declaration) => writeln!(
                        out,
                        "template {pattern}: {}",
                        serde_json::to_string(&declaration)?
                    )?,
                    None => writeln!(out, "template {pattern}")?,
                }
            }
        }
    }
    Ok(0)
}

fn describe_one(
    registry: &TypeRegistry,
    name: &str,
    declarations: bool,
    out: &mut impl Write,
) -> Result<()> {
    if !registry.is_known(name) {
        // Scalar keywords are not registry names.
        let signature = registry
            .reference(name)
            .with_context(|| format!("unknown type \"{name}\""))?;
        writeln!(out, "{name}: {signature}")?;
        writeln!(out, "  digest: {}", signature.digest())?;
        return Ok(());
    }
    match registry
        .resolve(name)
        .with_context(|| format!("cannot resolve type \"{name}\""))?
    {
        Resolved::Declared(signature) => {
            writeln!(out, "{name}: {signature}")?;
            writeln!(out, "  digest: {}", signature.digest())?;
            if declarations {
                writeln!(
                    out,
                    "  declaration: {}",
                    serde_json::to_string(&signature.to_declaration())?
                )?;
            }
        }
        Resolved::External(external) => {
            writeln!(out, "{name}: external ({})", external.describe())?;
        }
    }
    Ok(())
}
