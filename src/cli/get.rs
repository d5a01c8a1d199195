//! Get command implementation

use anyhow::{Context, Result};
use clap::Args;

use super::sources::SourceArgs;
use super::utils::render_value;

#[derive(Args)]
pub struct GetArgs {
    /// Path expression, e.g. `server.port` or `hosts[0]`
    #[arg(value_name = "PATH")]
    pub path: String,

    #[command(flatten)]
    pub sources: SourceArgs,
}

pub fn run(args: GetArgs) -> Result<()> {
    let factory = args
        .sources
        .aggregator()?
        .resolve()
        .context("failed to resolve configuration")?;
    let node = factory
        .get(&args.path)?
        .with_context(|| format!("no value at path '{}'", args.path))?;
    println!("{}", render_value(node)?);
    Ok(())
}
