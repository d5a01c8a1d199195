//! Resolve command implementation

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use super::sources::SourceArgs;
use confstack::ConfigNode;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Print only the sub-tree at this path
    #[arg(long, value_name = "PATH")]
    pub at: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// List declared variables instead of resolving
    #[arg(long)]
    pub list_vars: bool,
}

pub fn run(args: ResolveArgs) -> Result<()> {
    let aggregator = args.sources.aggregator()?;

    if args.list_vars {
        let conventions = aggregator.current_conventions();
        for variable in aggregator.declared_variables() {
            let mut line = format!("{}\t{}", variable.canonical_name(conventions), variable.path);
            if let Some(description) = &variable.description {
                line.push('\t');
                line.push_str(description);
            }
            println!("{line}");
        }
        return Ok(());
    }

    let factory = aggregator.resolve().context("failed to resolve configuration")?;
    let node = match &args.at {
        Some(path) => factory
            .get(path)?
            .with_context(|| format!("no value at path '{path}'"))?,
        None => factory.root(),
    };
    print!("{}", render(node, args.format)?);
    Ok(())
}

fn render(node: &ConfigNode, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Yaml => serde_yaml::to_string(node)?,
        OutputFormat::Json => serde_json::to_string_pretty(node)? + "\n",
    })
}
