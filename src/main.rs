//! confstack: resolve layered configuration from files, URLs, properties and
//! environment variables, and print the merged result.

use anyhow::Result;

mod cli;

fn main() -> Result<()> {
    cli::run()
}
