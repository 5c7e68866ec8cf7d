#![deny(missing_docs)]

//! # Swaggen CLI
//!
//! Command line driver for the OpenAPI 2.0 generator.
//!
//! Supported Commands:
//! - `init`: walk an annotated source tree and emit `swagger.json` or
//!   `swagger.yaml`.

use clap::{Parser, Subcommand};
use swaggen_core::AppResult;

mod init;
mod loader;
mod logging;

#[derive(Parser, Debug)]
#[clap(author, version, about = "OpenAPI 2.0 generator for annotated source trees")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(flatten)]
    log: logging::LogArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generates the OpenAPI document from a source tree.
    Init(init::InitArgs),
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log);

    match &cli.command {
        Commands::Init(args) => init::execute(args)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
