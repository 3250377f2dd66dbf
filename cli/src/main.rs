#![deny(missing_docs)]

//! # crudgen CLI
//!
//! Command line front end for the schema-driven CRUD generator.
//!
//! - `crudgen <SCHEMA>`: generate one entity.
//! - `crudgen --all [DIR]`: generate every schema in DIR (default `./schemas`).

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::error::CliResult;

mod error;
mod generate;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Schema-driven CRUD generator")]
struct Cli {
    #[clap(flatten)]
    generate: generate::GenerateArgs,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("crudgen_core={level},crudgen={level}"))),
        )
        .with_target(false)
        .init();
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!(?cli, "Parsed arguments");
    generate::execute(&cli.generate)
}
