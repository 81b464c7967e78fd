use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod prompt;

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // --debug (or RUST_LOG) controls verbosity.
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    commands::run(args)
}
