use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "fuelcap=info",
        1 => "fuelcap=debug",
        _ => "fuelcap=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Scan {
            dump,
            reference,
            anchor,
            config,
            json,
        } => commands::scan::run(&dump, &reference, anchor, config.as_deref(), json),
        Command::Validate {
            dump,
            address,
            anchor,
            config,
            reference,
        } => commands::validate::run(
            &dump,
            &address,
            anchor,
            config.as_deref(),
            reference.as_deref(),
        ),
        Command::Inspect {
            dump,
            address,
            anchor,
            config,
        } => commands::inspect::run(&dump, &address, anchor, config.as_deref()),
        Command::Hexdump {
            dump,
            address,
            size,
            ascii,
        } => commands::hexdump::run(&dump, &address, size, ascii),
        Command::Config => commands::config::run(),
    }
}
