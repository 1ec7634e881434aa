//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fuelcap")]
#[command(about = "Recover truck fuel tank capacity from memory dumps")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging (repeat for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Raw memory dump loaded as one segment
#[derive(Args, Debug, Clone)]
pub struct DumpArgs {
    /// Dump file
    #[arg(short, long)]
    pub dump: PathBuf,

    /// Address of the first dumped byte (hex)
    #[arg(short, long, env = "FUELCAP_DUMP_BASE")]
    pub base: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scan outward from a reference address for the truck record
    Scan {
        #[command(flatten)]
        dump: DumpArgs,

        /// Reference address to scan around (hex)
        #[arg(short, long)]
        reference: String,

        /// Known AdBlue capacity
        #[arg(short, long, default_value_t = 80.0)]
        anchor: f32,

        /// Scan configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate one candidate structure address
    Validate {
        #[command(flatten)]
        dump: DumpArgs,

        /// Candidate structure address (hex)
        #[arg(short, long)]
        address: String,

        /// Known AdBlue capacity
        #[arg(long, default_value_t = 80.0)]
        anchor: f32,

        /// Scan configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Address the windows are centered on (hex, defaults to the candidate)
        #[arg(short, long)]
        reference: Option<String>,
    },

    /// Decode a candidate structure and check every field
    Inspect {
        #[command(flatten)]
        dump: DumpArgs,

        /// Candidate structure address (hex)
        #[arg(short, long)]
        address: String,

        /// Known AdBlue capacity
        #[arg(long, default_value_t = 80.0)]
        anchor: f32,

        /// Scan configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Hexdump memory at address
    Hexdump {
        #[command(flatten)]
        dump: DumpArgs,

        /// Address to dump (hex)
        #[arg(short, long)]
        address: String,

        /// Number of bytes to dump
        #[arg(short, long, default_value = "320")]
        size: usize,

        /// Show ASCII representation
        #[arg(long)]
        ascii: bool,
    },

    /// Print the default scan configuration as TOML
    Config,
}
