//! Inspect command implementation.
//!
//! Prints every record check with its field values so near misses can be
//! compared against the configured bounds.

use std::path::Path;

use anyhow::Result;
use fuelcap_core::{AddressSpaceModel, inspect_structure};
use owo_colors::OwoColorize;

use super::hex_utils::parse_hex_address;
use super::{load_config, load_dump};
use crate::cli::DumpArgs;

/// Run the inspect command
pub fn run(dump: &DumpArgs, address: &str, anchor: f32, config: Option<&Path>) -> Result<()> {
    let address = parse_hex_address(address)?;
    let config = load_config(config)?;
    let memory = load_dump(dump)?;
    let model = AddressSpaceModel::new(address, &config);

    let inspection = inspect_structure(&memory, &model, &config.bounds, address, anchor)?;

    println!("=== Truck Record at 0x{:X} ===", address);
    println!("Link mode:       {}", inspection.link_mode);
    println!("Tank capacity:   {:.4}", inspection.tank_capacity);
    println!("AdBlue capacity: {:.4}", inspection.adblue_capacity);
    println!();

    for check in &inspection.checks {
        let mark = if check.passed {
            "✓".green().to_string()
        } else {
            "✗".red().to_string()
        };
        println!("  {} {:<16} {}", mark, check.check.to_string(), check.detail);
    }

    println!();
    match inspection.first_failure() {
        None => println!("{}", "All checks passed".green().bold()),
        Some(reason) => println!("{} {}", "First failure:".red().bold(), reason),
    }
    Ok(())
}
