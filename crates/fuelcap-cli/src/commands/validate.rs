//! Validate command implementation.

use std::path::Path;

use anyhow::Result;
use fuelcap_core::{AddressSpaceModel, LegacyValidator, StructureValidator, Verdict};
use owo_colors::OwoColorize;

use super::hex_utils::parse_hex_address;
use super::{load_config, load_dump};
use crate::cli::DumpArgs;

/// Run the validate command
pub fn run(
    dump: &DumpArgs,
    address: &str,
    anchor: f32,
    config: Option<&Path>,
    reference: Option<&str>,
) -> Result<()> {
    let address = parse_hex_address(address)?;
    let reference = reference.map(parse_hex_address).transpose()?.unwrap_or(address);
    let config = load_config(config)?;
    let memory = load_dump(dump)?;
    let model = AddressSpaceModel::new(reference, &config);

    println!("=== Candidate Validation ===");
    println!("Address:   0x{:X}", address);
    println!("Reference: 0x{:X}", reference);
    println!("Anchor:    {:.4}", anchor);
    println!();

    let primary = StructureValidator::new(&memory, &model, &config.bounds).validate(address, anchor);
    print_verdict("Primary", &primary);

    if config.legacy_fingerprint {
        let legacy = LegacyValidator::new(&memory, &model, &config.bounds).validate(address);
        print_verdict("Legacy", &legacy);
    }

    Ok(())
}

fn print_verdict(label: &str, verdict: &Verdict) {
    match verdict {
        Verdict::Accept(capacity) => println!(
            "{:<8} {} tank capacity {:.4}",
            label,
            "ACCEPT".green().bold(),
            capacity
        ),
        Verdict::Reject(reason) => {
            println!("{:<8} {} {}", label, "REJECT".red().bold(), reason)
        }
    }
}
