//! Scan command implementation.

use std::path::Path;

use anyhow::Result;
use fuelcap_core::{CandidateScanner, ScanOutcome, ScanReport};
use owo_colors::OwoColorize;

use super::hex_utils::{format_hex_address, parse_hex_address};
use super::{load_config, load_dump};
use crate::cli::DumpArgs;

/// Run the scan command
pub fn run(
    dump: &DumpArgs,
    reference: &str,
    anchor: f32,
    config: Option<&Path>,
    json: bool,
) -> Result<()> {
    let reference = parse_hex_address(reference)?;
    let config = load_config(config)?;
    let memory = load_dump(dump)?;

    let report = CandidateScanner::new(&memory, &config).scan(reference, anchor);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &ScanReport) {
    let model = &report.model;
    println!("=== Fuel Capacity Scan ===");
    println!("Reference: {}", format_hex_address(model.reference));
    println!("Anchor:    {:.4}", report.anchor);
    println!(
        "Search:    [{}:{}]",
        format_hex_address(model.search.low),
        format_hex_address(model.search.high)
    );
    println!(
        "Validity:  [{}:{}]",
        format_hex_address(model.validity.low),
        format_hex_address(model.validity.high)
    );
    println!();

    match &report.outcome {
        ScanOutcome::Found(detection) => {
            println!(
                "{} tank capacity {:.4}",
                "FOUND".green().bold(),
                detection.tank_capacity
            );
            println!(
                "  structure  {} ({} fingerprint)",
                format_hex_address(detection.structure_address),
                detection.fingerprint
            );
            println!("  capacity   {}", format_hex_address(detection.capacity_address));
            println!(
                "  pointer    {} ({} {} words)",
                format_hex_address(detection.pointer_address),
                detection.direction,
                detection.amplitude
            );
        }
        ScanOutcome::Exhausted { reason } => {
            println!("{} {}", "NOT FOUND".red().bold(), reason);
        }
    }

    let state = &report.state;
    println!();
    println!(
        "Steps: {}, unreadable: {}, candidates: {}, elapsed: {} ms",
        state.steps, state.unreadable_words, state.candidates_tested, report.elapsed_ms
    );
    if !state.rejections.is_empty() {
        println!("Rejections:");
        for (reason, count) in &state.rejections {
            println!("  {:<26} {}", reason.to_string(), count);
        }
    }
}
