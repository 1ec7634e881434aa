//! CLI command implementations.

pub mod config;
pub mod hex_utils;
pub mod hexdump;
pub mod inspect;
pub mod scan;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use fuelcap_core::{ScanConfig, SnapshotMemory};
use tracing::{debug, info};

use crate::cli::DumpArgs;
use hex_utils::parse_hex_address;

/// Load a dump file as a snapshot at its base address
pub fn load_dump(args: &DumpArgs) -> Result<SnapshotMemory> {
    let base = parse_hex_address(&args.base)?;
    let memory = SnapshotMemory::from_file(&args.dump, base)
        .with_context(|| format!("Failed to load dump {:?}", args.dump))?;
    if let Some((low, high)) = memory.bounds() {
        info!("Loaded {:?} at [0x{:X}:0x{:X})", args.dump, low, high);
    }
    Ok(memory)
}

/// Load the scan config, or defaults when no file is given
pub fn load_config(path: Option<&Path>) -> Result<ScanConfig> {
    match path {
        Some(path) => {
            let config = ScanConfig::load(path)
                .with_context(|| format!("Failed to load config {:?}", path))?;
            info!("Loaded config from {:?}", path);
            Ok(config)
        }
        None => {
            debug!("Using default scan config");
            Ok(ScanConfig::default())
        }
    }
}
