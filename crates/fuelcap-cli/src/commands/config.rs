//! Config command implementation.

use anyhow::Result;
use fuelcap_core::ScanConfig;

/// Print the default configuration as TOML
pub fn run() -> Result<()> {
    print!("{}", ScanConfig::default().to_toml()?);
    Ok(())
}
