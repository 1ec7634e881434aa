//! Hexdump command implementation.
//!
//! ```text
//! 0x0000020000001000: 00 50 34 12 F6 7F 00 00  06 00 00 A4 00 00 00 00  |.P4.............|
//! ```

use anyhow::Result;
use fuelcap_core::MemoryAccessor;

use super::hex_utils::parse_hex_address;
use super::load_dump;
use crate::cli::DumpArgs;

/// Run the hexdump command
pub fn run(dump: &DumpArgs, address: &str, size: usize, ascii: bool) -> Result<()> {
    let address = parse_hex_address(address)?;
    let memory = load_dump(dump)?;
    let bytes = memory.read_bytes(address, size)?;

    println!("Hexdump at 0x{:X} ({} bytes):", address, size);
    println!();
    for (i, chunk) in bytes.chunks(16).enumerate() {
        println!("{}", format_line(address + (i * 16) as u64, chunk, ascii));
    }

    Ok(())
}

fn format_line(address: u64, chunk: &[u8], ascii: bool) -> String {
    let mut line = format!("0x{:016X}: ", address);

    for j in 0..16 {
        if j == 8 {
            line.push(' ');
        }
        match chunk.get(j) {
            Some(byte) => line.push_str(&format!("{:02X} ", byte)),
            None => line.push_str("   "),
        }
    }

    if ascii {
        line.push_str(" |");
        for byte in chunk {
            line.push(if (0x20..0x7F).contains(byte) {
                *byte as char
            } else {
                '.'
            });
        }
        line.push_str(&" ".repeat(16 - chunk.len()));
        line.push('|');
    }

    line
}
