//! Probing memory access.
//!
//! Every read made by the scanner and the validators goes through
//! [`MemoryAccessor::fetch`] or [`MemoryAccessor::read_word`], which probe the
//! range before touching it. Implementations must never fault on an arbitrary
//! address: an unreadable range is reported by `probe` returning `false` and
//! by `read_into` returning [`Error::UnmappedMemory`].

use crate::error::{Error, Result};
use crate::memory::layout::WORD;

pub trait MemoryAccessor {
    /// Returns true iff every byte of `[address, address + len)` is currently
    /// mapped and readable.
    fn probe(&self, address: u64, len: usize) -> bool;

    /// Copy `buf.len()` bytes starting at `address` into `buf`.
    fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<()>;

    fn read_bytes(&self, address: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_into(address, &mut buf)?;
        Ok(buf)
    }

    fn read_u64(&self, address: u64) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_into(address, &mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    fn read_u32(&self, address: u64) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_into(address, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_f32(&self, address: u64) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.read_into(address, &mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }

    /// Probe one pointer-sized word and read it if readable.
    fn read_word(&self, address: u64) -> Option<u64> {
        if !self.probe(address, WORD as usize) {
            return None;
        }
        self.read_u64(address).ok()
    }

    /// Probe `len` bytes and read them if the whole range is readable.
    fn fetch(&self, address: u64, len: usize) -> Option<Vec<u8>> {
        if !self.probe(address, len) {
            return None;
        }
        self.read_bytes(address, len).ok()
    }
}

/// Check a range for address-space overflow, returning its exclusive end.
pub(crate) fn range_end(address: u64, len: usize) -> Result<u64> {
    address
        .checked_add(len as u64)
        .ok_or(Error::UnmappedMemory { address, len })
}
