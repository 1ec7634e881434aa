//! In-memory copy of parts of an address space.
//!
//! Used to analyze raw memory dumps offline and to build synthetic address
//! spaces in tests. Each segment is a contiguous byte range at a fixed base
//! address; anything outside every segment is unmapped.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::accessor::{MemoryAccessor, range_end};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct Segment {
    base: u64,
    bytes: Vec<u8>,
}

impl Segment {
    fn end(&self) -> u64 {
        self.base + self.bytes.len() as u64
    }

    fn contains(&self, address: u64, end: u64) -> bool {
        address >= self.base && end <= self.end()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotMemory {
    /// Sorted by base address, non-overlapping
    segments: Vec<Segment>,
}

impl SnapshotMemory {
    pub fn builder() -> SnapshotMemoryBuilder {
        SnapshotMemoryBuilder::default()
    }

    /// Load a raw dump file as a single segment starting at `base`
    pub fn from_file<P: AsRef<Path>>(path: P, base: u64) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        debug!(
            "Loaded {} bytes from {:?} at base 0x{:X}",
            bytes.len(),
            path.as_ref(),
            base
        );
        Self::builder().segment(base, bytes).build()
    }

    fn segment_for(&self, address: u64, end: u64) -> Option<&Segment> {
        let idx = self.segments.partition_point(|s| s.end() <= address);
        self.segments
            .get(idx)
            .filter(|segment| segment.contains(address, end))
    }

    fn segment_for_mut(&mut self, address: u64, end: u64) -> Option<&mut Segment> {
        let idx = self.segments.partition_point(|s| s.end() <= address);
        self.segments
            .get_mut(idx)
            .filter(|segment| segment.contains(address, end))
    }

    /// Lowest and highest (exclusive) mapped addresses
    pub fn bounds(&self) -> Option<(u64, u64)> {
        let first = self.segments.first()?;
        let last = self.segments.last()?;
        Some((first.base, last.end()))
    }

    pub fn write_bytes(&mut self, address: u64, data: &[u8]) -> Result<()> {
        let end = range_end(address, data.len())?;
        let segment = self
            .segment_for_mut(address, end)
            .ok_or(Error::UnmappedMemory {
                address,
                len: data.len(),
            })?;
        let start = (address - segment.base) as usize;
        segment.bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    pub fn write_u64(&mut self, address: u64, value: u64) -> Result<()> {
        self.write_bytes(address, &value.to_le_bytes())
    }

    pub fn write_f32(&mut self, address: u64, value: f32) -> Result<()> {
        self.write_bytes(address, &value.to_le_bytes())
    }
}

impl MemoryAccessor for SnapshotMemory {
    fn probe(&self, address: u64, len: usize) -> bool {
        match address.checked_add(len as u64) {
            Some(end) => self.segment_for(address, end).is_some(),
            None => false,
        }
    }

    fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<()> {
        let end = range_end(address, buf.len())?;
        let segment = self.segment_for(address, end).ok_or(Error::UnmappedMemory {
            address,
            len: buf.len(),
        })?;
        let start = (address - segment.base) as usize;
        buf.copy_from_slice(&segment.bytes[start..start + buf.len()]);
        Ok(())
    }
}

/// Builder for SnapshotMemory
#[derive(Debug, Clone, Default)]
pub struct SnapshotMemoryBuilder {
    segments: Vec<Segment>,
}

impl SnapshotMemoryBuilder {
    /// Add a segment with the given contents
    pub fn segment(mut self, base: u64, bytes: Vec<u8>) -> Self {
        self.segments.push(Segment { base, bytes });
        self
    }

    /// Add a zero-filled segment
    pub fn zeroed(self, base: u64, len: usize) -> Self {
        self.segment(base, vec![0u8; len])
    }

    /// Build the snapshot, rejecting overlapping or wrapping segments
    pub fn build(mut self) -> Result<SnapshotMemory> {
        self.segments.retain(|s| !s.bytes.is_empty());
        self.segments.sort_by_key(|s| s.base);

        for segment in &self.segments {
            range_end(segment.base, segment.bytes.len())?;
        }
        for pair in self.segments.windows(2) {
            if pair[0].end() > pair[1].base {
                return Err(Error::InvalidConfig(format!(
                    "snapshot segments overlap at 0x{:X}",
                    pair[1].base
                )));
            }
        }

        Ok(SnapshotMemory {
            segments: self.segments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_segments() -> SnapshotMemory {
        SnapshotMemory::builder()
            .zeroed(0x2000, 0x100)
            .segment(0x1000, vec![0xAA; 0x10])
            .build()
            .unwrap()
    }

    #[test]
    fn test_probe_within_and_across_segments() {
        let mem = two_segments();
        assert!(mem.probe(0x1000, 0x10));
        assert!(mem.probe(0x2000, 0x100));
        assert!(!mem.probe(0x1008, 0x10)); // runs past the first segment
        assert!(!mem.probe(0x0FF8, 8));
        assert!(!mem.probe(0x3000, 1));
        assert!(!mem.probe(u64::MAX - 2, 8));
    }

    #[test]
    fn test_read_and_write_roundtrip() {
        let mut mem = two_segments();
        mem.write_u64(0x2010, 0xDEAD_BEEF).unwrap();
        mem.write_f32(0x2018, 80.0).unwrap();
        assert_eq!(mem.read_u64(0x2010).unwrap(), 0xDEAD_BEEF);
        assert_eq!(mem.read_f32(0x2018).unwrap(), 80.0);
        assert_eq!(mem.read_word(0x1000), Some(0xAAAA_AAAA_AAAA_AAAA));
    }

    #[test]
    fn test_unmapped_read_is_error() {
        let mem = two_segments();
        let err = mem.read_u64(0x5000).unwrap_err();
        assert!(err.is_unmapped());
        assert_eq!(mem.read_word(0x20FC), None);
        assert_eq!(mem.fetch(0x20F0, 0x20), None);
    }

    #[test]
    fn test_overlapping_segments_rejected() {
        let result = SnapshotMemory::builder()
            .zeroed(0x1000, 0x100)
            .zeroed(0x1080, 0x100)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();

        let mem = SnapshotMemory::from_file(file.path(), 0x4000).unwrap();
        assert_eq!(mem.bounds(), Some((0x4000, 0x4008)));
        assert_eq!(mem.read_u32(0x4004).unwrap(), u32::from_le_bytes([5, 6, 7, 8]));
    }
}
