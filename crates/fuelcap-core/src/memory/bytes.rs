//! Offset-addressed little-endian decoding over a fetched byte block.

/// Read-only view over bytes copied out of the host process.
///
/// All accessors are bounds-checked and return `None` past the end, so a
/// short buffer can never be misread as a valid field.
#[derive(Debug, Clone, Copy)]
pub struct ByteBuffer<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteBuffer<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn array<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        let end = offset.checked_add(N)?;
        self.bytes.get(offset..end)?.try_into().ok()
    }

    pub fn u64_at(&self, offset: usize) -> Option<u64> {
        self.array(offset).map(u64::from_le_bytes)
    }

    pub fn u32_at(&self, offset: usize) -> Option<u32> {
        self.array(offset).map(u32::from_le_bytes)
    }

    pub fn i32_at(&self, offset: usize) -> Option<i32> {
        self.array(offset).map(i32::from_le_bytes)
    }

    pub fn f32_at(&self, offset: usize) -> Option<f32> {
        self.array(offset).map(f32::from_le_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_little_endian_fields() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0x1122_3344_5566_7788u64.to_le_bytes());
        bytes.extend_from_slice(&7u32.to_le_bytes());
        bytes.extend_from_slice(&(-3i32).to_le_bytes());
        bytes.extend_from_slice(&681.4f32.to_le_bytes());
        let buf = ByteBuffer::new(&bytes);

        assert_eq!(buf.u64_at(0), Some(0x1122_3344_5566_7788));
        assert_eq!(buf.u32_at(8), Some(7));
        assert_eq!(buf.i32_at(12), Some(-3));
        assert_eq!(buf.f32_at(16), Some(681.4));
    }

    #[test]
    fn test_out_of_bounds_is_none() {
        let bytes = [0u8; 6];
        let buf = ByteBuffer::new(&bytes);
        assert_eq!(buf.u64_at(0), None);
        assert_eq!(buf.u32_at(2), Some(0));
        assert_eq!(buf.u32_at(3), None);
        assert_eq!(buf.f32_at(usize::MAX), None);
    }
}
