//! Typed view of the truck record, decoded by explicit offsets.

use crate::memory::ByteBuffer;
use crate::memory::layout::truck::*;

/// Pointer into the read-only image paired with a pointer into the heap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerPair {
    pub read_only: u64,
    pub writable: u64,
}

/// Pointer pair followed by two lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Link {
    pub pointers: PointerPair,
    pub lengths: [u64; 2],
}

/// Whether optional heap links are populated in a record
///
/// A record is self-consistent: either every link carries a heap pointer or
/// every link has it zeroed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    Paired,
    Nulled,
}

impl LinkMode {
    pub fn of(link: &Link) -> Self {
        if link.pointers.writable == 0 {
            LinkMode::Nulled
        } else {
            LinkMode::Paired
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TruckRecord {
    pub prefield_pointer: u64,
    pub prefield_counter: u32,
    pub prefield_zero: u32,
    pub primary_link: Link,
    pub data_pointer: u64,
    pub int_float_pairs: [(i32, f32); INT_FLOAT_PAIR_COUNT],
    pub pointer_pair: PointerPair,
    pub counters: [u32; COUNTER_COUNT],
    pub aux_float: f32,
    pub secondary_links: [Link; SECONDARY_LINK_COUNT],
    pub signed_floats: [f32; SIGNED_FLOAT_COUNT],
    pub scale: f32,
    pub tank_capacity: f32,
    pub adblue_capacity: f32,
    pub fuel_fill: f32,
    pub adblue_fill: f32,
}

fn decode_pair(buf: &ByteBuffer<'_>, offset: usize) -> Option<PointerPair> {
    Some(PointerPair {
        read_only: buf.u64_at(offset)?,
        writable: buf.u64_at(offset + 8)?,
    })
}

fn decode_link(buf: &ByteBuffer<'_>, offset: usize) -> Option<Link> {
    Some(Link {
        pointers: decode_pair(buf, offset)?,
        lengths: [buf.u64_at(offset + 16)?, buf.u64_at(offset + 24)?],
    })
}

impl TruckRecord {
    /// Decode a record from `SIZE` bytes; `None` if the buffer is short
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < SIZE {
            return None;
        }
        let buf = ByteBuffer::new(bytes);

        let mut int_float_pairs = [(0, 0.0); INT_FLOAT_PAIR_COUNT];
        for (i, pair) in int_float_pairs.iter_mut().enumerate() {
            let offset = INT_FLOAT_PAIRS + i * PAIR_SIZE;
            *pair = (buf.i32_at(offset)?, buf.f32_at(offset + 4)?);
        }

        let mut counters = [0; COUNTER_COUNT];
        for (i, counter) in counters.iter_mut().enumerate() {
            *counter = buf.u32_at(COUNTERS + i * 4)?;
        }

        let mut secondary_links = [Link::default(); SECONDARY_LINK_COUNT];
        for (i, link) in secondary_links.iter_mut().enumerate() {
            *link = decode_link(&buf, SECONDARY_LINKS + i * LINK_SIZE)?;
        }

        let mut signed_floats = [0.0; SIGNED_FLOAT_COUNT];
        for (i, value) in signed_floats.iter_mut().enumerate() {
            *value = buf.f32_at(SIGNED_FLOATS + i * 4)?;
        }

        Some(Self {
            prefield_pointer: buf.u64_at(PREFIELD_POINTER)?,
            prefield_counter: buf.u32_at(PREFIELD_COUNTER)?,
            prefield_zero: buf.u32_at(PREFIELD_ZERO)?,
            primary_link: decode_link(&buf, PRIMARY_LINK)?,
            data_pointer: buf.u64_at(DATA_POINTER)?,
            int_float_pairs,
            pointer_pair: decode_pair(&buf, POINTER_PAIR)?,
            counters,
            aux_float: buf.f32_at(AUX_PAIR + 4)?,
            secondary_links,
            signed_floats,
            scale: buf.f32_at(SCALE)?,
            tank_capacity: buf.f32_at(TANK_CAPACITY)?,
            adblue_capacity: buf.f32_at(ADBLUE_CAPACITY)?,
            fuel_fill: buf.f32_at(FUEL_FILL)?,
            adblue_fill: buf.f32_at(ADBLUE_FILL)?,
        })
    }

    /// Encode into `SIZE` bytes; fields the record does not model are zero
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![0u8; SIZE];
        let mut put = |offset: usize, bytes: &[u8]| {
            out[offset..offset + bytes.len()].copy_from_slice(bytes);
        };

        let pair_bytes = |pair: &PointerPair| {
            let mut b = [0u8; 16];
            b[..8].copy_from_slice(&pair.read_only.to_le_bytes());
            b[8..].copy_from_slice(&pair.writable.to_le_bytes());
            b
        };
        let link_bytes = |link: &Link| {
            let mut b = [0u8; LINK_SIZE];
            b[..16].copy_from_slice(&pair_bytes(&link.pointers));
            b[16..24].copy_from_slice(&link.lengths[0].to_le_bytes());
            b[24..].copy_from_slice(&link.lengths[1].to_le_bytes());
            b
        };

        put(PREFIELD_POINTER, &self.prefield_pointer.to_le_bytes());
        put(PREFIELD_COUNTER, &self.prefield_counter.to_le_bytes());
        put(PREFIELD_ZERO, &self.prefield_zero.to_le_bytes());
        put(PRIMARY_LINK, &link_bytes(&self.primary_link));
        put(DATA_POINTER, &self.data_pointer.to_le_bytes());
        for (i, (int, float)) in self.int_float_pairs.iter().enumerate() {
            let offset = INT_FLOAT_PAIRS + i * PAIR_SIZE;
            put(offset, &int.to_le_bytes());
            put(offset + 4, &float.to_le_bytes());
        }
        put(POINTER_PAIR, &pair_bytes(&self.pointer_pair));
        for (i, counter) in self.counters.iter().enumerate() {
            put(COUNTERS + i * 4, &counter.to_le_bytes());
        }
        put(AUX_PAIR + 4, &self.aux_float.to_le_bytes());
        for (i, link) in self.secondary_links.iter().enumerate() {
            put(SECONDARY_LINKS + i * LINK_SIZE, &link_bytes(link));
        }
        for (i, value) in self.signed_floats.iter().enumerate() {
            put(SIGNED_FLOATS + i * 4, &value.to_le_bytes());
        }
        put(SCALE, &self.scale.to_le_bytes());
        put(TANK_CAPACITY, &self.tank_capacity.to_le_bytes());
        put(ADBLUE_CAPACITY, &self.adblue_capacity.to_le_bytes());
        put(FUEL_FILL, &self.fuel_fill.to_le_bytes());
        put(ADBLUE_FILL, &self.adblue_fill.to_le_bytes());
        out
    }
}
