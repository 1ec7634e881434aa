//! Well-formed records for tests.
//!
//! Field values are taken from a record observed in a live host, with heap
//! pointers rebased around [`REFERENCE`].

use crate::error::Result;
use crate::memory::SnapshotMemory;
use crate::memory::layout::legacy;
use crate::scan::record::{Link, PointerPair, TruckRecord};

/// Reference address used by fixtures (a typical heap address)
pub const REFERENCE: u64 = 0x0000_0200_0000_0000;

/// Somewhere inside the default read-only range
pub const READ_ONLY_POINTER: u64 = 0x0000_7FF6_1234_5000;

/// Heap pointer inside the default validity window but far from any
/// fixture segment
pub const HEAP_POINTER: u64 = REFERENCE + 0x4000_0000;

#[derive(Debug, Clone)]
pub struct TruckFixture {
    record: TruckRecord,
}

impl TruckFixture {
    /// Record with every optional heap link populated
    pub fn paired() -> Self {
        let link = |n: u64, len: u64| Link {
            pointers: PointerPair {
                read_only: READ_ONLY_POINTER + n * 0x40,
                writable: HEAP_POINTER + n * 0x1000,
            },
            lengths: [len, len],
        };

        Self {
            record: TruckRecord {
                prefield_pointer: READ_ONLY_POINTER,
                prefield_counter: 0xA400_0006,
                prefield_zero: 0,
                primary_link: link(0, 1),
                data_pointer: HEAP_POINTER + 0x800,
                int_float_pairs: [(52_873, 0.50), (1007, 0.12), (1990, 72.15), (2350, 0.54)],
                pointer_pair: PointerPair {
                    read_only: READ_ONLY_POINTER + 0x100,
                    writable: HEAP_POINTER + 0x8000,
                },
                counters: [16, 32],
                aux_float: 38.44,
                secondary_links: [link(1, 3), link(2, 6), link(3, 6), link(4, 6)],
                signed_floats: [-1.0, 0.01, -1.0, -1.0],
                scale: 7856.0,
                tank_capacity: 681.4,
                adblue_capacity: 80.0,
                fuel_fill: 0.21,
                adblue_fill: 0.23,
            },
        }
    }

    /// Record with every optional heap link zeroed
    pub fn nulled() -> Self {
        let mut fixture = Self::paired();
        let record = &mut fixture.record;
        record.prefield_counter = 0x0400_0000;
        record.pointer_pair.writable = 0;
        for link in std::iter::once(&mut record.primary_link).chain(&mut record.secondary_links) {
            link.pointers.writable = 0;
            link.lengths = [0, link.lengths[1]];
        }
        fixture
    }

    pub fn tank_capacity(mut self, capacity: f32) -> Self {
        self.record.tank_capacity = capacity;
        self
    }

    pub fn adblue_capacity(mut self, capacity: f32) -> Self {
        self.record.adblue_capacity = capacity;
        self
    }

    pub fn record(&self) -> TruckRecord {
        self.record
    }

    pub fn write(&self, memory: &mut SnapshotMemory, address: u64) -> Result<()> {
        memory.write_bytes(address, &self.record.encode())
    }
}

/// Older indirect structure: a pointer to a 54-word block
#[derive(Debug, Clone)]
pub struct LegacyFixture {
    words: [u64; legacy::WORDS],
}

impl LegacyFixture {
    pub fn new(tank_capacity: f32) -> Self {
        let mut words = [0x1111u64; legacy::WORDS];
        for &w in legacy::ZERO_WORDS {
            words[w] = 0;
        }
        for &w in legacy::WRITABLE_POINTER_WORDS {
            words[w] = HEAP_POINTER + (w as u64) * 0x100;
        }
        for &w in legacy::READ_ONLY_POINTER_WORDS {
            words[w] = READ_ONLY_POINTER + (w as u64) * 0x10;
        }
        words[legacy::TANK_CAPACITY_WORD] = u64::from(tank_capacity.to_bits());
        Self { words }
    }

    pub fn word(mut self, index: usize, value: u64) -> Self {
        self.words[index] = value;
        self
    }

    pub fn write(&self, memory: &mut SnapshotMemory, address: u64) -> Result<()> {
        let bytes: Vec<u8> = self.words.iter().flat_map(|w| w.to_le_bytes()).collect();
        memory.write_bytes(address, &bytes)
    }
}
