//! Memory layout constants for the host's truck data structures
//!
//! This module centralizes all byte offsets used for decoding candidate
//! structures. Constants are organized by structure type. All layouts assume
//! a 64-bit little-endian host.

/// Pointer-sized word (8 bytes)
pub const WORD: u64 = 8;

/// Truck record holding the tank capacities
///
/// ```text
///   0 ┌──────────────┬─────────┬─────────┐
///     │ ro pointer   │ nz u32  │ zero u32│  prefields
///  16 ├──────────────┴─────────┴─────────┤
///     │ primary link (ro, rw, len, len)  │  selects nulled/paired mode
///  48 ├──────────────────────────────────┤
///     │ data pointer (rw)                │
///  56 ├──────────────────────────────────┤
///     │ 4 x (i32, f32)                   │
///  88 ├──────────────────────────────────┤
///     │ pointer pair (ro, rw)            │
/// 104 ├──────────────────────────────────┤
///     │ 2 x u32 counters, (i32, f32)     │
/// 120 ├──────────────────────────────────┤
///     │ 4 x link                         │
/// 248 ├──────────────────────────────────┤
///     │ 4 x f32 in [-1, 1], u64 opaque   │
/// 272 ├──────────────────────────────────┤
///     │ scale, TANK CAP, ADBLUE CAP, ... │
/// 300 ├──────────────────────────────────┤
///     │ fuel fill, adblue fill, ...      │
/// 320 └──────────────────────────────────┘
/// ```
pub mod truck {
    /// Total record size including trailing alignment padding
    pub const SIZE: usize = 320;

    /// Size of a link (pointer pair followed by two u64 lengths)
    pub const LINK_SIZE: usize = 32;
    /// Size of an (i32, f32) pair
    pub const PAIR_SIZE: usize = 8;

    // Prefields
    pub const PREFIELD_POINTER: usize = 0;
    pub const PREFIELD_COUNTER: usize = 8;
    pub const PREFIELD_ZERO: usize = 12;

    /// Link whose writable pointer selects nulled or paired mode
    pub const PRIMARY_LINK: usize = 16;
    pub const DATA_POINTER: usize = 48;

    pub const INT_FLOAT_PAIRS: usize = 56;
    pub const INT_FLOAT_PAIR_COUNT: usize = 4;

    pub const POINTER_PAIR: usize = 88;

    pub const COUNTERS: usize = 104;
    pub const COUNTER_COUNT: usize = 2;

    pub const AUX_PAIR: usize = 112;

    pub const SECONDARY_LINKS: usize = 120;
    pub const SECONDARY_LINK_COUNT: usize = 4;

    pub const SIGNED_FLOATS: usize = 248;
    pub const SIGNED_FLOAT_COUNT: usize = 4;

    pub const SCALE: usize = 272;
    /// Fuel tank capacity (the value being recovered)
    pub const TANK_CAPACITY: usize = 276;
    /// AdBlue tank capacity (matches the documented telemetry attribute)
    pub const ADBLUE_CAPACITY: usize = 280;

    pub const FUEL_FILL: usize = 300;
    pub const ADBLUE_FILL: usize = 304;
}

/// Older, sparser structure reached through one extra indirection
pub mod legacy {
    /// Number of words probed and decoded
    pub const WORDS: usize = 54;
    pub const SIZE: usize = WORDS * 8;

    /// Word whose low 4 bytes hold the tank capacity as f32
    pub const TANK_CAPACITY_WORD: usize = 53;

    pub const ZERO_WORDS: &[usize] = &[9, 10, 11, 19, 20, 21, 27, 28, 29, 31, 32, 33, 40, 43, 46, 52];

    /// Words 3 and 6 also hold writable pointers most of the time, but not reliably
    pub const WRITABLE_POINTER_WORDS: &[usize] = &[15, 23, 36, 48];

    pub const READ_ONLY_POINTER_WORDS: &[usize] = &[
        0, 2, 5, 8, 14, 18, 22, 26, 30, 35, 38, 39, 41, 42, 44, 45, 47,
    ];
}
