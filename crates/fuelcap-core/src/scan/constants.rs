//! Default scan constants
//!
//! # Search Strategy
//!
//! The host hands us one trustworthy address per configuration event: the
//! attribute list of the event payload. It lives in the same heap as the truck
//! record we want, so we walk outward from it word by word and follow every
//! word that looks like a heap pointer.
//!
//! ```text
//!                     Address space around the reference
//! ┌──────────────────────────────────────────────────────────────┐
//! │ ref - 64 GiB            validity window            ref + 64 GiB│
//! │        ┌───────────── search window ─────────────┐           │
//! │        │ ref - 32 MiB   ...  ref  ...   ref + 32 MiB│           │
//! │        └──────────────────────────────────────────┘           │
//! └──────────────────────────────────────────────────────────────┘
//!   read-only image:  0x7FF0_0000_0000 ..= 0x7FFF_0000_0000
//! ```
//!
//! # Empirical Bounds
//!
//! Field ranges come from inspecting one host build. They are a fingerprint,
//! not a contract, which is why every one of them is configurable.

/// Half-width of the window a writable pointer must fall in (64 GiB)
pub const DEFAULT_VALIDITY_RADIUS: u64 = 0x10_0000_0000;

/// Half-width of the region actually scanned (32 MiB, ~8M words)
pub const DEFAULT_SEARCH_RADIUS: u64 = 0x200_0000;

/// Hard ceiling on scan steps, independent of the window arithmetic
pub const DEFAULT_GUARD_LIMIT: u64 = 0x1FFF_FFFF;

/// Lowest address of the host's read-only image
pub const READ_ONLY_MIN: u64 = 0x0000_7FF0_0000_0000;
/// Highest address of the host's read-only image
pub const READ_ONLY_MAX: u64 = 0x0000_7FFF_0000_0000;

/// Published when the configuration event carries no fuel capacity
pub const DEFAULT_FUEL_CAPACITY: f32 = 200.0;
/// Anchor used when the configuration event carries no AdBlue capacity
pub const DEFAULT_ADBLUE_CAPACITY: f32 = 80.0;

/// Upper bound for link lengths and small counters
pub const MAX_SMALL_COUNT: u64 = 10_000;

pub const TANK_CAPACITY_MIN: f32 = 30.0;
pub const TANK_CAPACITY_MAX: f32 = 5000.0;

/// The legacy structure was only ever seen holding large tanks
pub const LEGACY_TANK_CAPACITY_MIN: f32 = 200.0;
