//! # fuelcap-core
//!
//! Recovers a truck's real fuel tank capacity from the host simulator's own
//! memory.
//!
//! The host documents a `fuel.capacity` attribute that is wrong for many
//! modded trucks, while the in-memory truck record holds the value actually
//! used by the simulation. This crate provides:
//! - Probing memory access (`MemoryAccessor`), for the live process and for
//!   offline dumps
//! - A distance-ordered pointer walk around a reference address
//! - A structural fingerprint that accepts only records matching the known
//!   AdBlue capacity
//! - Shared telemetry state for publishing the recovered value
//!
//! ## Feature Flags
//!
//! - `debug-tools`: Enables field-by-field record inspection for the CLI.

pub mod config;
pub mod controller;
#[cfg(feature = "debug-tools")]
pub mod debug;
pub mod error;
pub mod memory;
pub mod scan;
pub mod telemetry;

pub use config::{Bounds, FieldBounds, PairBounds, ScanConfig, ScanConfigBuilder};
pub use controller::{ControllerPhase, ScanController};
pub use error::{Error, Result};
pub use memory::{ByteBuffer, LocalMemory, MemoryAccessor, SnapshotMemory, SnapshotMemoryBuilder};
pub use scan::{
    AddressSpaceModel, CandidateScanner, Detection, Direction, ExhaustReason, Fingerprint,
    LegacyValidator, MemoryWindow, RejectReason, ScanOutcome, ScanReport, ScanState,
    StructureValidator, TruckRecord, Verdict,
};
pub use telemetry::{
    ConfigurationEvent, NamedValue, SharedTelemetry, TruckTelemetry, Value, ValueType,
};

// Debug utilities (requires debug-tools feature)
#[cfg(feature = "debug-tools")]
pub use debug::{FieldCheck, StructureInspection, inspect_structure};
