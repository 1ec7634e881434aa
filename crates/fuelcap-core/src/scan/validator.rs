//! Structural fingerprint check for truck record candidates.
//!
//! Checks run cheapest and most discriminating first: the capacity range and
//! the exact anchor match reject nearly every random heap block, so the
//! pointer-shape checks only run on a handful of candidates per scan.

use serde::Serialize;
use strum::{Display, IntoStaticStr};
use tracing::{debug, trace};

use crate::config::FieldBounds;
use crate::memory::MemoryAccessor;
use crate::memory::layout::truck;
use crate::scan::record::{Link, LinkMode, PointerPair as Pair, TruckRecord};
use crate::scan::window::AddressSpaceModel;

/// First check a candidate failed
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RejectReason {
    Unreadable,
    TankCapacity,
    AnchorMismatch,
    Prefields,
    PrimaryLink,
    DataPointer,
    PointerPair,
    SecondaryLinks,
    IntFloatPairs,
    Counters,
    AuxFloat,
    SignedFloats,
    Scale,
    FillFractions,
    LegacyUnreadable,
    LegacyTankCapacity,
    LegacyZeroWords,
    LegacyWritablePointers,
    LegacyReadOnlyPointers,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// Candidate matched; carries the tank capacity
    Accept(f32),
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept(_))
    }

    pub fn value(&self) -> Option<f32> {
        match self {
            Verdict::Accept(v) => Some(*v),
            Verdict::Reject(_) => None,
        }
    }
}

impl From<Result<f32, RejectReason>> for Verdict {
    fn from(result: Result<f32, RejectReason>) -> Self {
        match result {
            Ok(v) => Verdict::Accept(v),
            Err(reason) => Verdict::Reject(reason),
        }
    }
}

/// Record checks in evaluation order: cheap and discriminating first
pub const RECORD_CHECKS: [RejectReason; 13] = [
    RejectReason::TankCapacity,
    RejectReason::AnchorMismatch,
    RejectReason::Prefields,
    RejectReason::PrimaryLink,
    RejectReason::DataPointer,
    RejectReason::PointerPair,
    RejectReason::SecondaryLinks,
    RejectReason::IntFloatPairs,
    RejectReason::Counters,
    RejectReason::AuxFloat,
    RejectReason::SignedFloats,
    RejectReason::Scale,
    RejectReason::FillFractions,
];

pub(crate) fn ensure(ok: bool, reason: RejectReason) -> Result<(), RejectReason> {
    if ok { Ok(()) } else { Err(reason) }
}

pub struct StructureValidator<'a, M: MemoryAccessor + ?Sized> {
    memory: &'a M,
    model: &'a AddressSpaceModel,
    bounds: &'a FieldBounds,
}

impl<'a, M: MemoryAccessor + ?Sized> StructureValidator<'a, M> {
    pub fn new(memory: &'a M, model: &'a AddressSpaceModel, bounds: &'a FieldBounds) -> Self {
        Self {
            memory,
            model,
            bounds,
        }
    }

    /// Validate the record at `candidate` against the known AdBlue capacity
    pub fn validate(&self, candidate: u64, anchor: f32) -> Verdict {
        let Some(bytes) = self.memory.fetch(candidate, truck::SIZE) else {
            trace!("Candidate 0x{:X} unreadable", candidate);
            return Verdict::Reject(RejectReason::Unreadable);
        };
        let Some(record) = TruckRecord::decode(&bytes) else {
            return Verdict::Reject(RejectReason::Unreadable);
        };

        let verdict = Verdict::from(self.check(&record, anchor));
        if let Verdict::Reject(reason) = verdict {
            if reason > RejectReason::Prefields {
                // Survived capacity, anchor and prefields: worth a look
                debug!("[0x{:X}] Near miss: {}", candidate, reason);
            } else {
                trace!("[0x{:X}] Rejected: {}", candidate, reason);
            }
        }
        verdict
    }

    /// Run every field check on an already decoded record
    pub fn check(&self, record: &TruckRecord, anchor: f32) -> Result<f32, RejectReason> {
        for check in RECORD_CHECKS {
            ensure(self.passes(record, anchor, check), check)?;
        }
        Ok(record.tank_capacity)
    }

    /// Whether `record` passes the single check named by `check`
    ///
    /// Reasons that are not record field checks always pass.
    pub fn passes(&self, record: &TruckRecord, anchor: f32, check: RejectReason) -> bool {
        use RejectReason::*;
        let b = self.bounds;
        let mode = LinkMode::of(&record.primary_link);

        match check {
            TankCapacity => b.tank_capacity.contains(record.tank_capacity),
            AnchorMismatch => record.adblue_capacity == anchor,
            Prefields => {
                self.model.is_read_only_pointer(record.prefield_pointer)
                    && record.prefield_counter != 0
                    && record.prefield_zero == 0
            }
            PrimaryLink => self.link_ok(&record.primary_link, mode),
            DataPointer => self.model.is_writable_pointer(record.data_pointer),
            PointerPair => self.pair_ok(&record.pointer_pair, mode),
            SecondaryLinks => record
                .secondary_links
                .iter()
                .all(|link| self.link_ok(link, mode)),
            IntFloatPairs => record
                .int_float_pairs
                .iter()
                .zip(&b.int_float_pairs)
                .all(|(&(int, float), bounds)| bounds.contains(int, float)),
            Counters => record
                .counters
                .iter()
                .all(|&c| u64::from(c) <= b.max_count),
            AuxFloat => b.aux_float.contains(record.aux_float),
            SignedFloats => record
                .signed_floats
                .iter()
                .all(|&v| b.signed_floats.contains(v)),
            Scale => b.scale.contains(record.scale),
            FillFractions => {
                b.fill_fraction.contains(record.fuel_fill)
                    && b.fill_fraction.contains(record.adblue_fill)
            }
            Unreadable | LegacyUnreadable | LegacyTankCapacity | LegacyZeroWords
            | LegacyWritablePointers | LegacyReadOnlyPointers => true,
        }
    }

    fn pair_ok(&self, pair: &Pair, mode: LinkMode) -> bool {
        if !self.model.is_read_only_pointer(pair.read_only) {
            return false;
        }
        match mode {
            LinkMode::Nulled => pair.writable == 0,
            LinkMode::Paired => self.model.is_writable_pointer(pair.writable),
        }
    }

    fn link_ok(&self, link: &Link, mode: LinkMode) -> bool {
        if !self.pair_ok(&link.pointers, mode) {
            return false;
        }
        let [first, second] = link.lengths;
        match mode {
            // Second length may still be set when the heap pointer is gone
            LinkMode::Nulled => first == 0 && second <= self.bounds.max_count,
            LinkMode::Paired => first != 0 && first == second && first <= self.bounds.max_count,
        }
    }
}
