//! Field-by-field inspection of a candidate record
//!
//! Unlike [`StructureValidator::validate`], which stops at the first failed
//! check, inspection evaluates every check so a near miss shows exactly which
//! fields drifted from the fingerprint.

use serde::Serialize;

use crate::config::FieldBounds;
use crate::error::{Error, Result};
use crate::memory::MemoryAccessor;
use crate::memory::layout::truck;
use crate::scan::{
    AddressSpaceModel, LinkMode, RECORD_CHECKS, RejectReason, StructureValidator, TruckRecord,
};

/// Outcome of one record check
#[derive(Debug, Clone, Serialize)]
pub struct FieldCheck {
    pub check: RejectReason,
    pub passed: bool,
    /// Human-readable field values the check looked at
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StructureInspection {
    pub address: u64,
    pub link_mode: String,
    pub tank_capacity: f32,
    pub adblue_capacity: f32,
    pub checks: Vec<FieldCheck>,
}

impl StructureInspection {
    /// First failed check in evaluation order
    pub fn first_failure(&self) -> Option<RejectReason> {
        self.checks.iter().find(|c| !c.passed).map(|c| c.check)
    }

    pub fn passed(&self) -> bool {
        self.first_failure().is_none()
    }
}

/// Decode the record at `address` and run every check against it
pub fn inspect_structure<M: MemoryAccessor + ?Sized>(
    memory: &M,
    model: &AddressSpaceModel,
    bounds: &FieldBounds,
    address: u64,
    anchor: f32,
) -> Result<StructureInspection> {
    let unmapped = || Error::UnmappedMemory {
        address,
        len: truck::SIZE,
    };
    let bytes = memory.fetch(address, truck::SIZE).ok_or_else(unmapped)?;
    let record = TruckRecord::decode(&bytes).ok_or_else(unmapped)?;
    let validator = StructureValidator::new(memory, model, bounds);

    let checks = RECORD_CHECKS
        .iter()
        .map(|&check| FieldCheck {
            check,
            passed: validator.passes(&record, anchor, check),
            detail: describe(&record, anchor, check),
        })
        .collect();

    Ok(StructureInspection {
        address,
        link_mode: match LinkMode::of(&record.primary_link) {
            LinkMode::Paired => "paired".into(),
            LinkMode::Nulled => "nulled".into(),
        },
        tank_capacity: record.tank_capacity,
        adblue_capacity: record.adblue_capacity,
        checks,
    })
}

fn describe(record: &TruckRecord, anchor: f32, check: RejectReason) -> String {
    use RejectReason::*;
    let link = |l: &crate::scan::Link| {
        format!(
            "0x{:X}/0x{:X} [{}, {}]",
            l.pointers.read_only, l.pointers.writable, l.lengths[0], l.lengths[1]
        )
    };

    match check {
        TankCapacity => format!("{:.4}", record.tank_capacity),
        AnchorMismatch => format!("{:.4} (expected {:.4})", record.adblue_capacity, anchor),
        Prefields => format!(
            "0x{:X} {} {}",
            record.prefield_pointer, record.prefield_counter, record.prefield_zero
        ),
        PrimaryLink => link(&record.primary_link),
        DataPointer => format!("0x{:X}", record.data_pointer),
        PointerPair => format!(
            "0x{:X}/0x{:X}",
            record.pointer_pair.read_only, record.pointer_pair.writable
        ),
        SecondaryLinks => record
            .secondary_links
            .iter()
            .map(link)
            .collect::<Vec<_>>()
            .join(", "),
        IntFloatPairs => record
            .int_float_pairs
            .iter()
            .map(|(i, f)| format!("({i}, {f:.4})"))
            .collect::<Vec<_>>()
            .join(" "),
        Counters => format!("{:?}", record.counters),
        AuxFloat => format!("{:.4}", record.aux_float),
        SignedFloats => format!("{:?}", record.signed_floats),
        Scale => format!("{:.4}", record.scale),
        FillFractions => format!("{:.4} / {:.4}", record.fuel_fill, record.adblue_fill),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::memory::SnapshotMemory;
    use crate::scan::fixture::{REFERENCE, TruckFixture};

    fn inspect(fixture: TruckFixture, anchor: f32) -> StructureInspection {
        let config = ScanConfig::default();
        let model = AddressSpaceModel::new(REFERENCE, &config);
        let mut memory = SnapshotMemory::builder()
            .zeroed(REFERENCE, 0x1000)
            .build()
            .unwrap();
        fixture.write(&mut memory, REFERENCE).unwrap();
        inspect_structure(&memory, &model, &config.bounds, REFERENCE, anchor).unwrap()
    }

    #[test]
    fn test_valid_record_passes_every_check() {
        let inspection = inspect(TruckFixture::nulled(), 80.0);
        assert!(inspection.passed());
        assert_eq!(inspection.link_mode, "nulled");
        assert_eq!(inspection.checks.len(), RECORD_CHECKS.len());
    }

    #[test]
    fn test_reports_every_failure() {
        let inspection = inspect(TruckFixture::paired().tank_capacity(10.0), 60.0);
        let failed: Vec<_> = inspection
            .checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.check)
            .collect();
        assert_eq!(
            failed,
            vec![RejectReason::TankCapacity, RejectReason::AnchorMismatch]
        );
        assert_eq!(inspection.first_failure(), Some(RejectReason::TankCapacity));
        assert_eq!(inspection.checks[1].detail, "80.0000 (expected 60.0000)");
    }

    #[test]
    fn test_unmapped_address_is_error() {
        let config = ScanConfig::default();
        let model = AddressSpaceModel::new(REFERENCE, &config);
        let memory = SnapshotMemory::default();
        let err = inspect_structure(&memory, &model, &config.bounds, REFERENCE, 80.0).unwrap_err();
        assert!(err.is_unmapped());
    }

    /// Reads succeed but nothing is reported readable
    struct HiddenPages(std::cell::Cell<usize>);

    impl MemoryAccessor for HiddenPages {
        fn probe(&self, _address: u64, _len: usize) -> bool {
            false
        }

        fn read_into(&self, _address: u64, buf: &mut [u8]) -> Result<()> {
            self.0.set(self.0.get() + 1);
            buf.fill(0);
            Ok(())
        }
    }

    #[test]
    fn test_unreadable_record_is_never_read() {
        let config = ScanConfig::default();
        let model = AddressSpaceModel::new(REFERENCE, &config);
        let memory = HiddenPages(std::cell::Cell::new(0));
        let err = inspect_structure(&memory, &model, &config.bounds, REFERENCE, 80.0).unwrap_err();
        assert!(err.is_unmapped());
        assert_eq!(memory.0.get(), 0);
    }
}
