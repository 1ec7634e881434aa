//! Fallback fingerprint for the older, sparser capacity structure.
//!
//! Only one copy of this structure exists and few pointers lead to it, but it
//! holds little besides the tank capacity. Matching is driven by word tables
//! instead of a decoded record: listed words must be zero, heap pointers, or
//! read-only pointers. The AdBlue anchor is not part of this structure.

use tracing::{debug, trace};

use crate::config::FieldBounds;
use crate::memory::layout::legacy::*;
use crate::memory::{ByteBuffer, MemoryAccessor};
use crate::scan::validator::{RejectReason, Verdict, ensure};
use crate::scan::window::AddressSpaceModel;

pub struct LegacyValidator<'a, M: MemoryAccessor + ?Sized> {
    memory: &'a M,
    model: &'a AddressSpaceModel,
    bounds: &'a FieldBounds,
}

impl<'a, M: MemoryAccessor + ?Sized> LegacyValidator<'a, M> {
    pub fn new(memory: &'a M, model: &'a AddressSpaceModel, bounds: &'a FieldBounds) -> Self {
        Self {
            memory,
            model,
            bounds,
        }
    }

    /// Address of the block `candidate` points to, if readable
    pub fn target(&self, candidate: u64) -> Option<u64> {
        self.memory.read_word(candidate)
    }

    /// Follow `candidate` one level and check the block behind it
    pub fn validate(&self, candidate: u64) -> Verdict {
        let Some(target) = self.target(candidate) else {
            return Verdict::Reject(RejectReason::LegacyUnreadable);
        };
        let Some(bytes) = self.memory.fetch(target, SIZE) else {
            trace!("Legacy block 0x{:X} (via 0x{:X}) unreadable", target, candidate);
            return Verdict::Reject(RejectReason::LegacyUnreadable);
        };

        let verdict = Verdict::from(self.check(&bytes));
        match verdict {
            Verdict::Accept(capacity) => {
                debug!(
                    "Legacy structure matched at 0x{:X} (via 0x{:X}), capacity {:.4}",
                    target, candidate, capacity
                );
            }
            Verdict::Reject(RejectReason::LegacyTankCapacity) => {}
            Verdict::Reject(reason) => {
                debug!("[0x{:X}] Legacy near miss: {}", target, reason);
            }
        }
        verdict
    }

    fn check(&self, bytes: &[u8]) -> Result<f32, RejectReason> {
        use RejectReason::*;
        let buf = ByteBuffer::new(bytes);
        let word = |index: usize| buf.u64_at(index * 8);

        let capacity = buf
            .f32_at(TANK_CAPACITY_WORD * 8)
            .ok_or(LegacyUnreadable)?;
        ensure(
            self.bounds.legacy_tank_capacity.contains_exclusive(capacity),
            LegacyTankCapacity,
        )?;
        ensure(
            ZERO_WORDS.iter().all(|&i| word(i) == Some(0)),
            LegacyZeroWords,
        )?;
        ensure(
            WRITABLE_POINTER_WORDS
                .iter()
                .all(|&i| word(i).is_some_and(|v| self.model.is_writable_pointer(v))),
            LegacyWritablePointers,
        )?;
        ensure(
            READ_ONLY_POINTER_WORDS
                .iter()
                .all(|&i| word(i).is_some_and(|v| self.model.read_only.contains_below_high(v))),
            LegacyReadOnlyPointers,
        )?;

        Ok(capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::memory::SnapshotMemory;
    use crate::scan::fixture::{LegacyFixture, REFERENCE};

    fn memory_with(fixture: &LegacyFixture) -> SnapshotMemory {
        let mut memory = SnapshotMemory::builder()
            .zeroed(REFERENCE, 0x4000)
            .build()
            .unwrap();
        memory.write_u64(REFERENCE + 0x100, REFERENCE + 0x1000).unwrap();
        fixture.write(&mut memory, REFERENCE + 0x1000).unwrap();
        memory
    }

    fn validate(fixture: &LegacyFixture) -> Verdict {
        let config = ScanConfig::default();
        let model = AddressSpaceModel::new(REFERENCE, &config);
        let memory = memory_with(fixture);
        LegacyValidator::new(&memory, &model, &config.bounds).validate(REFERENCE + 0x100)
    }

    #[test]
    fn test_follows_pointer_and_accepts() {
        assert_eq!(validate(&LegacyFixture::new(681.4)), Verdict::Accept(681.4));
    }

    #[test]
    fn test_small_tank_rejected() {
        assert_eq!(
            validate(&LegacyFixture::new(150.0)),
            Verdict::Reject(RejectReason::LegacyTankCapacity)
        );
    }

    #[test]
    fn test_capacity_range_is_open() {
        for capacity in [200.0, 5000.0] {
            assert_eq!(
                validate(&LegacyFixture::new(capacity)),
                Verdict::Reject(RejectReason::LegacyTankCapacity),
                "capacity {capacity}"
            );
        }
        assert_eq!(validate(&LegacyFixture::new(200.5)), Verdict::Accept(200.5));
        assert_eq!(validate(&LegacyFixture::new(4999.5)), Verdict::Accept(4999.5));
    }

    #[test]
    fn test_read_only_upper_end_excluded() {
        let config = ScanConfig::default();
        let fixture =
            LegacyFixture::new(681.4).word(READ_ONLY_POINTER_WORDS[0], config.read_only_range.max);
        assert_eq!(
            validate(&fixture),
            Verdict::Reject(RejectReason::LegacyReadOnlyPointers)
        );

        let fixture =
            LegacyFixture::new(681.4).word(READ_ONLY_POINTER_WORDS[0], config.read_only_range.min);
        assert_eq!(validate(&fixture), Verdict::Accept(681.4));
    }

    #[test]
    fn test_word_tables_enforced() {
        let fixture = LegacyFixture::new(681.4).word(ZERO_WORDS[3], 7);
        assert_eq!(
            validate(&fixture),
            Verdict::Reject(RejectReason::LegacyZeroWords)
        );

        let fixture = LegacyFixture::new(681.4).word(WRITABLE_POINTER_WORDS[0], 0);
        assert_eq!(
            validate(&fixture),
            Verdict::Reject(RejectReason::LegacyWritablePointers)
        );

        let fixture = LegacyFixture::new(681.4).word(READ_ONLY_POINTER_WORDS[5], REFERENCE);
        assert_eq!(
            validate(&fixture),
            Verdict::Reject(RejectReason::LegacyReadOnlyPointers)
        );
    }

    #[test]
    fn test_dangling_target_unreadable() {
        let config = ScanConfig::default();
        let model = AddressSpaceModel::new(REFERENCE, &config);
        let mut memory = memory_with(&LegacyFixture::new(681.4));
        memory.write_u64(REFERENCE + 0x100, REFERENCE + 0x10_0000).unwrap();

        let validator = LegacyValidator::new(&memory, &model, &config.bounds);
        assert_eq!(
            validator.validate(REFERENCE + 0x100),
            Verdict::Reject(RejectReason::LegacyUnreadable)
        );
    }
}
