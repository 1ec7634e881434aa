//! Address windows derived from the reference address.

use serde::Serialize;

use crate::config::{Bounds, ScanConfig};

/// Inclusive `[low, high]` address range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryWindow {
    pub low: u64,
    pub high: u64,
}

impl MemoryWindow {
    /// Window of `radius` bytes on each side of `center`, clamped to the
    /// address space
    pub fn around(center: u64, radius: u64) -> Self {
        Self {
            low: center.saturating_sub(radius),
            high: center.saturating_add(radius),
        }
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.low && address <= self.high
    }

    /// `[low, high)` test
    pub fn contains_below_high(&self, address: u64) -> bool {
        address >= self.low && address < self.high
    }

    /// Intersection of two windows, or `None` when disjoint
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let low = self.low.max(other.low);
        let high = self.high.min(other.high);
        (low <= high).then_some(Self { low, high })
    }
}

impl From<Bounds<u64>> for MemoryWindow {
    fn from(bounds: Bounds<u64>) -> Self {
        Self {
            low: bounds.min,
            high: bounds.max,
        }
    }
}

/// Plausibility bounds for one scan
///
/// Built fresh from every configuration event's reference address and passed
/// explicitly into the scanner and validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddressSpaceModel {
    pub reference: u64,
    /// What counts as a pointer into the host's writable heap
    pub validity: MemoryWindow,
    /// How far the scanner may wander from the reference
    pub search: MemoryWindow,
    /// Where the host's read-only image lives
    pub read_only: MemoryWindow,
}

impl AddressSpaceModel {
    pub fn new(reference: u64, config: &ScanConfig) -> Self {
        let validity = MemoryWindow::around(reference, config.validity_radius);
        let search = MemoryWindow::around(reference, config.search_radius);
        Self {
            reference,
            validity,
            // Both windows share the center, so this only matters for
            // configs that skipped validation.
            search: search.intersect(&validity).unwrap_or(validity),
            read_only: config.read_only_range.into(),
        }
    }

    /// Value looks like a pointer into the writable heap
    pub fn is_writable_pointer(&self, value: u64) -> bool {
        self.validity.contains(value)
    }

    /// Value looks like a pointer into the read-only image
    pub fn is_read_only_pointer(&self, value: u64) -> bool {
        self.read_only.contains(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_centered_on_reference() {
        let config = ScanConfig::default();
        let reference = 0x0000_0200_0000_0000;
        let model = AddressSpaceModel::new(reference, &config);

        assert_eq!(model.validity.low, reference - config.validity_radius);
        assert_eq!(model.validity.high, reference + config.validity_radius);
        assert_eq!(model.search.low, reference - config.search_radius);
        assert_eq!(model.search.high, reference + config.search_radius);
        assert!(model.validity.contains(model.search.low));
        assert!(model.validity.contains(model.search.high));
    }

    #[test]
    fn test_windows_saturate_at_address_space_edges() {
        let config = ScanConfig::default();
        let low = AddressSpaceModel::new(0x1000, &config);
        assert_eq!(low.validity.low, 0);
        assert_eq!(low.search.low, 0);

        let high = AddressSpaceModel::new(u64::MAX - 0x10, &config);
        assert_eq!(high.validity.high, u64::MAX);
        assert_eq!(high.search.high, u64::MAX);
    }

    #[test]
    fn test_pointer_classification() {
        let config = ScanConfig::default();
        let model = AddressSpaceModel::new(0x0000_0200_0000_0000, &config);

        assert!(model.is_writable_pointer(0x0000_0200_0000_1000));
        assert!(!model.is_writable_pointer(0));
        assert!(!model.is_writable_pointer(0x0000_7FF5_0000_0000));
        assert!(model.is_read_only_pointer(0x0000_7FF5_0000_0000));
        assert!(!model.is_read_only_pointer(0x0000_0200_0000_1000));
    }

    #[test]
    fn test_intersect() {
        let a = MemoryWindow { low: 10, high: 20 };
        let b = MemoryWindow { low: 15, high: 30 };
        assert_eq!(a.intersect(&b), Some(MemoryWindow { low: 15, high: 20 }));
        assert_eq!(a.intersect(&MemoryWindow { low: 21, high: 22 }), None);
    }

    #[test]
    fn test_contains_below_high() {
        let w = MemoryWindow { low: 10, high: 20 };
        assert!(w.contains(20));
        assert!(!w.contains_below_high(20));
        assert!(w.contains_below_high(10));
        assert!(w.contains_below_high(19));
    }
}
