//! Outward, distance-ordered walk over memory words around the reference.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;
use tracing::{debug, trace};

use crate::config::ScanConfig;
use crate::memory::MemoryAccessor;
use crate::memory::layout::{WORD, legacy as legacy_layout, truck};
use crate::scan::legacy::LegacyValidator;
use crate::scan::validator::{RejectReason, StructureValidator, Verdict};
use crate::scan::window::{AddressSpaceModel, MemoryWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    /// Toward lower addresses; tried first at every amplitude
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExhaustReason {
    /// The reference word itself could not be read; nothing was scanned
    ReferenceUnreadable,
    /// Both directions left the search window
    WindowExceeded,
    /// The step budget ran out
    GuardLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Fingerprint {
    Primary,
    Legacy,
}

/// Where the capacity was found
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    /// Address of the word that pointed at the structure
    pub pointer_address: u64,
    pub structure_address: u64,
    pub capacity_address: u64,
    pub tank_capacity: f32,
    pub fingerprint: Fingerprint,
    pub direction: Direction,
    pub amplitude: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    Found(Detection),
    Exhausted { reason: ExhaustReason },
}

/// Mutable walk state for one scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanState {
    /// Current distance from the reference, in words
    pub amplitude: u64,
    #[serde(skip)]
    next: Direction,
    #[serde(skip)]
    down_open: bool,
    #[serde(skip)]
    up_open: bool,
    /// Words probed so far; bounded by the guard limit
    pub steps: u64,
    pub unreadable_words: u64,
    /// Pointer-shaped words handed to the validators
    pub candidates_tested: u64,
    pub rejections: BTreeMap<RejectReason, u64>,
}

impl Default for ScanState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanState {
    pub fn new() -> Self {
        Self {
            amplitude: 1,
            next: Direction::Down,
            down_open: true,
            up_open: true,
            steps: 0,
            unreadable_words: 0,
            candidates_tested: 0,
            rejections: BTreeMap::new(),
        }
    }

    /// Next address to probe: down then up at each amplitude, skipping sides
    /// that already left `window`. `None` once both sides are closed.
    pub fn advance(&mut self, reference: u64, window: &MemoryWindow) -> Option<(u64, Direction)> {
        while self.down_open || self.up_open {
            let direction = self.next;
            let amplitude = self.amplitude;
            let offset = amplitude.checked_mul(WORD);

            let address = match direction {
                Direction::Down => {
                    self.next = Direction::Up;
                    if !self.down_open {
                        continue;
                    }
                    offset.and_then(|o| reference.checked_sub(o))
                }
                Direction::Up => {
                    self.next = Direction::Down;
                    self.amplitude += 1;
                    if !self.up_open {
                        continue;
                    }
                    offset.and_then(|o| reference.checked_add(o))
                }
            };

            match address {
                Some(address) if window.contains(address) => return Some((address, direction)),
                _ => {
                    debug!(
                        "Search window exceeded going {} after {} words (bound [0x{:X}:0x{:X}])",
                        direction, amplitude, window.low, window.high
                    );
                    match direction {
                        Direction::Down => self.down_open = false,
                        Direction::Up => self.up_open = false,
                    }
                }
            }
        }
        None
    }

    fn reject(&mut self, reason: RejectReason) {
        *self.rejections.entry(reason).or_insert(0) += 1;
    }
}

/// Result and diagnostics of one scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub model: AddressSpaceModel,
    pub anchor: f32,
    pub outcome: ScanOutcome,
    pub state: ScanState,
}

impl ScanReport {
    pub fn tank_capacity(&self) -> Option<f32> {
        match &self.outcome {
            ScanOutcome::Found(detection) => Some(detection.tank_capacity),
            ScanOutcome::Exhausted { .. } => None,
        }
    }

    pub fn detection(&self) -> Option<&Detection> {
        match &self.outcome {
            ScanOutcome::Found(detection) => Some(detection),
            ScanOutcome::Exhausted { .. } => None,
        }
    }

    pub fn exhaust_reason(&self) -> Option<ExhaustReason> {
        match self.outcome {
            ScanOutcome::Found(_) => None,
            ScanOutcome::Exhausted { reason } => Some(reason),
        }
    }

    pub fn is_found(&self) -> bool {
        self.detection().is_some()
    }
}

pub struct CandidateScanner<'a, M: MemoryAccessor + ?Sized> {
    memory: &'a M,
    config: &'a ScanConfig,
}

impl<'a, M: MemoryAccessor + ?Sized> CandidateScanner<'a, M> {
    pub fn new(memory: &'a M, config: &'a ScanConfig) -> Self {
        Self { memory, config }
    }

    /// Search outward from `reference` for a record whose AdBlue capacity
    /// equals `anchor`
    pub fn scan(&self, reference: u64, anchor: f32) -> ScanReport {
        let started_at = Utc::now();
        let timer = Instant::now();
        let model = AddressSpaceModel::new(reference, self.config);
        let mut state = ScanState::new();

        debug!(
            "Ref ptr 0x{:X}; validity [0x{:X}:0x{:X}]; search [0x{:X}:0x{:X}]",
            reference, model.validity.low, model.validity.high, model.search.low, model.search.high
        );

        let outcome = if self.memory.probe(reference, WORD as usize) {
            self.walk(&model, anchor, &mut state)
        } else {
            debug!("Reference address 0x{:X} is not readable", reference);
            ScanOutcome::Exhausted {
                reason: ExhaustReason::ReferenceUnreadable,
            }
        };

        ScanReport {
            started_at,
            elapsed_ms: timer.elapsed().as_millis() as u64,
            model,
            anchor,
            outcome,
            state,
        }
    }

    fn walk(&self, model: &AddressSpaceModel, anchor: f32, state: &mut ScanState) -> ScanOutcome {
        let primary = StructureValidator::new(self.memory, model, &self.config.bounds);
        let legacy = self
            .config
            .legacy_fingerprint
            .then(|| LegacyValidator::new(self.memory, model, &self.config.bounds));

        loop {
            if state.steps >= self.config.guard_limit {
                return ScanOutcome::Exhausted {
                    reason: ExhaustReason::GuardLimit,
                };
            }
            let Some((address, direction)) = state.advance(model.reference, &model.search) else {
                return ScanOutcome::Exhausted {
                    reason: ExhaustReason::WindowExceeded,
                };
            };
            state.steps += 1;

            let Some(value) = self.memory.read_word(address) else {
                state.unreadable_words += 1;
                continue;
            };
            if !model.is_writable_pointer(value) {
                continue;
            }

            state.candidates_tested += 1;
            trace!("Candidate 0x{:X} (from 0x{:X})", value, address);

            let amplitude = address.abs_diff(model.reference) / WORD;
            let found = move |structure_address: u64,
                              capacity_address: u64,
                              tank_capacity: f32,
                              fingerprint: Fingerprint| {
                ScanOutcome::Found(Detection {
                    pointer_address: address,
                    structure_address,
                    capacity_address,
                    tank_capacity,
                    fingerprint,
                    direction,
                    amplitude,
                })
            };

            match primary.validate(value, anchor) {
                Verdict::Accept(capacity) => {
                    let capacity_address = value + truck::TANK_CAPACITY as u64;
                    return found(value, capacity_address, capacity, Fingerprint::Primary);
                }
                Verdict::Reject(reason) => state.reject(reason),
            }

            if let Some(legacy) = &legacy {
                match legacy.validate(value) {
                    Verdict::Accept(capacity) => {
                        let target = legacy.target(value).unwrap_or(value);
                        let capacity_address =
                            target + legacy_layout::TANK_CAPACITY_WORD as u64 * WORD;
                        return found(target, capacity_address, capacity, Fingerprint::Legacy);
                    }
                    Verdict::Reject(reason) => state.reject(reason),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SnapshotMemory;
    use crate::scan::fixture::{LegacyFixture, REFERENCE, TruckFixture};

    fn window(radius: u64) -> MemoryWindow {
        MemoryWindow::around(REFERENCE, radius)
    }

    #[test]
    fn test_advance_alternates_down_then_up() {
        let mut state = ScanState::new();
        let w = window(0x1000);
        let steps: Vec<_> = (0..6).filter_map(|_| state.advance(REFERENCE, &w)).collect();
        assert_eq!(
            steps,
            vec![
                (REFERENCE - 8, Direction::Down),
                (REFERENCE + 8, Direction::Up),
                (REFERENCE - 16, Direction::Down),
                (REFERENCE + 16, Direction::Up),
                (REFERENCE - 24, Direction::Down),
                (REFERENCE + 24, Direction::Up),
            ]
        );
    }

    #[test]
    fn test_advance_continues_one_side_after_other_closes() {
        // Reference close to the low end of the window
        let w = MemoryWindow {
            low: REFERENCE - 16,
            high: REFERENCE + 48,
        };
        let mut state = ScanState::new();
        let mut addresses = Vec::new();
        while let Some((address, _)) = state.advance(REFERENCE, &w) {
            addresses.push(address);
        }
        assert_eq!(
            addresses,
            vec![
                REFERENCE - 8,
                REFERENCE + 8,
                REFERENCE - 16,
                REFERENCE + 16,
                REFERENCE + 24,
                REFERENCE + 32,
                REFERENCE + 40,
                REFERENCE + 48,
            ]
        );
        assert_eq!(state.advance(REFERENCE, &w), None);
    }

    #[test]
    fn test_advance_near_zero_does_not_wrap() {
        let w = MemoryWindow { low: 0, high: 64 };
        let mut state = ScanState::new();
        let mut downs = 0;
        while let Some((_, direction)) = state.advance(8, &w) {
            if direction == Direction::Down {
                downs += 1;
            }
        }
        assert_eq!(downs, 1);
    }

    fn small_config() -> ScanConfig {
        ScanConfig::builder().search_radius(0x4000).build().unwrap()
    }

    fn heap() -> SnapshotMemory {
        SnapshotMemory::builder()
            .zeroed(REFERENCE - 0x4000, 0x8000)
            .build()
            .unwrap()
    }

    #[test]
    fn test_scan_finds_record_through_pointer() {
        let config = small_config();
        let mut memory = heap();
        memory.write_u64(REFERENCE + 0x20, REFERENCE + 0x1000).unwrap();
        TruckFixture::paired().write(&mut memory, REFERENCE + 0x1000).unwrap();

        let report = CandidateScanner::new(&memory, &config).scan(REFERENCE, 80.0);
        let detection = report.detection().copied().unwrap();
        assert_eq!(detection.tank_capacity, 681.4);
        assert_eq!(detection.pointer_address, REFERENCE + 0x20);
        assert_eq!(detection.structure_address, REFERENCE + 0x1000);
        assert_eq!(detection.capacity_address, REFERENCE + 0x1000 + 276);
        assert_eq!(detection.direction, Direction::Up);
        assert_eq!(detection.amplitude, 4);
        assert_eq!(detection.fingerprint, Fingerprint::Primary);
        assert_eq!(report.state.candidates_tested, 1);
    }

    #[test]
    fn test_equal_distance_prefers_down() {
        let config = small_config();
        let mut memory = heap();
        memory.write_u64(REFERENCE - 0x18, REFERENCE + 0x1000).unwrap();
        memory.write_u64(REFERENCE + 0x18, REFERENCE + 0x2000).unwrap();
        TruckFixture::paired().write(&mut memory, REFERENCE + 0x1000).unwrap();
        TruckFixture::paired()
            .tank_capacity(400.0)
            .write(&mut memory, REFERENCE + 0x2000)
            .unwrap();

        let report = CandidateScanner::new(&memory, &config).scan(REFERENCE, 80.0);
        let detection = report.detection().copied().unwrap();
        assert_eq!(detection.direction, Direction::Down);
        assert_eq!(detection.tank_capacity, 681.4);
    }

    #[test]
    fn test_exhausts_window_and_counts_rejections() {
        let config = small_config();
        let mut memory = heap();
        memory.write_u64(REFERENCE + 0x20, REFERENCE + 0x1000).unwrap();
        TruckFixture::paired()
            .adblue_capacity(60.0)
            .write(&mut memory, REFERENCE + 0x1000)
            .unwrap();

        let report = CandidateScanner::new(&memory, &config).scan(REFERENCE, 80.0);
        assert_eq!(report.exhaust_reason(), Some(ExhaustReason::WindowExceeded));
        assert_eq!(report.state.rejections.get(&RejectReason::AnchorMismatch), Some(&1));
        assert_eq!(report.state.steps, 2 * (0x4000 / 8));
        // Only the top edge of the window lies past the mapped heap
        assert_eq!(report.state.unreadable_words, 1);
    }

    #[test]
    fn test_guard_limit_stops_scan() {
        let config = ScanConfig::builder().guard_limit(10).build().unwrap();
        let memory = heap();

        let report = CandidateScanner::new(&memory, &config).scan(REFERENCE, 80.0);
        assert_eq!(report.exhaust_reason(), Some(ExhaustReason::GuardLimit));
        assert_eq!(report.state.steps, 10);
        assert_eq!(report.state.amplitude, 6);
    }

    #[test]
    fn test_legacy_fingerprint_only_when_enabled() {
        let mut memory = heap();
        memory.write_u64(REFERENCE + 0x40, REFERENCE + 0x100).unwrap();
        memory.write_u64(REFERENCE + 0x100, REFERENCE + 0x2000).unwrap();
        LegacyFixture::new(900.0).write(&mut memory, REFERENCE + 0x2000).unwrap();

        let disabled = small_config();
        let report = CandidateScanner::new(&memory, &disabled).scan(REFERENCE, 80.0);
        assert!(!report.is_found());

        let enabled = ScanConfig::builder()
            .search_radius(0x4000)
            .legacy_fingerprint(true)
            .build()
            .unwrap();
        let report = CandidateScanner::new(&memory, &enabled).scan(REFERENCE, 80.0);
        let detection = report.detection().copied().unwrap();
        assert_eq!(detection.fingerprint, Fingerprint::Legacy);
        assert_eq!(detection.pointer_address, REFERENCE + 0x40);
        assert_eq!(detection.structure_address, REFERENCE + 0x2000);
        assert_eq!(detection.capacity_address, REFERENCE + 0x2000 + 53 * 8);
        assert_eq!(detection.tank_capacity, 900.0);
    }

    #[test]
    fn test_report_serializes() {
        let config = small_config();
        let memory = heap();
        let report = CandidateScanner::new(&memory, &config).scan(REFERENCE, 80.0);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"]["status"], "exhausted");
        assert_eq!(json["outcome"]["reason"], "window_exceeded");
        assert_eq!(json["model"]["reference"], REFERENCE);
    }
}
