//! Drives one capacity scan per truck configuration event.

use tracing::{debug, info, warn};

use crate::config::ScanConfig;
use crate::memory::MemoryAccessor;
use crate::scan::{CandidateScanner, ScanOutcome, ScanReport};
use crate::telemetry::{
    ADBLUE_CAPACITY_ATTRIBUTE, ConfigurationEvent, FUEL_CAPACITY_ATTRIBUTE, SharedTelemetry,
};

/// Outcome of the most recent truck configuration
///
/// Scans run to completion inside `on_configuration`, so only the terminal
/// result is ever visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ControllerPhase {
    /// No truck configuration seen yet
    Idle,
    Found,
    Exhausted,
}

pub struct ScanController<M: MemoryAccessor> {
    memory: M,
    config: ScanConfig,
    telemetry: SharedTelemetry,
    phase: ControllerPhase,
    last_report: Option<ScanReport>,
}

impl<M: MemoryAccessor> ScanController<M> {
    pub fn new(memory: M, config: ScanConfig, telemetry: SharedTelemetry) -> Self {
        Self {
            memory,
            config,
            telemetry,
            phase: ControllerPhase::Idle,
            last_report: None,
        }
    }

    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    pub fn telemetry(&self) -> &SharedTelemetry {
        &self.telemetry
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Report of the most recent scan
    pub fn last_report(&self) -> Option<&ScanReport> {
        self.last_report.as_ref()
    }

    pub fn on_pause(&self, paused: bool) {
        debug!("Simulation {}", if paused { "paused" } else { "started" });
        self.telemetry.set_paused(paused);
    }

    /// Handle a configuration event
    ///
    /// Non-truck events are ignored. For the truck, the documented capacity is
    /// published right away and replaced if a scan recovers the real one.
    pub fn on_configuration(&mut self, event: &ConfigurationEvent) -> Option<&ScanReport> {
        if !event.is_truck() {
            return None;
        }

        let baseline = event
            .float_attribute(FUEL_CAPACITY_ATTRIBUTE)
            .unwrap_or(self.config.default_fuel_capacity);
        self.telemetry.publish_fuel_capacity(baseline);

        let anchor = event
            .float_attribute(ADBLUE_CAPACITY_ATTRIBUTE)
            .unwrap_or(self.config.default_anchor);

        info!(
            "Truck configured: fuel capacity {:.2} (documented), AdBlue capacity {:.2}; scanning from 0x{:X}",
            baseline, anchor, event.attributes_address
        );

        let report = CandidateScanner::new(&self.memory, &self.config)
            .scan(event.attributes_address, anchor);

        match &report.outcome {
            ScanOutcome::Found(detection) => {
                self.phase = ControllerPhase::Found;
                self.telemetry
                    .publish_fuel_capacity(detection.tank_capacity);
                info!(
                    "Fuel capacity {:.4} found at 0x{:X} (structure 0x{:X}, pointer 0x{:X}, {} candidates, {} ms)",
                    detection.tank_capacity,
                    detection.capacity_address,
                    detection.structure_address,
                    detection.pointer_address,
                    report.state.candidates_tested,
                    report.elapsed_ms
                );
            }
            ScanOutcome::Exhausted { reason } => {
                self.phase = ControllerPhase::Exhausted;
                warn!(
                    "Fuel capacity not found ({}) after {} steps and {} candidates; keeping {:.2}",
                    reason, report.state.steps, report.state.candidates_tested, baseline
                );
            }
        }

        self.last_report = Some(report);
        self.last_report.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SnapshotMemory;
    use crate::scan::fixture::{REFERENCE, TruckFixture};
    use crate::telemetry::{NamedValue, TRUCK_CONFIG_ID, Value};

    fn memory() -> SnapshotMemory {
        let mut memory = SnapshotMemory::builder()
            .zeroed(REFERENCE - 0x2000, 0x4000)
            .build()
            .unwrap();
        memory.write_u64(REFERENCE - 0x10, REFERENCE + 0x800).unwrap();
        TruckFixture::paired().write(&mut memory, REFERENCE + 0x800).unwrap();
        memory
    }

    fn controller() -> ScanController<SnapshotMemory> {
        let config = ScanConfig::builder().search_radius(0x2000).build().unwrap();
        ScanController::new(memory(), config, SharedTelemetry::new())
    }

    fn truck_event(anchor: f32) -> ConfigurationEvent {
        ConfigurationEvent {
            id: TRUCK_CONFIG_ID.into(),
            attributes: vec![
                NamedValue::new(FUEL_CAPACITY_ATTRIBUTE, Value::Float(400.0)),
                NamedValue::new(ADBLUE_CAPACITY_ATTRIBUTE, Value::Float(anchor)),
            ],
            attributes_address: REFERENCE,
        }
    }

    #[test]
    fn test_found_capacity_is_published() {
        let mut controller = controller();
        let report = controller.on_configuration(&truck_event(80.0)).unwrap();
        assert_eq!(report.tank_capacity(), Some(681.4));
        assert_eq!(controller.telemetry().snapshot().fuel_max, 681.4);
        assert_eq!(controller.phase(), ControllerPhase::Found);
    }

    #[test]
    fn test_exhausted_keeps_documented_capacity() {
        let mut controller = controller();
        let report = controller.on_configuration(&truck_event(79.9)).unwrap();
        assert!(!report.is_found());
        assert_eq!(controller.telemetry().snapshot().fuel_max, 400.0);
        assert_eq!(controller.phase(), ControllerPhase::Exhausted);
    }

    #[test]
    fn test_phase_follows_latest_scan() {
        let mut controller = controller();
        assert_eq!(controller.phase(), ControllerPhase::Idle);

        controller.on_configuration(&truck_event(80.0));
        assert_eq!(controller.phase(), ControllerPhase::Found);
        controller.on_configuration(&truck_event(79.9));
        assert_eq!(controller.phase(), ControllerPhase::Exhausted);
        controller.on_configuration(&truck_event(80.0));
        assert_eq!(controller.phase(), ControllerPhase::Found);
    }

    #[test]
    fn test_missing_attributes_fall_back_to_defaults() {
        let mut controller = controller();
        let event = ConfigurationEvent {
            attributes: Vec::new(),
            ..truck_event(80.0)
        };
        // The default anchor is 80.0, so the scan still succeeds
        let report = controller.on_configuration(&event).unwrap();
        assert_eq!(report.anchor, 80.0);
        assert_eq!(report.tank_capacity(), Some(681.4));

        let event = ConfigurationEvent {
            attributes: vec![NamedValue::new(
                ADBLUE_CAPACITY_ATTRIBUTE,
                Value::Float(60.0),
            )],
            ..truck_event(80.0)
        };
        controller.on_configuration(&event);
        assert_eq!(controller.telemetry().snapshot().fuel_max, 200.0);
    }

    #[test]
    fn test_other_configurations_ignored() {
        let mut controller = controller();
        let event = ConfigurationEvent {
            id: "trailer".into(),
            ..truck_event(80.0)
        };
        assert!(controller.on_configuration(&event).is_none());
        assert!(controller.last_report().is_none());
        assert_eq!(controller.phase(), ControllerPhase::Idle);
        assert_eq!(controller.telemetry().snapshot().fuel_max, 0.0);
    }

    #[test]
    fn test_pause_toggles_telemetry() {
        let controller = controller();
        controller.on_pause(false);
        assert!(!controller.telemetry().snapshot().paused);
        controller.on_pause(true);
        assert!(controller.telemetry().snapshot().paused);
    }
}
