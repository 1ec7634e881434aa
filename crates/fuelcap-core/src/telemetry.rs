//! Published truck state and the host's configuration events.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use strum::Display;
use tracing::warn;

/// Configuration id of the event that describes the player's truck
pub const TRUCK_CONFIG_ID: &str = "truck";
/// Documented fuel capacity attribute (frequently wrong for modded trucks)
pub const FUEL_CAPACITY_ATTRIBUTE: &str = "fuel.capacity";
/// AdBlue capacity attribute, used as the scan anchor
pub const ADBLUE_CAPACITY_ATTRIBUTE: &str = "adblue.capacity";

/// Values read by the polling side
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TruckTelemetry {
    pub paused: bool,
    pub electricity: bool,
    /// Tank capacity in liters
    pub fuel_max: f32,
    /// Current fuel amount in liters
    pub fuel: f32,
}

impl Default for TruckTelemetry {
    fn default() -> Self {
        Self {
            paused: true,
            electricity: false,
            fuel_max: 0.0,
            fuel: 0.0,
        }
    }
}

/// Telemetry shared between the event thread and a poller
///
/// Every operation holds the lock for a single copy or scalar write. A
/// poisoned lock is recovered; the state is plain scalars.
#[derive(Debug, Clone, Default)]
pub struct SharedTelemetry {
    inner: Arc<Mutex<TruckTelemetry>>,
}

impl SharedTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TruckTelemetry> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> TruckTelemetry {
        *self.lock()
    }

    pub fn publish_fuel_capacity(&self, capacity: f32) {
        self.lock().fuel_max = capacity;
    }

    pub fn set_paused(&self, paused: bool) {
        self.lock().paused = paused;
    }

    pub fn set_electricity(&self, enabled: bool) {
        self.lock().electricity = enabled;
    }

    pub fn set_fuel(&self, fuel: f32) {
        self.lock().fuel = fuel;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ValueType {
    Bool,
    S32,
    U32,
    U64,
    Float,
    String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    S32(i32),
    U32(u32),
    U64(u64),
    Float(f32),
    String(String),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::S32(_) => ValueType::S32,
            Value::U32(_) => ValueType::U32,
            Value::U64(_) => ValueType::U64,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }
}

/// Attribute of a configuration event
#[derive(Debug, Clone, PartialEq)]
pub struct NamedValue {
    pub name: String,
    /// Array index, `None` for scalar attributes
    pub index: Option<u32>,
    pub value: Value,
}

impl NamedValue {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            index: None,
            value,
        }
    }

    pub fn indexed(name: impl Into<String>, index: u32, value: Value) -> Self {
        Self {
            name: name.into(),
            index: Some(index),
            value,
        }
    }
}

/// Configuration event delivered by the host
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationEvent {
    pub id: String,
    pub attributes: Vec<NamedValue>,
    /// Where the host keeps the attribute list; the scan reference
    pub attributes_address: u64,
}

impl ConfigurationEvent {
    pub fn is_truck(&self) -> bool {
        self.id == TRUCK_CONFIG_ID
    }

    /// Look up an attribute by name and index
    ///
    /// An attribute of the wrong type is reported and treated as absent.
    pub fn find_attribute(
        &self,
        name: &str,
        index: Option<u32>,
        expected: ValueType,
    ) -> Option<&Value> {
        let attribute = self
            .attributes
            .iter()
            .find(|a| a.name == name && a.index == index)?;

        let actual = attribute.value.value_type();
        if actual != expected {
            warn!(
                "Attribute {} has type {} (expected {}), ignoring",
                name, actual, expected
            );
            return None;
        }
        Some(&attribute.value)
    }

    pub fn float_attribute(&self, name: &str) -> Option<f32> {
        self.find_attribute(name, None, ValueType::Float)
            .and_then(Value::as_float)
    }
}
