//! Scan configuration.
//!
//! Loaded from TOML; every field is optional and falls back to the
//! defaults in [`crate::scan::constants`].
//!
//! ```toml
//! search_radius = 0x1000000
//! legacy_fingerprint = true
//!
//! [bounds.tank_capacity]
//! min = 30.0
//! max = 3000.0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::scan::constants::*;

/// Inclusive `[min, max]` range
///
/// Comparisons against NaN are false, so NaN is never contained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    /// Open `(min, max)` test, used by the legacy fingerprint
    pub fn contains_exclusive(&self, value: T) -> bool {
        value > self.min && value < self.max
    }

    fn is_ordered(&self) -> bool {
        self.min <= self.max
    }
}

/// Bounds for one (i32, f32) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairBounds {
    pub int: Bounds<i32>,
    pub float: Bounds<f32>,
}

impl PairBounds {
    const fn new(int: (i32, i32), float: (f32, f32)) -> Self {
        Self {
            int: Bounds::new(int.0, int.1),
            float: Bounds::new(float.0, float.1),
        }
    }

    pub fn contains(&self, int: i32, float: f32) -> bool {
        self.int.contains(int) && self.float.contains(float)
    }
}

/// Empirical ranges for every checked field of the truck record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldBounds {
    pub tank_capacity: Bounds<f32>,
    pub int_float_pairs: [PairBounds; 4],
    /// Upper bound for link lengths and the two small counters
    pub max_count: u64,
    pub aux_float: Bounds<f32>,
    pub signed_floats: Bounds<f32>,
    pub scale: Bounds<f32>,
    pub fill_fraction: Bounds<f32>,
    /// Exclusive at both ends
    pub legacy_tank_capacity: Bounds<f32>,
}

impl Default for FieldBounds {
    fn default() -> Self {
        Self {
            tank_capacity: Bounds::new(TANK_CAPACITY_MIN, TANK_CAPACITY_MAX),
            int_float_pairs: [
                PairBounds::new((0, 100_000), (0.0, 1.0)),
                PairBounds::new((0, 10_000), (0.0, 10.0)),
                PairBounds::new((0, 20_000), (0.0, 10_000.0)),
                PairBounds::new((0, 20_000), (0.0, 1.0)),
            ],
            max_count: MAX_SMALL_COUNT,
            aux_float: Bounds::new(0.0, 10_000.0),
            signed_floats: Bounds::new(-1.0, 1.0),
            scale: Bounds::new(0.0, 100_000.0),
            fill_fraction: Bounds::new(0.0, 1.0),
            legacy_tank_capacity: Bounds::new(LEGACY_TANK_CAPACITY_MIN, TANK_CAPACITY_MAX),
        }
    }
}

impl FieldBounds {
    fn float_bounds(&self) -> impl Iterator<Item = (&'static str, &Bounds<f32>)> {
        [
            ("tank_capacity", &self.tank_capacity),
            ("aux_float", &self.aux_float),
            ("signed_floats", &self.signed_floats),
            ("scale", &self.scale),
            ("fill_fraction", &self.fill_fraction),
            ("legacy_tank_capacity", &self.legacy_tank_capacity),
        ]
        .into_iter()
    }
}

/// Configuration for capacity scans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Half-width of the validity window around the reference address
    pub validity_radius: u64,
    /// Half-width of the search window around the reference address
    pub search_radius: u64,
    /// Maximum number of scan steps
    pub guard_limit: u64,
    /// Where the host's read-only image is mapped
    pub read_only_range: Bounds<u64>,
    pub bounds: FieldBounds,
    /// Also try the older indirect structure when the primary one rejects
    pub legacy_fingerprint: bool,
    /// Published when the event does not document a fuel capacity
    pub default_fuel_capacity: f32,
    /// Anchor used when the event does not document an AdBlue capacity
    pub default_anchor: f32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            validity_radius: DEFAULT_VALIDITY_RADIUS,
            search_radius: DEFAULT_SEARCH_RADIUS,
            guard_limit: DEFAULT_GUARD_LIMIT,
            read_only_range: Bounds::new(READ_ONLY_MIN, READ_ONLY_MAX),
            bounds: FieldBounds::default(),
            legacy_fingerprint: false,
            default_fuel_capacity: DEFAULT_FUEL_CAPACITY,
            default_anchor: DEFAULT_ADBLUE_CAPACITY,
        }
    }
}

impl ScanConfig {
    /// Create a new configuration builder
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml(&content)?;
        debug!("Loaded scan config from {:?}", path.as_ref());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.search_radius > self.validity_radius {
            return Err(Error::InvalidConfig(format!(
                "search_radius (0x{:X}) exceeds validity_radius (0x{:X})",
                self.search_radius, self.validity_radius
            )));
        }
        if self.guard_limit == 0 {
            return Err(Error::InvalidConfig("guard_limit must be non-zero".into()));
        }
        if !self.read_only_range.is_ordered() {
            return Err(Error::InvalidConfig("read_only_range is inverted".into()));
        }
        for (name, bounds) in self.bounds.float_bounds() {
            if !bounds.is_ordered() {
                return Err(Error::InvalidConfig(format!("bounds.{name} is inverted")));
            }
        }
        for (i, pair) in self.bounds.int_float_pairs.iter().enumerate() {
            if !pair.int.is_ordered() || !pair.float.is_ordered() {
                return Err(Error::InvalidConfig(format!(
                    "bounds.int_float_pairs[{i}] is inverted"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for ScanConfig
#[derive(Debug, Clone, Default)]
pub struct ScanConfigBuilder {
    validity_radius: Option<u64>,
    search_radius: Option<u64>,
    guard_limit: Option<u64>,
    read_only_range: Option<Bounds<u64>>,
    bounds: Option<FieldBounds>,
    legacy_fingerprint: Option<bool>,
    default_fuel_capacity: Option<f32>,
    default_anchor: Option<f32>,
}

impl ScanConfigBuilder {
    pub fn validity_radius(mut self, radius: u64) -> Self {
        self.validity_radius = Some(radius);
        self
    }

    pub fn search_radius(mut self, radius: u64) -> Self {
        self.search_radius = Some(radius);
        self
    }

    pub fn guard_limit(mut self, limit: u64) -> Self {
        self.guard_limit = Some(limit);
        self
    }

    pub fn read_only_range(mut self, min: u64, max: u64) -> Self {
        self.read_only_range = Some(Bounds::new(min, max));
        self
    }

    pub fn bounds(mut self, bounds: FieldBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn legacy_fingerprint(mut self, enabled: bool) -> Self {
        self.legacy_fingerprint = Some(enabled);
        self
    }

    pub fn default_fuel_capacity(mut self, capacity: f32) -> Self {
        self.default_fuel_capacity = Some(capacity);
        self
    }

    pub fn default_anchor(mut self, anchor: f32) -> Self {
        self.default_anchor = Some(anchor);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ScanConfig> {
        let default = ScanConfig::default();
        let config = ScanConfig {
            validity_radius: self.validity_radius.unwrap_or(default.validity_radius),
            search_radius: self.search_radius.unwrap_or(default.search_radius),
            guard_limit: self.guard_limit.unwrap_or(default.guard_limit),
            read_only_range: self.read_only_range.unwrap_or(default.read_only_range),
            bounds: self.bounds.unwrap_or(default.bounds),
            legacy_fingerprint: self.legacy_fingerprint.unwrap_or(default.legacy_fingerprint),
            default_fuel_capacity: self
                .default_fuel_capacity
                .unwrap_or(default.default_fuel_capacity),
            default_anchor: self.default_anchor.unwrap_or(default.default_anchor),
        };
        config.validate()?;
        Ok(config)
    }
}
