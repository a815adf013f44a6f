use crate::harbor::{PortId, VehicleKind};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub type Id = u32;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VehicleConfig {
    pub id: Id,
    pub kind: VehicleKind,
    pub special: bool, // May use the special passenger booth
    pub port: PortId,  // Port the vehicle starts (and must end) in
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TimingConfig {
    pub time_unit_ms: u64,       // Length of one ferry tick
    pub poll_ms: u64,            // Upper bound of a single wait before re-checking
    pub transit_units: [u32; 2], // Crossing time leaving port 0 and port 1
    pub dwell_units: [u32; 2],   // Inclusive range of rest between legs
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            time_unit_ms: 1000,
            poll_ms: 100,
            transit_units: [6, 4],
            dwell_units: [1, 5],
        }
    }
}

impl TimingConfig {
    pub fn units(&self, units: u32) -> Duration {
        Duration::from_millis(self.time_unit_ms.saturating_mul(u64::from(units)))
    }

    pub fn tick(&self) -> Duration {
        self.units(1)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn transit(&self, from: PortId) -> Duration {
        self.units(self.transit_units[from.index()])
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ThresholdConfig {
    pub first_cycle_wait: u32, // Ticks a ferry waits before its very first loading
    pub nearly_full_line: u32, // Every line above this weight cuts the first wait short
    pub line_capacity: u32,
    pub ferry_capacity: u32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        ThresholdConfig {
            first_cycle_wait: 30,
            nearly_full_line: 16,
            line_capacity: 20,
            ferry_capacity: 30,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SystemConfig {
    pub vehicles: u32,
    pub seed: Option<u64>,
    pub fleet: Vec<VehicleConfig>,
    pub timing: TimingConfig,
    pub thresholds: ThresholdConfig,
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            vehicles: 32,
            seed: None,
            fleet: Vec::new(),
            timing: TimingConfig::default(),
            thresholds: ThresholdConfig::default(),
        }
    }
}

impl SystemConfig {
    /// Fixes the seed so that the fleet and every per-vehicle choice derived
    /// from it can be replayed.
    pub fn resolve_seed(&mut self) -> u64 {
        let seed = *self.seed.get_or_insert_with(rand::random);

        tracing::info!(seed, "simulation seed");

        seed
    }

    /// Explicit fleet when one is configured, otherwise a generated one: kinds
    /// banded by id quartile, a random start port and a random special flag.
    pub fn fleet(&self, seed: u64) -> Vec<VehicleConfig> {
        if !self.fleet.is_empty() {
            let mut fleet = self.fleet.clone();
            fleet.sort_by_key(|vehicle| vehicle.id);
            return fleet;
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let band = (self.vehicles / 4).max(1);

        (0..self.vehicles)
            .map(|id| {
                let kind = match id / band {
                    0 => VehicleKind::Motorcycle,
                    1 => VehicleKind::Car,
                    2 => VehicleKind::Bus,
                    _ => VehicleKind::Truck,
                };

                VehicleConfig {
                    id,
                    kind,
                    special: rng.gen(),
                    port: if rng.gen() { PortId::East } else { PortId::West },
                }
            })
            .collect()
    }
}
