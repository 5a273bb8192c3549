//! Scenario files: the fleet, the vertiports, the routes and the demand.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::types::{VertiportName, DEFAULT_BATTERY_CAPACITY, DEFAULT_CHARGE_RATE};

fn default_battery_capacity() -> f64 {
    DEFAULT_BATTERY_CAPACITY
}

fn default_charge_rate() -> f64 {
    DEFAULT_CHARGE_RATE
}

/// Demand counts cover one hour each unless the record says otherwise
fn default_unit_minutes() -> f64 {
    60.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct VertiportRecord {
    pub id: u32,
    pub name: VertiportName,
    /// Landing pads available for parked aircraft
    pub capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FleetRecord {
    pub id: u32,
    /// Starting battery, in minutes of range
    pub battery_level: f64,
    #[serde(default = "default_battery_capacity")]
    pub battery_capacity: f64,
    #[serde(default = "default_charge_rate")]
    pub charge_rate: f64,
    /// Passenger seats
    pub capacity: usize,
    /// Starting vertiport
    pub vertiport: VertiportName,
}

/// Passenger demand between a pair of vertiports, as per-bucket counts
#[derive(Debug, Clone, Deserialize)]
pub struct DemandRecord {
    pub src: VertiportName,
    pub dest: VertiportName,
    /// Length of one demand bucket, in minutes
    #[serde(default = "default_unit_minutes")]
    pub unit_minutes: f64,
    /// Passengers showing up in each consecutive bucket
    pub counts: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransportTimeRecord {
    pub src: VertiportName,
    pub dest: VertiportName,
    /// Flight time of the direct route, in minutes
    pub minutes: f64,
}

/// Scheduled ground connections at a vertiport. Parsed and validated for
/// forward compatibility; dispatch does not consult these yet.
#[derive(Debug, Clone, Deserialize)]
pub struct GroundTransportRecord {
    pub vertiport: VertiportName,
    pub departures_minutes: Vec<f64>,
}

/// A complete simulation scenario as loaded from a JSON file
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub vertiports: Vec<VertiportRecord>,
    pub fleet: Vec<FleetRecord>,
    #[serde(default)]
    pub demand: Vec<DemandRecord>,
    pub transport_times: Vec<TransportTimeRecord>,
    #[serde(default)]
    pub ground_transport: Vec<GroundTransportRecord>,
}

impl Scenario {
    /// Load and validate a scenario from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading scenario file {}", path.display()))?;
        let scenario: Scenario = serde_json::from_str(&text)
            .with_context(|| format!("parsing scenario file {}", path.display()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Reject scenarios that would put the simulation in an inconsistent
    /// state before it starts
    pub fn validate(&self) -> Result<()> {
        if self.vertiports.is_empty() {
            bail!("scenario has no vertiports");
        }
        let mut names: HashSet<&str> = HashSet::new();
        for v in &self.vertiports {
            if !names.insert(v.name.as_ref()) {
                bail!("duplicate vertiport name {}", v.name);
            }
        }
        let known = |name: &VertiportName| names.contains(name.as_ref());
        let mut fleet_ids = HashSet::new();
        for f in &self.fleet {
            if !fleet_ids.insert(f.id) {
                bail!("duplicate aircraft id {}", f.id);
            }
            if !known(&f.vertiport) {
                bail!(
                    "aircraft {} starts at unknown vertiport {}",
                    f.id,
                    f.vertiport
                );
            }
            if f.battery_capacity <= 0.0 {
                bail!("aircraft {} has non-positive battery capacity", f.id);
            }
            if f.battery_level < 0.0 || f.battery_level > f.battery_capacity {
                bail!(
                    "aircraft {} battery level {} outside 0..={}",
                    f.id,
                    f.battery_level,
                    f.battery_capacity
                );
            }
            if f.charge_rate <= 0.0 {
                bail!("aircraft {} has non-positive charge rate", f.id);
            }
        }
        for t in &self.transport_times {
            if !known(&t.src) {
                bail!("route from unknown vertiport {}", t.src);
            }
            if !known(&t.dest) {
                bail!("route to unknown vertiport {}", t.dest);
            }
            if t.minutes <= 0.0 {
                bail!("route {} -> {} has non-positive flight time", t.src, t.dest);
            }
        }
        for d in &self.demand {
            if !known(&d.src) {
                bail!("demand from unknown vertiport {}", d.src);
            }
            if !known(&d.dest) {
                bail!("demand to unknown vertiport {}", d.dest);
            }
            if d.unit_minutes <= 0.0 {
                bail!("demand {} -> {} has non-positive bucket length", d.src, d.dest);
            }
        }
        for g in &self.ground_transport {
            if !known(&g.vertiport) {
                bail!("ground transport at unknown vertiport {}", g.vertiport);
            }
        }
        Ok(())
    }

    /// Small built-in two-port scenario, used when no file is given
    pub fn example() -> Self {
        Self {
            vertiports: vec![
                VertiportRecord {
                    id: 1,
                    name: "downtown".into(),
                    capacity: 3,
                },
                VertiportRecord {
                    id: 2,
                    name: "airport".into(),
                    capacity: 3,
                },
            ],
            fleet: vec![
                FleetRecord {
                    id: 1,
                    battery_level: DEFAULT_BATTERY_CAPACITY,
                    battery_capacity: DEFAULT_BATTERY_CAPACITY,
                    charge_rate: DEFAULT_CHARGE_RATE,
                    capacity: 4,
                    vertiport: "downtown".into(),
                },
                FleetRecord {
                    id: 2,
                    battery_level: DEFAULT_BATTERY_CAPACITY,
                    battery_capacity: DEFAULT_BATTERY_CAPACITY,
                    charge_rate: DEFAULT_CHARGE_RATE,
                    capacity: 4,
                    vertiport: "airport".into(),
                },
            ],
            demand: vec![
                DemandRecord {
                    src: "downtown".into(),
                    dest: "airport".into(),
                    unit_minutes: 60.0,
                    counts: vec![3, 5, 4, 2],
                },
                DemandRecord {
                    src: "airport".into(),
                    dest: "downtown".into(),
                    unit_minutes: 60.0,
                    counts: vec![2, 4, 5, 3],
                },
            ],
            transport_times: vec![
                TransportTimeRecord {
                    src: "downtown".into(),
                    dest: "airport".into(),
                    minutes: 25.0,
                },
                TransportTimeRecord {
                    src: "airport".into(),
                    dest: "downtown".into(),
                    minutes: 25.0,
                },
            ],
            ground_transport: Vec::new(),
        }
    }
}
