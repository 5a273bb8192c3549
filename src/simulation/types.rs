//! Core types for the dispatch simulation
//!
//! Identifiers, the simulation clock unit, and shared defaults.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Simulation time in minutes from simulation start
pub type SimTime = f64;

/// Vertiport names are the unique keys used across demand, transport, and
/// fleet data, so they double as the lookup key for vertiport collections
pub type VertiportName = Arc<str>;

/// A wrapper type for aircraft IDs, taken from scenario input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AircraftId(pub u32);

/// A wrapper type for passenger IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassengerId(pub u64);

/// A wrapper type for flight IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlightId(pub u64);

/// A wrapper type for event IDs
///
/// Event IDs increase monotonically per processor and break ties between
/// events scheduled for the same instant, so they must order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u64);

/// What an aircraft is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AircraftState {
    /// Parked and available for dispatch
    Idle,
    /// Parked with a booked departure pending
    Departing,
    /// Flying a leg; not resident at any vertiport
    InFlight,
    /// Parked and recharging until the booked completion
    Charging,
}

/// Default battery capacity in minutes of flight range
pub const DEFAULT_BATTERY_CAPACITY: f64 = 90.0;

/// Default range-minutes gained per minute spent charging
pub const DEFAULT_CHARGE_RATE: f64 = 1.0;

/// Default minutes between booking a flight and wheels-up
pub const DEFAULT_LOADING_DELAY: f64 = 15.0;

/// Default safety ceiling: one simulated week
pub const DEFAULT_TIME_CEILING: SimTime = 7.0 * 24.0 * 60.0;
