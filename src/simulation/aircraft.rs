//! Aircraft state and battery bookkeeping.

use log::warn;

use super::types::{AircraftId, AircraftState, VertiportName};
use super::vertiport::Passenger;

/// A battery-limited aircraft shuttling passengers between vertiports
#[derive(Debug, Clone)]
pub struct Aircraft {
    pub id: AircraftId,
    /// Remaining flight range in minutes
    pub battery_level: f64,
    /// Maximum flight range in minutes
    pub battery_capacity: f64,
    /// Range-minutes gained per minute spent charging
    pub charge_rate: f64,
    /// Maximum passengers aboard
    pub capacity: usize,
    /// Vertiport the aircraft is parked at; meaningful only while not in flight
    pub location: VertiportName,
    /// Passengers currently aboard
    pub load: Vec<Passenger>,
    pub state: AircraftState,
}

impl Aircraft {
    pub fn new(
        id: AircraftId,
        battery_level: f64,
        battery_capacity: f64,
        charge_rate: f64,
        capacity: usize,
        location: VertiportName,
    ) -> Self {
        Self {
            id,
            battery_level: battery_level.clamp(0.0, battery_capacity),
            battery_capacity,
            charge_rate,
            capacity,
            location,
            load: Vec::new(),
            state: AircraftState::Idle,
        }
    }

    /// Board one passenger. Refuses the passenger back when the cabin is full.
    pub fn board(&mut self, passenger: Passenger) -> Result<(), Passenger> {
        if self.load.len() >= self.capacity {
            return Err(passenger);
        }
        self.load.push(passenger);
        Ok(())
    }

    /// Remove and return everyone aboard
    pub fn deplane(&mut self) -> Vec<Passenger> {
        std::mem::take(&mut self.load)
    }

    /// Consume battery for a completed flight leg.
    ///
    /// Range pre-checks belong to the dispatch policy; a drain past zero
    /// means one was skipped and is clamped here with a warning.
    pub fn drain(&mut self, minutes: f64) {
        let next = self.battery_level - minutes;
        if next < 0.0 {
            warn!(
                "Aircraft {:?} battery drained past zero ({:.1} min short); clamping to 0",
                self.id, -next
            );
        }
        self.battery_level = next.max(0.0);
    }

    /// Add charge at the aircraft's charge rate, capped at capacity
    pub fn recharge(&mut self, minutes: f64) {
        self.battery_level =
            (self.battery_level + minutes * self.charge_rate).min(self.battery_capacity);
    }

    /// Whether the remaining range covers a leg of the given length
    pub fn can_reach(&self, minutes: f64) -> bool {
        self.battery_level >= minutes
    }

    /// Free seats remaining
    pub fn seats_free(&self) -> usize {
        self.capacity.saturating_sub(self.load.len())
    }

    /// True while a booked departure is pending or a charge is running,
    /// meaning dispatch passes must skip this aircraft
    pub fn is_committed(&self) -> bool {
        matches!(
            self.state,
            AircraftState::Departing | AircraftState::Charging
        )
    }
}
