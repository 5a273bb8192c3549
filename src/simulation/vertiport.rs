//! Vertiports and the passengers waiting at them.

use std::collections::BTreeMap;

use super::types::{AircraftId, PassengerId, SimTime, VertiportName};

/// A traveller waiting for, or aboard, a flight
#[derive(Debug, Clone)]
pub struct Passenger {
    pub id: PassengerId,
    pub src: VertiportName,
    pub dest: VertiportName,
    /// Simulation time at which the passenger joined a vertiport queue.
    /// Stamped by the event processor when the arrival event applies.
    pub book_time: SimTime,
}

impl Passenger {
    pub fn new(id: PassengerId, src: VertiportName, dest: VertiportName) -> Self {
        Self {
            id,
            src,
            dest,
            book_time: 0.0,
        }
    }

    /// Minutes this passenger has been waiting since booking
    pub fn wait_time(&self, now: SimTime) -> f64 {
        now - self.book_time
    }
}

/// A fixed location where aircraft park and passengers wait
#[derive(Debug, Clone)]
pub struct Vertiport {
    pub id: u32,
    pub name: VertiportName,
    /// Advisory parking capacity from scenario data; not enforced as a hard
    /// cap on parked aircraft or waiting passengers
    pub capacity: usize,
    /// Aircraft physically resident, in arrival order. Kept in sync by the
    /// event processor; never edited by dispatch policies.
    pub parked: Vec<AircraftId>,
    /// Passengers waiting for a flight, in booking order
    pub waiting: Vec<Passenger>,
}

impl Vertiport {
    pub fn new(id: u32, name: VertiportName, capacity: usize) -> Self {
        Self {
            id,
            name,
            capacity,
            parked: Vec::new(),
            waiting: Vec::new(),
        }
    }

    /// Append a passenger to the waiting queue
    pub fn enqueue_passenger(&mut self, passenger: Passenger) {
        self.waiting.push(passenger);
    }

    /// Record an aircraft as resident here
    pub fn park(&mut self, aircraft: AircraftId) {
        if !self.parked.contains(&aircraft) {
            self.parked.push(aircraft);
        }
    }

    /// Remove an aircraft from the resident list.
    /// Returns false when it was not resident here.
    pub fn unpark(&mut self, aircraft: AircraftId) -> bool {
        let before = self.parked.len();
        self.parked.retain(|a| *a != aircraft);
        self.parked.len() != before
    }

    /// Waiting passengers grouped by destination, in destination-name order
    /// so decision passes visit groups deterministically
    pub fn waiting_by_destination(&self) -> BTreeMap<VertiportName, Vec<&Passenger>> {
        let mut groups: BTreeMap<VertiportName, Vec<&Passenger>> = BTreeMap::new();
        for passenger in &self.waiting {
            groups
                .entry(passenger.dest.clone())
                .or_default()
                .push(passenger);
        }
        groups
    }

    /// Remove up to `max` passengers bound for `dest`, earliest-booked first,
    /// preserving the order of everyone left behind
    pub fn take_passengers_for(&mut self, dest: &VertiportName, max: usize) -> Vec<Passenger> {
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.waiting.len());
        for passenger in self.waiting.drain(..) {
            if taken.len() < max && passenger.dest == *dest {
                taken.push(passenger);
            } else {
                kept.push(passenger);
            }
        }
        self.waiting = kept;
        taken
    }

    pub fn has_waiting(&self) -> bool {
        !self.waiting.is_empty()
    }
}
