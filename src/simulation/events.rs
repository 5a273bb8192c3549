//! Event types carried on the simulation queue.

use super::types::{AircraftId, EventId, FlightId, PassengerId, SimTime, VertiportName};
use super::vertiport::Passenger;

/// A booked flight leg between two vertiports
#[derive(Debug, Clone)]
pub struct Flight {
    pub id: FlightId,
    pub aircraft: AircraftId,
    pub departure_vertiport: VertiportName,
    pub arrival_vertiport: VertiportName,
    pub departure_time: SimTime,
    /// Flight duration in minutes, also the battery cost of the leg
    pub enroute_time: f64,
}

impl Flight {
    pub fn arrival_time(&self) -> SimTime {
        self.departure_time + self.enroute_time
    }
}

/// A charging session booked for a grounded aircraft
#[derive(Debug, Clone)]
pub struct ChargeOperation {
    pub aircraft: AircraftId,
    /// Minutes the aircraft stays on the charger
    pub duration: f64,
}

/// Discriminant of an event, used together with [`EventKey`] to address
/// pending events for invalidation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PassengerArrival,
    Departure,
    Arrival,
    ChargeComplete,
}

/// Payload of a scheduled event. The variant fixes the kind, so an event
/// can never claim one kind while carrying another's data.
#[derive(Debug, Clone)]
pub enum EventPayload {
    /// A passenger shows up at their origin vertiport
    PassengerArrival(Passenger),
    /// A booked flight leaves the ground
    Departure(Flight),
    /// A flight reaches its destination
    Arrival(Flight),
    /// A charging session ends
    ChargeComplete(ChargeOperation),
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::PassengerArrival(_) => EventKind::PassengerArrival,
            EventPayload::Departure(_) => EventKind::Departure,
            EventPayload::Arrival(_) => EventKind::Arrival,
            EventPayload::ChargeComplete(_) => EventKind::ChargeComplete,
        }
    }

    /// Entity this event belongs to, for pending-event lookup
    pub fn key(&self) -> EventKey {
        match self {
            EventPayload::PassengerArrival(p) => EventKey::Passenger(p.id),
            EventPayload::Departure(f) | EventPayload::Arrival(f) => EventKey::Flight(f.id),
            EventPayload::ChargeComplete(op) => EventKey::Aircraft(op.aircraft),
        }
    }
}

/// Identity an event is scheduled against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKey {
    Passenger(PassengerId),
    Flight(FlightId),
    Aircraft(AircraftId),
}

/// A scheduled occurrence at a point in simulated time
#[derive(Debug, Clone)]
pub struct Event {
    pub id: EventId,
    pub time: SimTime,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, time: SimTime, payload: EventPayload) -> Self {
        Self { id, time, payload }
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    pub fn key(&self) -> EventKey {
        self.payload.key()
    }
}
