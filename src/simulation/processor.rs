//! The event processor: owns the world state and applies events to it.
//!
//! All state changes flow through [`EventProcessor::apply_event`]. Dispatch
//! policies never touch vertiports or aircraft directly for scheduling;
//! they request flights and charges through the processor so the pending
//! index and the parked index stay consistent.

use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;

use super::aircraft::Aircraft;
use super::dispatch::DispatchPolicy;
use super::events::{ChargeOperation, Event, EventKey, EventKind, EventPayload, Flight};
use super::metrics::{AppliedDetail, AppliedEvent, Dropoff};
use super::network::TransportNetwork;
use super::queue::EventQueue;
use super::types::{
    AircraftId, AircraftState, EventId, FlightId, PassengerId, SimTime, VertiportName,
};
use super::vertiport::{Passenger, Vertiport};

/// A consistency violation detected while applying an event.
///
/// Faults are reported and the offending event dropped; the run continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationFault {
    #[error("aircraft {aircraft:?} for flight {flight:?} is not parked at any vertiport")]
    DepartingAircraftNotParked {
        flight: FlightId,
        aircraft: AircraftId,
    },
    #[error("no vertiport named {0}")]
    UnknownVertiport(VertiportName),
    #[error("no aircraft with id {0:?}")]
    UnknownAircraft(AircraftId),
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// No events left to process
    QueueDrained,
    /// The next event lay beyond the time ceiling
    CeilingReached,
}

/// Totals for a completed run
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub events_applied: usize,
    pub faults: usize,
    /// Clock when the run stopped, the time of the last applied event
    pub final_time: SimTime,
}

/// Owns the simulated world and drives it event by event
#[derive(Debug, Default)]
pub struct EventProcessor {
    queue: EventQueue,
    /// Latest scheduled event per entity and kind, for invalidation lookups
    pending: HashMap<(EventKey, EventKind), Event>,
    current_time: SimTime,
    pub vertiports: BTreeMap<VertiportName, Vertiport>,
    pub aircraft: HashMap<AircraftId, Aircraft>,
    pub network: TransportNetwork,
    next_event_id: u64,
    next_flight_id: u64,
    next_passenger_id: u64,
}

impl EventProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time of the most recently popped event. Never moves backwards and
    /// never passes the run's time ceiling.
    pub fn current_time(&self) -> SimTime {
        self.current_time
    }

    pub fn add_vertiport(&mut self, id: u32, name: &str, capacity: usize) -> VertiportName {
        let name: VertiportName = Arc::from(name);
        self.vertiports
            .insert(name.clone(), Vertiport::new(id, name.clone(), capacity));
        name
    }

    pub fn add_route(&mut self, src: &str, dest: &str, minutes: f64) -> Result<(), SimulationFault> {
        let src = self.vertiport_name(src)?;
        let dest = self.vertiport_name(dest)?;
        self.network.add_route(&src, &dest, minutes);
        Ok(())
    }

    /// Register an aircraft and park it at its starting vertiport
    pub fn add_aircraft(&mut self, aircraft: Aircraft) -> Result<(), SimulationFault> {
        let vertiport = self
            .vertiports
            .get_mut(&aircraft.location)
            .ok_or_else(|| SimulationFault::UnknownVertiport(aircraft.location.clone()))?;
        vertiport.park(aircraft.id);
        self.aircraft.insert(aircraft.id, aircraft);
        Ok(())
    }

    /// Interned name of a known vertiport
    fn vertiport_name(&self, name: &str) -> Result<VertiportName, SimulationFault> {
        self.vertiports
            .get_key_value(name)
            .map(|(key, _)| key.clone())
            .ok_or_else(|| SimulationFault::UnknownVertiport(Arc::from(name)))
    }

    pub fn allocate_passenger_id(&mut self) -> PassengerId {
        let id = PassengerId(self.next_passenger_id);
        self.next_passenger_id += 1;
        id
    }

    /// Push an event, superseding any pending event with the same identity
    /// and kind. Returns the new event's id.
    fn enqueue(&mut self, time: SimTime, payload: EventPayload) -> EventId {
        let id = EventId(self.next_event_id);
        self.next_event_id += 1;
        let event = Event::new(id, time, payload);
        let slot = (event.key(), event.kind());
        if let Some(stale) = self.pending.insert(slot, event.clone()) {
            warn!(
                "superseding pending {:?} event {:?} with {:?}",
                slot.1, stale.id, id
            );
            self.queue.invalidate(stale.id);
        }
        self.queue.push(event);
        id
    }

    pub fn schedule_passenger_arrival(&mut self, time: SimTime, passenger: Passenger) -> EventId {
        self.enqueue(time, EventPayload::PassengerArrival(passenger))
    }

    /// Book a flight's Departure and Arrival events
    pub fn schedule_flight(&mut self, flight: Flight) -> (EventId, EventId) {
        let departure = self.enqueue(
            flight.departure_time,
            EventPayload::Departure(flight.clone()),
        );
        let arrival = self.enqueue(flight.arrival_time(), EventPayload::Arrival(flight));
        (departure, arrival)
    }

    /// Put an aircraft on the charger now. The aircraft is marked Charging
    /// immediately so dispatch passes skip it until the charge completes.
    pub fn schedule_charge(&mut self, op: ChargeOperation) -> Result<EventId, SimulationFault> {
        let aircraft = self
            .aircraft
            .get_mut(&op.aircraft)
            .ok_or(SimulationFault::UnknownAircraft(op.aircraft))?;
        aircraft.state = AircraftState::Charging;
        let time = self.current_time + op.duration;
        Ok(self.enqueue(time, EventPayload::ChargeComplete(op)))
    }

    /// Board waiting passengers bound for `dest` and book the flight.
    ///
    /// Boards up to the aircraft's free seats, earliest-arrived first, marks
    /// the aircraft Departing, and schedules the Departure and Arrival pair.
    pub fn dispatch_flight(
        &mut self,
        origin: &VertiportName,
        aircraft_id: AircraftId,
        dest: &VertiportName,
        departure_time: SimTime,
        enroute_time: f64,
    ) -> Result<FlightId, SimulationFault> {
        let aircraft = self
            .aircraft
            .get_mut(&aircraft_id)
            .ok_or(SimulationFault::UnknownAircraft(aircraft_id))?;
        let vertiport = self
            .vertiports
            .get_mut(origin)
            .ok_or_else(|| SimulationFault::UnknownVertiport(origin.clone()))?;
        for passenger in vertiport.take_passengers_for(dest, aircraft.seats_free()) {
            if let Err(refused) = aircraft.board(passenger) {
                warn!(
                    "aircraft {:?} refused passenger {:?} at boarding, returning them to the queue",
                    aircraft_id, refused.id
                );
                vertiport.enqueue_passenger(refused);
            }
        }
        aircraft.state = AircraftState::Departing;
        let flight_id = FlightId(self.next_flight_id);
        self.next_flight_id += 1;
        debug!(
            "t={:.1} booked flight {:?}: aircraft {:?} {} -> {} departing {:.1}",
            self.current_time, flight_id, aircraft_id, origin, dest, departure_time
        );
        self.schedule_flight(Flight {
            id: flight_id,
            aircraft: aircraft_id,
            departure_vertiport: origin.clone(),
            arrival_vertiport: dest.clone(),
            departure_time,
            enroute_time,
        });
        Ok(flight_id)
    }

    /// Reschedule or rewrite the pending event for an entity.
    ///
    /// The old event is invalidated and a fresh one enqueued with the given
    /// overrides, keeping unspecified parts. Returns the replacement's id,
    /// or None when no such event is pending.
    pub fn modify_event(
        &mut self,
        key: EventKey,
        kind: EventKind,
        new_time: Option<SimTime>,
        new_payload: Option<EventPayload>,
    ) -> Option<EventId> {
        let old = self.pending.remove(&(key, kind))?;
        self.queue.invalidate(old.id);
        let time = new_time.unwrap_or(old.time);
        let payload = new_payload.unwrap_or(old.payload);
        Some(self.enqueue(time, payload))
    }

    /// The pending event for an entity and kind, if any
    pub fn pending_event(&self, key: EventKey, kind: EventKind) -> Option<&Event> {
        self.pending.get(&(key, kind))
    }

    pub fn pending_events(&self) -> impl Iterator<Item = &Event> {
        self.pending.values()
    }

    pub fn queued_events(&self) -> usize {
        self.queue.len()
    }

    /// Pop the next valid event and advance the clock to it
    pub fn step(&mut self) -> Option<Event> {
        let event = self.queue.pop_next_valid()?;
        self.current_time = event.time;
        let slot = (event.key(), event.kind());
        // Only clear the pending entry if it still refers to this event;
        // a superseding schedule may have replaced it already.
        if self.pending.get(&slot).map(|p| p.id) == Some(event.id) {
            self.pending.remove(&slot);
        }
        Some(event)
    }

    /// Apply one event to the world. On a fault, the world is left untouched.
    pub fn apply_event(&mut self, event: Event) -> Result<AppliedEvent, SimulationFault> {
        let Event { id, time, payload } = event;
        let detail = match payload {
            EventPayload::PassengerArrival(mut passenger) => {
                let vertiport = self
                    .vertiports
                    .get_mut(&passenger.src)
                    .ok_or_else(|| SimulationFault::UnknownVertiport(passenger.src.clone()))?;
                passenger.book_time = time;
                let detail = AppliedDetail::PassengerQueued {
                    passenger: passenger.id,
                    vertiport: passenger.src.clone(),
                    dest: passenger.dest.clone(),
                };
                vertiport.enqueue_passenger(passenger);
                detail
            }
            EventPayload::Departure(flight) => {
                let aircraft = self
                    .aircraft
                    .get_mut(&flight.aircraft)
                    .ok_or(SimulationFault::UnknownAircraft(flight.aircraft))?;
                let unparked = self
                    .vertiports
                    .values_mut()
                    .any(|v| v.unpark(flight.aircraft));
                if !unparked {
                    return Err(SimulationFault::DepartingAircraftNotParked {
                        flight: flight.id,
                        aircraft: flight.aircraft,
                    });
                }
                aircraft.state = AircraftState::InFlight;
                AppliedDetail::FlightDeparted {
                    flight: flight.id,
                    aircraft: flight.aircraft,
                    from: flight.departure_vertiport.clone(),
                    to: flight.arrival_vertiport.clone(),
                    passengers_aboard: aircraft.load.len(),
                }
            }
            EventPayload::Arrival(flight) => {
                let aircraft = self
                    .aircraft
                    .get_mut(&flight.aircraft)
                    .ok_or(SimulationFault::UnknownAircraft(flight.aircraft))?;
                let vertiport = self
                    .vertiports
                    .get_mut(&flight.arrival_vertiport)
                    .ok_or_else(|| {
                        SimulationFault::UnknownVertiport(flight.arrival_vertiport.clone())
                    })?;
                vertiport.park(flight.aircraft);
                if vertiport.parked.len() > vertiport.capacity {
                    debug!(
                        "vertiport {} over pad capacity: {} parked, {} pads",
                        vertiport.name,
                        vertiport.parked.len(),
                        vertiport.capacity
                    );
                }
                aircraft.location = flight.arrival_vertiport.clone();
                aircraft.state = AircraftState::Idle;
                aircraft.drain(flight.enroute_time);
                let dropoffs: Vec<Dropoff> = aircraft
                    .deplane()
                    .into_iter()
                    .map(|p| Dropoff {
                        passenger: p.id,
                        latency: time - p.book_time,
                    })
                    .collect();
                AppliedDetail::FlightArrived {
                    flight: flight.id,
                    aircraft: flight.aircraft,
                    vertiport: flight.arrival_vertiport.clone(),
                    enroute_time: flight.enroute_time,
                    battery_after: aircraft.battery_level,
                    dropoffs,
                }
            }
            EventPayload::ChargeComplete(op) => {
                let aircraft = self
                    .aircraft
                    .get_mut(&op.aircraft)
                    .ok_or(SimulationFault::UnknownAircraft(op.aircraft))?;
                aircraft.recharge(op.duration);
                aircraft.state = AircraftState::Idle;
                AppliedDetail::ChargeFinished {
                    aircraft: op.aircraft,
                    vertiport: aircraft.location.clone(),
                    duration: op.duration,
                    battery_after: aircraft.battery_level,
                }
            }
        };
        Ok(AppliedEvent {
            event_id: id,
            time,
            detail,
        })
    }

    /// Run the event loop until the queue drains or the next event would
    /// pass `ceiling`.
    ///
    /// The ceiling is checked before popping, so the clock stops at the last
    /// event at or under it. The policy is consulted after every applied
    /// PassengerArrival, Arrival and ChargeComplete; Departures only confirm
    /// decisions already made. Each applied event is also handed to
    /// `on_applied` for metrics or logging.
    pub fn run<F>(
        &mut self,
        policy: &mut dyn DispatchPolicy,
        ceiling: SimTime,
        mut on_applied: F,
    ) -> RunSummary
    where
        F: FnMut(&AppliedEvent),
    {
        let mut events_applied = 0usize;
        let mut faults = 0usize;
        let outcome = loop {
            match self.queue.next_time() {
                None => break RunOutcome::QueueDrained,
                Some(t) if t > ceiling => break RunOutcome::CeilingReached,
                Some(_) => {}
            }
            let Some(event) = self.step() else {
                break RunOutcome::QueueDrained;
            };
            let kind = event.kind();
            match self.apply_event(event) {
                Ok(applied) => {
                    events_applied += 1;
                    debug!("t={:.1} applied {}", applied.time, applied.label());
                    on_applied(&applied);
                    if matches!(
                        kind,
                        EventKind::PassengerArrival | EventKind::Arrival | EventKind::ChargeComplete
                    ) {
                        policy.decide(&applied, self);
                    }
                }
                Err(fault) => {
                    faults += 1;
                    warn!("dropping event: {}", fault);
                }
            }
        };
        RunSummary {
            outcome,
            events_applied,
            faults,
            final_time: self.current_time,
        }
    }
}
