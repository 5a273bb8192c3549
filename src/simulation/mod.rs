//! Discrete-event vertiport shuttle simulation
//!
//! This module contains the whole simulation core: the event queue and
//! processor, the world model of vertiports and aircraft, the dispatch
//! policies and the scenario loader. It runs headless and is driven
//! entirely through [`Simulation`] or the lower-level [`EventProcessor`].

mod aircraft;
mod dispatch;
mod driver;
mod events;
mod metrics;
mod network;
mod processor;
mod queue;
mod scenario;
mod types;
mod vertiport;

pub use aircraft::Aircraft;
pub use dispatch::{
    DispatchConfig, DispatchPolicy, GreedyPolicy, RewardPolicy, RewardWeights,
    GREEDY_CHARGE_MINUTES, MAX_CHARGE_MINUTES, MIN_CHARGE_MINUTES,
};
pub use driver::{ArrivalMode, PolicyKind, SimConfig, Simulation};
pub use events::{ChargeOperation, Event, EventKey, EventKind, EventPayload, Flight};
pub use metrics::{
    AircraftTimes, AppliedDetail, AppliedEvent, Dropoff, MetricsCollector, SimulationReport,
    THROUGHPUT_BUCKET_MINUTES,
};
pub use network::TransportNetwork;
pub use processor::{EventProcessor, RunOutcome, RunSummary, SimulationFault};
pub use queue::EventQueue;
pub use scenario::{
    DemandRecord, FleetRecord, GroundTransportRecord, Scenario, TransportTimeRecord,
    VertiportRecord,
};
pub use types::{
    AircraftId, AircraftState, EventId, FlightId, PassengerId, SimTime, VertiportName,
    DEFAULT_BATTERY_CAPACITY, DEFAULT_CHARGE_RATE, DEFAULT_LOADING_DELAY, DEFAULT_TIME_CEILING,
};
pub use vertiport::{Passenger, Vertiport};
