//! Dispatch policies: deciding which aircraft flies where, and when to charge.
//!
//! Policies react to applied events by booking flights and charges through
//! the [`EventProcessor`]. The shared pass skeleton here walks backlogged
//! vertiports and their ready aircraft; the policies only differ in how they
//! pick a destination and what they do when none is reachable.

mod greedy;
mod reward;

pub use greedy::GreedyPolicy;
pub use reward::{RewardPolicy, RewardWeights};

use log::warn;
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::Rng;

use super::aircraft::Aircraft;
use super::events::ChargeOperation;
use super::metrics::AppliedEvent;
use super::processor::EventProcessor;
use super::types::{AircraftId, VertiportName, DEFAULT_LOADING_DELAY};
use super::vertiport::Vertiport;

/// Fallback charge length booked by the greedy policy, in minutes
pub const GREEDY_CHARGE_MINUTES: f64 = 30.0;
/// Shortest charge the reward policy will book, in minutes
pub const MIN_CHARGE_MINUTES: f64 = 15.0;
/// Longest charge the reward policy will book, in minutes
pub const MAX_CHARGE_MINUTES: f64 = 90.0;

/// A dispatch strategy.
///
/// Implementations request every state change through processor calls and
/// never mutate vertiports or aircraft directly.
pub trait DispatchPolicy {
    /// React to an applied event, booking flights or charges as needed
    fn decide(&mut self, applied: &AppliedEvent, proc: &mut EventProcessor);

    fn name(&self) -> &'static str;
}

/// Tunables shared by both policies
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Minutes between booking a flight and its departure
    pub loading_delay: f64,
    /// Uniform jitter applied to the loading delay, in minutes
    pub loading_jitter: f64,
    /// Uniform jitter applied to enroute times at booking, in minutes
    pub transport_jitter: f64,
    /// Charge length the greedy policy books when no route is reachable
    pub greedy_charge_duration: f64,
    /// Shortest and longest charge the reward policy will book
    pub charge_bounds: (f64, f64),
    /// Seed for jitter draws; unseeded policies use thread-local entropy
    pub seed: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            loading_delay: DEFAULT_LOADING_DELAY,
            loading_jitter: 0.0,
            transport_jitter: 0.0,
            greedy_charge_duration: GREEDY_CHARGE_MINUTES,
            charge_bounds: (MIN_CHARGE_MINUTES, MAX_CHARGE_MINUTES),
            seed: None,
        }
    }
}

/// What a policy decided for one ready aircraft
#[derive(Debug, Clone)]
pub(crate) enum Choice {
    Fly {
        dest: VertiportName,
        enroute_time: f64,
    },
    Charge {
        duration: f64,
    },
}

/// Aircraft parked at a vertiport that a dispatch pass may use, ordered
/// fullest battery first, ties by ascending id. Aircraft already booked on
/// a flight or a charger are skipped.
pub(crate) fn ready_aircraft(proc: &EventProcessor, name: &VertiportName) -> Vec<AircraftId> {
    let Some(vertiport) = proc.vertiports.get(name) else {
        return Vec::new();
    };
    let mut ready: Vec<(f64, AircraftId)> = vertiport
        .parked
        .iter()
        .filter_map(|id| proc.aircraft.get(id))
        .filter(|a| !a.is_committed())
        .map(|a| (a.battery_level, a.id))
        .collect();
    ready.sort_by(|a, b| {
        OrderedFloat(b.0)
            .cmp(&OrderedFloat(a.0))
            .then_with(|| a.1.cmp(&b.1))
    });
    ready.into_iter().map(|(_, id)| id).collect()
}

/// Vertiports with at least one waiting passenger, in name order
pub(crate) fn backlogged_vertiports(proc: &EventProcessor) -> Vec<VertiportName> {
    proc.vertiports
        .values()
        .filter(|v| v.has_waiting())
        .map(|v| v.name.clone())
        .collect()
}

/// Apply uniform jitter of up to `jitter` minutes either way, floored at zero
pub(crate) fn jittered(base: f64, jitter: f64, rng: &mut Option<StdRng>) -> f64 {
    if jitter <= 0.0 {
        return base;
    }
    let offset = match rng {
        Some(rng) => rng.random_range(-jitter..=jitter),
        None => rand::rng().random_range(-jitter..=jitter),
    };
    (base + offset).max(0.0)
}

/// One dispatch pass: for every backlogged vertiport, offer each ready
/// aircraft to `choose` and carry out its decision. Aircraft get at most one
/// booking per pass, and a vertiport's pass ends when its queue empties.
pub(crate) fn run_pass<F>(
    proc: &mut EventProcessor,
    cfg: &DispatchConfig,
    rng: &mut Option<StdRng>,
    mut choose: F,
) where
    F: FnMut(&EventProcessor, &Vertiport, &Aircraft) -> Choice,
{
    for name in backlogged_vertiports(proc) {
        for aircraft_id in ready_aircraft(proc, &name) {
            let Some(vertiport) = proc.vertiports.get(&name) else {
                break;
            };
            if !vertiport.has_waiting() {
                break;
            }
            let Some(aircraft) = proc.aircraft.get(&aircraft_id) else {
                continue;
            };
            match choose(proc, vertiport, aircraft) {
                Choice::Fly { dest, enroute_time } => {
                    let departure_time =
                        proc.current_time() + jittered(cfg.loading_delay, cfg.loading_jitter, rng);
                    let enroute = jittered(enroute_time, cfg.transport_jitter, rng);
                    if let Err(fault) =
                        proc.dispatch_flight(&name, aircraft_id, &dest, departure_time, enroute)
                    {
                        warn!("dispatch pass skipped a flight: {}", fault);
                    }
                }
                Choice::Charge { duration } => {
                    let op = ChargeOperation {
                        aircraft: aircraft_id,
                        duration,
                    };
                    if let Err(fault) = proc.schedule_charge(op) {
                        warn!("dispatch pass skipped a charge: {}", fault);
                    }
                }
            }
        }
    }
}
