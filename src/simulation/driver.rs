//! The simulation driver: builds a world from a scenario and runs it.

use anyhow::{Context, Result};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::aircraft::Aircraft;
use super::dispatch::{DispatchConfig, DispatchPolicy, GreedyPolicy, RewardPolicy, RewardWeights};
use super::metrics::{AppliedEvent, MetricsCollector, SimulationReport};
use super::processor::EventProcessor;
use super::scenario::Scenario;
use super::types::{AircraftId, SimTime, DEFAULT_TIME_CEILING};
use super::vertiport::Passenger;

/// How demand counts turn into arrival times within their bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalMode {
    /// Spread arrivals uniformly at random across the bucket
    Uniform,
    /// Put every arrival at the start of its bucket. Deterministic, useful
    /// for comparing policies without demand noise.
    BucketStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    Greedy,
    Reward,
}

/// Knobs for one simulation run
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub policy: PolicyKind,
    pub arrival_mode: ArrivalMode,
    /// Seed for demand placement and, unless overridden, dispatch jitter.
    /// Unseeded runs draw from thread-local entropy.
    pub seed: Option<u64>,
    /// Hard stop: no event past this time is applied
    pub time_ceiling: SimTime,
    pub dispatch: DispatchConfig,
    pub reward_weights: RewardWeights,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Greedy,
            arrival_mode: ArrivalMode::Uniform,
            seed: None,
            time_ceiling: DEFAULT_TIME_CEILING,
            dispatch: DispatchConfig::default(),
            reward_weights: RewardWeights::default(),
        }
    }
}

/// A ready-to-run simulation: world state plus the chosen policy
pub struct Simulation {
    pub processor: EventProcessor,
    policy: Box<dyn DispatchPolicy>,
    config: SimConfig,
    rng: Option<StdRng>,
    fleet_ids: Vec<AircraftId>,
}

impl Simulation {
    /// Build the world from a scenario and seed its demand
    pub fn from_scenario(scenario: &Scenario, config: SimConfig) -> Result<Self> {
        scenario.validate()?;
        let mut processor = EventProcessor::new();
        for v in &scenario.vertiports {
            processor.add_vertiport(v.id, v.name.as_ref(), v.capacity);
        }
        for t in &scenario.transport_times {
            processor
                .add_route(t.src.as_ref(), t.dest.as_ref(), t.minutes)
                .with_context(|| format!("adding route {} -> {}", t.src, t.dest))?;
        }
        let mut fleet_ids = Vec::new();
        for f in &scenario.fleet {
            let id = AircraftId(f.id);
            let aircraft = Aircraft::new(
                id,
                f.battery_level,
                f.battery_capacity,
                f.charge_rate,
                f.capacity,
                f.vertiport.clone(),
            );
            processor
                .add_aircraft(aircraft)
                .with_context(|| format!("registering aircraft {}", f.id))?;
            fleet_ids.push(id);
        }
        info!(
            "world ready: {} vertiports, {} routes, {} aircraft",
            processor.network.vertiport_count(),
            processor.network.route_count(),
            fleet_ids.len()
        );
        let mut dispatch = config.dispatch.clone();
        if dispatch.seed.is_none() {
            dispatch.seed = config.seed;
        }
        let policy: Box<dyn DispatchPolicy> = match config.policy {
            PolicyKind::Greedy => Box::new(GreedyPolicy::new(dispatch)),
            PolicyKind::Reward => {
                Box::new(RewardPolicy::with_weights(dispatch, config.reward_weights))
            }
        };
        let rng = config.seed.map(StdRng::seed_from_u64);
        let mut sim = Self {
            processor,
            policy,
            config,
            rng,
            fleet_ids,
        };
        sim.seed_demand(scenario);
        Ok(sim)
    }

    /// Schedule a PassengerArrival for every unit of demand
    fn seed_demand(&mut self, scenario: &Scenario) {
        let mut seeded = 0usize;
        for record in &scenario.demand {
            for (bucket, &count) in record.counts.iter().enumerate() {
                let bucket_start = bucket as f64 * record.unit_minutes;
                for _ in 0..count {
                    let time = match self.config.arrival_mode {
                        ArrivalMode::BucketStart => bucket_start,
                        ArrivalMode::Uniform => {
                            bucket_start + self.random_offset(record.unit_minutes)
                        }
                    };
                    let id = self.processor.allocate_passenger_id();
                    let passenger = Passenger::new(id, record.src.clone(), record.dest.clone());
                    self.processor.schedule_passenger_arrival(time, passenger);
                    seeded += 1;
                }
            }
        }
        info!(
            "seeded {} passenger arrivals over {} demand routes",
            seeded,
            scenario.demand.len()
        );
    }

    fn random_offset(&mut self, upper: f64) -> f64 {
        match &mut self.rng {
            Some(rng) => rng.random_range(0.0..upper),
            None => rand::rng().random_range(0.0..upper),
        }
    }

    /// Run to completion and report
    pub fn run(&mut self) -> SimulationReport {
        self.run_with_hook(|_| {})
    }

    /// Run to completion, handing every applied event to `hook` as well as
    /// to the metrics collector
    pub fn run_with_hook<F>(&mut self, mut hook: F) -> SimulationReport
    where
        F: FnMut(&AppliedEvent),
    {
        let mut collector = MetricsCollector::new();
        for &id in &self.fleet_ids {
            collector.register_aircraft(id);
        }
        let run = self
            .processor
            .run(self.policy.as_mut(), self.config.time_ceiling, |applied| {
                collector.record(applied);
                hook(applied);
            });
        info!(
            "run finished: {:?} after {} events at t={:.1}",
            run.outcome, run.events_applied, run.final_time
        );
        let passengers_left_waiting = self
            .processor
            .vertiports
            .values()
            .map(|v| v.waiting.len())
            .sum();
        let passengers_left_aboard = self
            .processor
            .aircraft
            .values()
            .map(|a| a.load.len())
            .sum();
        SimulationReport {
            run,
            policy: self.policy.name().to_string(),
            metrics: collector,
            passengers_left_waiting,
            passengers_left_aboard,
        }
    }
}
