//! Run metrics and reporting.
//!
//! Every event the processor applies is summarized as an [`AppliedEvent`]
//! record. The [`MetricsCollector`] folds those records into latency,
//! throughput and utilization figures, and [`SimulationReport`] renders
//! them after a run.

use std::collections::BTreeMap;

use super::processor::{RunOutcome, RunSummary};
use super::types::{AircraftId, EventId, FlightId, PassengerId, SimTime, VertiportName};

/// Width of a throughput histogram bucket, in minutes
pub const THROUGHPUT_BUCKET_MINUTES: f64 = 60.0;

/// A passenger delivered to their destination
#[derive(Debug, Clone)]
pub struct Dropoff {
    pub passenger: PassengerId,
    /// Minutes from showing up at the origin to arriving at the destination
    pub latency: f64,
}

/// What applying an event did to the world
#[derive(Debug, Clone)]
pub enum AppliedDetail {
    PassengerQueued {
        passenger: PassengerId,
        vertiport: VertiportName,
        dest: VertiportName,
    },
    FlightDeparted {
        flight: FlightId,
        aircraft: AircraftId,
        from: VertiportName,
        to: VertiportName,
        passengers_aboard: usize,
    },
    FlightArrived {
        flight: FlightId,
        aircraft: AircraftId,
        vertiport: VertiportName,
        enroute_time: f64,
        battery_after: f64,
        dropoffs: Vec<Dropoff>,
    },
    ChargeFinished {
        aircraft: AircraftId,
        vertiport: VertiportName,
        duration: f64,
        battery_after: f64,
    },
}

/// Record of one applied event
#[derive(Debug, Clone)]
pub struct AppliedEvent {
    pub event_id: EventId,
    pub time: SimTime,
    pub detail: AppliedDetail,
}

impl AppliedEvent {
    pub fn label(&self) -> &'static str {
        match self.detail {
            AppliedDetail::PassengerQueued { .. } => "passenger_queued",
            AppliedDetail::FlightDeparted { .. } => "flight_departed",
            AppliedDetail::FlightArrived { .. } => "flight_arrived",
            AppliedDetail::ChargeFinished { .. } => "charge_finished",
        }
    }
}

/// Minutes an aircraft spent in each activity over a run
#[derive(Debug, Clone, Copy, Default)]
pub struct AircraftTimes {
    pub flight: f64,
    pub charge: f64,
}

impl AircraftTimes {
    /// Minutes not spent flying or charging, given the run length
    pub fn idle(&self, run_length: f64) -> f64 {
        (run_length - self.flight - self.charge).max(0.0)
    }
}

/// Accumulates run statistics from the applied-event stream
#[derive(Debug, Default)]
pub struct MetricsCollector {
    pub passengers_queued: usize,
    pub passengers_delivered: usize,
    pub flights_departed: usize,
    pub flights_arrived: usize,
    pub charges_completed: usize,
    /// Latency of every delivered passenger, in minutes
    pub latencies: Vec<f64>,
    /// Deliveries per [`THROUGHPUT_BUCKET_MINUTES`] bucket, keyed by bucket index
    pub throughput: BTreeMap<u64, usize>,
    /// Per-aircraft activity minutes
    pub aircraft: BTreeMap<AircraftId, AircraftTimes>,
    /// Time of the latest recorded event
    pub last_time: SimTime,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-register an aircraft so it shows in the utilization breakdown
    /// even if it never flies
    pub fn register_aircraft(&mut self, id: AircraftId) {
        self.aircraft.entry(id).or_default();
    }

    pub fn record(&mut self, applied: &AppliedEvent) {
        self.last_time = self.last_time.max(applied.time);
        match &applied.detail {
            AppliedDetail::PassengerQueued { .. } => {
                self.passengers_queued += 1;
            }
            AppliedDetail::FlightDeparted { .. } => {
                self.flights_departed += 1;
            }
            AppliedDetail::FlightArrived {
                aircraft,
                enroute_time,
                dropoffs,
                ..
            } => {
                self.flights_arrived += 1;
                self.aircraft.entry(*aircraft).or_default().flight += enroute_time;
                self.passengers_delivered += dropoffs.len();
                if !dropoffs.is_empty() {
                    let bucket = (applied.time / THROUGHPUT_BUCKET_MINUTES) as u64;
                    *self.throughput.entry(bucket).or_insert(0) += dropoffs.len();
                    self.latencies.extend(dropoffs.iter().map(|d| d.latency));
                }
            }
            AppliedDetail::ChargeFinished {
                aircraft, duration, ..
            } => {
                self.charges_completed += 1;
                self.aircraft.entry(*aircraft).or_default().charge += duration;
            }
        }
    }

    pub fn mean_latency(&self) -> Option<f64> {
        if self.latencies.is_empty() {
            return None;
        }
        Some(self.latencies.iter().sum::<f64>() / self.latencies.len() as f64)
    }

    pub fn max_latency(&self) -> Option<f64> {
        self.latencies.iter().copied().fold(None, |acc, l| {
            Some(match acc {
                Some(best) if best >= l => best,
                _ => l,
            })
        })
    }
}

/// Final report of a completed run
#[derive(Debug)]
pub struct SimulationReport {
    pub run: RunSummary,
    pub policy: String,
    pub metrics: MetricsCollector,
    /// Passengers still waiting at a vertiport when the run ended
    pub passengers_left_waiting: usize,
    /// Passengers aboard an aircraft when the run ended
    pub passengers_left_aboard: usize,
}

impl SimulationReport {
    /// Multi-line human-readable summary
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Policy: {}\n", self.policy));
        let outcome = match self.run.outcome {
            RunOutcome::QueueDrained => "queue drained",
            RunOutcome::CeilingReached => "time ceiling reached",
        };
        out.push_str(&format!(
            "Outcome: {} at t={:.1} min ({} events applied, {} faults)\n",
            outcome, self.run.final_time, self.run.events_applied, self.run.faults
        ));
        out.push_str(&format!(
            "Passengers: {} queued, {} delivered, {} left waiting, {} left aboard\n",
            self.metrics.passengers_queued,
            self.metrics.passengers_delivered,
            self.passengers_left_waiting,
            self.passengers_left_aboard
        ));
        match (self.metrics.mean_latency(), self.metrics.max_latency()) {
            (Some(mean), Some(max)) => {
                out.push_str(&format!(
                    "Latency: mean {:.1} min, max {:.1} min\n",
                    mean, max
                ));
            }
            _ => out.push_str("Latency: no deliveries\n"),
        }
        out.push_str(&format!(
            "Flights: {} departed, {} arrived, {} charges completed\n",
            self.metrics.flights_departed,
            self.metrics.flights_arrived,
            self.metrics.charges_completed
        ));
        if !self.metrics.throughput.is_empty() {
            out.push_str("Throughput per hour:\n");
            for (bucket, count) in &self.metrics.throughput {
                out.push_str(&format!("  hour {}: {} delivered\n", bucket, count));
            }
        }
        if !self.metrics.aircraft.is_empty() {
            out.push_str("Aircraft utilization:\n");
            for (id, times) in &self.metrics.aircraft {
                out.push_str(&format!(
                    "  aircraft {}: flight {:.1} min, charge {:.1} min, idle {:.1} min\n",
                    id.0,
                    times.flight,
                    times.charge,
                    times.idle(self.run.final_time)
                ));
            }
        }
        out
    }
}
