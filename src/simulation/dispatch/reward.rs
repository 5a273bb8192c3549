//! Reward-scored dispatch.

use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::simulation::metrics::AppliedEvent;
use crate::simulation::processor::EventProcessor;
use crate::simulation::types::{SimTime, VertiportName};
use crate::simulation::vertiport::Vertiport;

use super::{run_pass, Choice, DispatchConfig, DispatchPolicy};

/// Coefficients of the destination reward score.
///
/// A destination's score combines the size of its waiting group, the
/// longest and average waits within it, and the total backlog at the
/// origin vertiport.
#[derive(Debug, Clone, Copy)]
pub struct RewardWeights {
    pub group_size: f64,
    pub max_wait: f64,
    pub max_wait_bias: f64,
    pub avg_wait: f64,
    pub avg_wait_bias: f64,
    pub backlog: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            group_size: 30.0,
            max_wait: 0.75,
            max_wait_bias: -20.0,
            avg_wait: 2.0,
            avg_wait_bias: -2.5,
            backlog: 0.5,
        }
    }
}

impl RewardWeights {
    /// Score one destination group
    pub fn score(&self, group_size: usize, max_wait: f64, avg_wait: f64, backlog: f64) -> f64 {
        self.group_size * group_size as f64
            + (self.max_wait * max_wait + self.max_wait_bias)
            + (self.avg_wait * avg_wait + self.avg_wait_bias)
            + self.backlog * backlog
    }

    /// Destinations of a vertiport's waiting passengers, scored and sorted
    /// best first with ties broken by name
    pub fn rank_destinations(
        &self,
        vertiport: &Vertiport,
        now: SimTime,
    ) -> Vec<(VertiportName, f64)> {
        let backlog = vertiport.waiting.len() as f64;
        let mut ranked: Vec<(VertiportName, f64)> = vertiport
            .waiting_by_destination()
            .into_iter()
            .map(|(dest, group)| {
                let max_wait = group
                    .iter()
                    .map(|p| p.wait_time(now))
                    .fold(0.0_f64, f64::max);
                let avg_wait =
                    group.iter().map(|p| p.wait_time(now)).sum::<f64>() / group.len() as f64;
                let score = self.score(group.len(), max_wait, avg_wait, backlog);
                (dest, score)
            })
            .collect();
        ranked.sort_by(|a, b| {
            OrderedFloat(b.1)
                .cmp(&OrderedFloat(a.1))
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked
    }
}

/// Sends each ready aircraft toward the highest-scoring destination, or
/// charges it just enough to get back in the game.
///
/// Unlike [`super::GreedyPolicy`] this policy never falls through the
/// ranking: if the best destination is out of range the aircraft charges,
/// for the shortfall to the cheapest route out, clamped to the configured
/// bounds.
pub struct RewardPolicy {
    cfg: DispatchConfig,
    weights: RewardWeights,
    rng: Option<StdRng>,
}

impl RewardPolicy {
    pub fn new(cfg: DispatchConfig) -> Self {
        Self::with_weights(cfg, RewardWeights::default())
    }

    pub fn with_weights(cfg: DispatchConfig, weights: RewardWeights) -> Self {
        let rng = cfg.seed.map(StdRng::seed_from_u64);
        Self { cfg, weights, rng }
    }
}

impl DispatchPolicy for RewardPolicy {
    fn decide(&mut self, _applied: &AppliedEvent, proc: &mut EventProcessor) {
        let weights = self.weights;
        let (floor, cap) = self.cfg.charge_bounds;
        run_pass(proc, &self.cfg, &mut self.rng, |proc, vertiport, aircraft| {
            let ranked = weights.rank_destinations(vertiport, proc.current_time());
            if let Some((dest, _)) = ranked.first() {
                if let Some(minutes) = proc.network.minutes(&vertiport.name, dest) {
                    if aircraft.can_reach(minutes) {
                        return Choice::Fly {
                            dest: dest.clone(),
                            enroute_time: minutes,
                        };
                    }
                }
            }
            let duration = match proc.network.cheapest_from(&vertiport.name) {
                Some(need) => (need - aircraft.battery_level).clamp(floor, cap),
                None => floor,
            };
            Choice::Charge { duration }
        });
    }

    fn name(&self) -> &'static str {
        "reward"
    }
}
