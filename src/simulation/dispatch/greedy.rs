//! Busiest-destination-first dispatch.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::simulation::metrics::AppliedEvent;
use crate::simulation::processor::EventProcessor;
use crate::simulation::types::VertiportName;

use super::{run_pass, Choice, DispatchConfig, DispatchPolicy};

/// Sends each ready aircraft toward the destination with the most waiting
/// passengers it can reach on its current battery.
///
/// Destinations are ranked by queue length, longest first with ties broken
/// by name, and walked in order until a reachable one turns up. An aircraft
/// that can reach none of them is put on the charger for a fixed stint.
pub struct GreedyPolicy {
    cfg: DispatchConfig,
    rng: Option<StdRng>,
}

impl GreedyPolicy {
    pub fn new(cfg: DispatchConfig) -> Self {
        let rng = cfg.seed.map(StdRng::seed_from_u64);
        Self { cfg, rng }
    }
}

impl DispatchPolicy for GreedyPolicy {
    fn decide(&mut self, _applied: &AppliedEvent, proc: &mut EventProcessor) {
        let charge = self.cfg.greedy_charge_duration;
        run_pass(proc, &self.cfg, &mut self.rng, |proc, vertiport, aircraft| {
            let groups = vertiport.waiting_by_destination();
            let mut ranked: Vec<(&VertiportName, usize)> =
                groups.iter().map(|(dest, group)| (dest, group.len())).collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            for (dest, _) in ranked {
                let Some(minutes) = proc.network.minutes(&vertiport.name, dest) else {
                    continue;
                };
                if aircraft.can_reach(minutes) {
                    return Choice::Fly {
                        dest: dest.clone(),
                        enroute_time: minutes,
                    };
                }
            }
            Choice::Charge { duration: charge }
        });
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}
