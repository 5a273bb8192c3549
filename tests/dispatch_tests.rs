//! Dispatch policy behavior tests
//!
//! Covers the greedy and reward policies end to end on small worlds, plus
//! the reward scoring function itself.

use std::sync::Arc;

use vertiport_sim::simulation::{
    Aircraft, AircraftId, AircraftState, AppliedDetail, AppliedEvent, ChargeOperation,
    DispatchConfig, DispatchPolicy, EventId, EventKey, EventKind, EventProcessor, GreedyPolicy,
    Passenger, PassengerId, RewardPolicy, RewardWeights, RunOutcome, Vertiport, VertiportName,
};

fn name(s: &str) -> VertiportName {
    Arc::from(s)
}

fn add_idle_aircraft(
    proc: &mut EventProcessor,
    id: u32,
    battery: f64,
    seats: usize,
    at: &VertiportName,
) {
    let aircraft = Aircraft::new(AircraftId(id), battery, 90.0, 1.0, seats, at.clone());
    proc.add_aircraft(aircraft).unwrap();
}

fn seed_waiting(proc: &mut EventProcessor, at: &VertiportName, passenger: Passenger) {
    proc.vertiports
        .get_mut(at)
        .unwrap()
        .enqueue_passenger(passenger);
}

/// Trigger one dispatch pass. Policies rescan the whole world on every
/// decision, so the triggering event's content does not matter.
fn nudge(policy: &mut dyn DispatchPolicy, proc: &mut EventProcessor) {
    let applied = AppliedEvent {
        event_id: EventId(0),
        time: proc.current_time(),
        detail: AppliedDetail::PassengerQueued {
            passenger: PassengerId(u64::MAX),
            vertiport: name("nowhere"),
            dest: name("nowhere"),
        },
    };
    policy.decide(&applied, proc);
}

#[test]
fn test_greedy_serves_a_single_passenger() {
    let mut proc = EventProcessor::new();
    let alpha = proc.add_vertiport(1, "alpha", 4);
    let bravo = proc.add_vertiport(2, "bravo", 4);
    proc.add_route("alpha", "bravo", 30.0).unwrap();
    add_idle_aircraft(&mut proc, 1, 90.0, 4, &alpha);
    let passenger = Passenger::new(proc.allocate_passenger_id(), alpha.clone(), bravo.clone());
    proc.schedule_passenger_arrival(0.0, passenger);

    let mut policy = GreedyPolicy::new(DispatchConfig::default());
    let mut applied = Vec::new();
    let summary = proc.run(&mut policy, 10_000.0, |a| applied.push((a.label(), a.time)));

    assert_eq!(summary.outcome, RunOutcome::QueueDrained);
    assert_eq!(summary.faults, 0);
    // Booked on arrival, departed after the loading delay, landed 30 later
    assert_eq!(
        applied,
        vec![
            ("passenger_queued", 0.0),
            ("flight_departed", 15.0),
            ("flight_arrived", 45.0),
        ]
    );
    let aircraft = &proc.aircraft[&AircraftId(1)];
    assert_eq!(aircraft.battery_level, 60.0);
    assert!(aircraft.load.is_empty());
    assert!(proc.vertiports[&alpha].waiting.is_empty());
}

#[test]
fn test_greedy_charges_when_out_of_range_then_serves() {
    let mut proc = EventProcessor::new();
    let alpha = proc.add_vertiport(1, "alpha", 4);
    let bravo = proc.add_vertiport(2, "bravo", 4);
    proc.add_route("alpha", "bravo", 30.0).unwrap();
    add_idle_aircraft(&mut proc, 1, 10.0, 4, &alpha);
    let passenger = Passenger::new(proc.allocate_passenger_id(), alpha.clone(), bravo.clone());
    proc.schedule_passenger_arrival(0.0, passenger);

    let mut policy = GreedyPolicy::new(DispatchConfig::default());
    let mut applied = Vec::new();
    let summary = proc.run(&mut policy, 10_000.0, |a| applied.push((a.label(), a.time)));

    assert_eq!(summary.outcome, RunOutcome::QueueDrained);
    // Ten minutes of battery cannot fly a thirty minute leg: the aircraft
    // charges for the fixed stint first, then lifts the passenger
    assert_eq!(
        applied,
        vec![
            ("passenger_queued", 0.0),
            ("charge_finished", 30.0),
            ("flight_departed", 45.0),
            ("flight_arrived", 75.0),
        ]
    );
    assert_eq!(proc.aircraft[&AircraftId(1)].battery_level, 10.0);
    assert!(proc.vertiports[&alpha].waiting.is_empty());
}

#[test]
fn test_greedy_picks_the_biggest_group_and_fills_seats() {
    let mut proc = EventProcessor::new();
    let alpha = proc.add_vertiport(1, "alpha", 4);
    let xray = proc.add_vertiport(2, "xray", 4);
    let yankee = proc.add_vertiport(3, "yankee", 4);
    proc.add_route("alpha", "xray", 30.0).unwrap();
    proc.add_route("alpha", "yankee", 30.0).unwrap();
    add_idle_aircraft(&mut proc, 1, 90.0, 4, &alpha);
    for i in 0..5 {
        seed_waiting(
            &mut proc,
            &alpha,
            Passenger::new(PassengerId(i), alpha.clone(), xray.clone()),
        );
    }
    for i in 5..7 {
        seed_waiting(
            &mut proc,
            &alpha,
            Passenger::new(PassengerId(i), alpha.clone(), yankee.clone()),
        );
    }

    let mut policy = GreedyPolicy::new(DispatchConfig::default());
    nudge(&mut policy, &mut proc);

    let aircraft = &proc.aircraft[&AircraftId(1)];
    assert_eq!(aircraft.state, AircraftState::Departing);
    assert_eq!(aircraft.load.len(), 4);
    assert!(aircraft.load.iter().all(|p| p.dest == xray));
    // One xray passenger missed the seats, both yankee passengers stay
    assert_eq!(proc.vertiports[&alpha].waiting.len(), 3);
}

#[test]
fn test_greedy_walks_down_to_a_reachable_group() {
    let mut proc = EventProcessor::new();
    let alpha = proc.add_vertiport(1, "alpha", 4);
    let xray = proc.add_vertiport(2, "xray", 4);
    let yankee = proc.add_vertiport(3, "yankee", 4);
    proc.add_route("alpha", "xray", 100.0).unwrap();
    proc.add_route("alpha", "yankee", 30.0).unwrap();
    add_idle_aircraft(&mut proc, 1, 50.0, 4, &alpha);
    for i in 0..3 {
        seed_waiting(
            &mut proc,
            &alpha,
            Passenger::new(PassengerId(i), alpha.clone(), xray.clone()),
        );
    }
    seed_waiting(
        &mut proc,
        &alpha,
        Passenger::new(PassengerId(3), alpha.clone(), yankee.clone()),
    );

    let mut policy = GreedyPolicy::new(DispatchConfig::default());
    nudge(&mut policy, &mut proc);

    // The bigger xray group needs 100 minutes of range; greedy falls
    // through to the reachable yankee group instead of charging
    let aircraft = &proc.aircraft[&AircraftId(1)];
    assert_eq!(aircraft.state, AircraftState::Departing);
    assert_eq!(aircraft.load.len(), 1);
    assert_eq!(aircraft.load[0].dest, yankee);
    assert_eq!(proc.vertiports[&alpha].waiting.len(), 3);
}

#[test]
fn test_reward_charges_rather_than_skip_the_top_group() {
    let mut proc = EventProcessor::new();
    let alpha = proc.add_vertiport(1, "alpha", 4);
    let xray = proc.add_vertiport(2, "xray", 4);
    let yankee = proc.add_vertiport(3, "yankee", 4);
    proc.add_route("alpha", "xray", 100.0).unwrap();
    proc.add_route("alpha", "yankee", 30.0).unwrap();
    add_idle_aircraft(&mut proc, 1, 50.0, 4, &alpha);
    for i in 0..3 {
        seed_waiting(
            &mut proc,
            &alpha,
            Passenger::new(PassengerId(i), alpha.clone(), xray.clone()),
        );
    }
    seed_waiting(
        &mut proc,
        &alpha,
        Passenger::new(PassengerId(3), alpha.clone(), yankee.clone()),
    );

    let mut policy = RewardPolicy::new(DispatchConfig::default());
    nudge(&mut policy, &mut proc);

    // Same world as the greedy walk-down test, opposite call: the top
    // scored group is out of range, so the aircraft charges toward the
    // cheapest route out and nothing departs
    let aircraft = &proc.aircraft[&AircraftId(1)];
    assert_eq!(aircraft.state, AircraftState::Charging);
    assert!(proc
        .pending_events()
        .all(|e| e.kind() != EventKind::Departure));
    let charge = proc
        .pending_event(EventKey::Aircraft(AircraftId(1)), EventKind::ChargeComplete)
        .expect("charge should be pending");
    // Cheapest route needs 30, battery holds 50: the shortfall is negative
    // and the floor applies
    assert_eq!(charge.time, 15.0);
}

#[test]
fn test_reward_scores_favor_long_waits_over_group_size() {
    let mut vertiport = Vertiport::new(1, name("origin"), 4);
    // One passenger bound for xray has waited 200 minutes
    vertiport.enqueue_passenger(Passenger::new(PassengerId(0), name("origin"), name("xray")));
    // Ten passengers bound for yankee have waited one minute each
    for i in 1..=10 {
        let mut p = Passenger::new(PassengerId(i), name("origin"), name("yankee"));
        p.book_time = 199.0;
        vertiport.enqueue_passenger(p);
    }

    let ranked = RewardWeights::default().rank_destinations(&vertiport, 200.0);
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].0, name("xray"));
    assert!((ranked[0].1 - 563.0).abs() < 1e-9);
    assert_eq!(ranked[1].0, name("yankee"));
    assert!((ranked[1].1 - 285.75).abs() < 1e-9);
}

#[test]
fn test_reward_policy_books_the_top_destination_only() {
    let mut proc = EventProcessor::new();
    let origin = proc.add_vertiport(1, "origin", 4);
    let xray = proc.add_vertiport(2, "xray", 4);
    let _yankee = proc.add_vertiport(3, "yankee", 4);
    proc.add_route("origin", "xray", 30.0).unwrap();
    proc.add_route("origin", "yankee", 30.0).unwrap();
    add_idle_aircraft(&mut proc, 1, 90.0, 4, &origin);

    // Backlog as of t=200: one xray passenger aboard since t=0, ten
    // yankee passengers since t=199
    seed_waiting(
        &mut proc,
        &origin,
        Passenger::new(PassengerId(100), origin.clone(), xray.clone()),
    );
    for i in 0..10 {
        let mut p = Passenger::new(PassengerId(101 + i), origin.clone(), name("yankee"));
        p.book_time = 199.0;
        seed_waiting(&mut proc, &origin, p);
    }

    // Advance the clock to 200 with an arrival at another vertiport
    let clock_passenger = Passenger::new(PassengerId(200), xray.clone(), origin.clone());
    proc.schedule_passenger_arrival(200.0, clock_passenger);
    let event = proc.step().unwrap();
    let applied = proc.apply_event(event).unwrap();
    assert_eq!(proc.current_time(), 200.0);

    let mut policy = RewardPolicy::new(DispatchConfig::default());
    policy.decide(&applied, &mut proc);

    // The lone long-waiting passenger outscores the group of ten
    let aircraft = &proc.aircraft[&AircraftId(1)];
    assert_eq!(aircraft.state, AircraftState::Departing);
    assert_eq!(aircraft.load.len(), 1);
    assert_eq!(aircraft.load[0].dest, xray);
    assert_eq!(proc.vertiports[&origin].waiting.len(), 10);
}

#[test]
fn test_reward_charge_is_clamped_to_the_longest_stint() {
    let mut proc = EventProcessor::new();
    let alpha = proc.add_vertiport(1, "alpha", 4);
    let bravo = proc.add_vertiport(2, "bravo", 4);
    proc.add_route("alpha", "bravo", 200.0).unwrap();
    add_idle_aircraft(&mut proc, 1, 5.0, 4, &alpha);
    seed_waiting(
        &mut proc,
        &alpha,
        Passenger::new(PassengerId(0), alpha.clone(), bravo.clone()),
    );

    let mut policy = RewardPolicy::new(DispatchConfig::default());
    nudge(&mut policy, &mut proc);

    // Shortfall of 195 minutes caps at the 90 minute ceiling
    let charge = proc
        .pending_event(EventKey::Aircraft(AircraftId(1)), EventKind::ChargeComplete)
        .expect("charge should be pending");
    assert_eq!(charge.time, 90.0);
}

#[test]
fn test_committed_aircraft_are_not_dispatched() {
    let mut proc = EventProcessor::new();
    let alpha = proc.add_vertiport(1, "alpha", 4);
    let bravo = proc.add_vertiport(2, "bravo", 4);
    proc.add_route("alpha", "bravo", 30.0).unwrap();
    add_idle_aircraft(&mut proc, 1, 90.0, 4, &alpha);
    proc.schedule_charge(ChargeOperation {
        aircraft: AircraftId(1),
        duration: 30.0,
    })
    .unwrap();
    for i in 0..2 {
        seed_waiting(
            &mut proc,
            &alpha,
            Passenger::new(PassengerId(i), alpha.clone(), bravo.clone()),
        );
    }

    let mut policy = GreedyPolicy::new(DispatchConfig::default());
    nudge(&mut policy, &mut proc);

    // The only aircraft is on the charger; nothing else gets booked
    assert_eq!(proc.pending_events().count(), 1);
    assert_eq!(proc.aircraft[&AircraftId(1)].state, AircraftState::Charging);
    assert_eq!(proc.vertiports[&alpha].waiting.len(), 2);
}

#[test]
fn test_fullest_battery_flies_first() {
    let mut proc = EventProcessor::new();
    let alpha = proc.add_vertiport(1, "alpha", 4);
    let bravo = proc.add_vertiport(2, "bravo", 4);
    proc.add_route("alpha", "bravo", 30.0).unwrap();
    add_idle_aircraft(&mut proc, 1, 40.0, 4, &alpha);
    add_idle_aircraft(&mut proc, 2, 80.0, 4, &alpha);
    seed_waiting(
        &mut proc,
        &alpha,
        Passenger::new(PassengerId(0), alpha.clone(), bravo.clone()),
    );

    let mut policy = GreedyPolicy::new(DispatchConfig::default());
    nudge(&mut policy, &mut proc);

    // The fuller aircraft takes the passenger; once the backlog is empty
    // the pass leaves the other aircraft alone
    assert_eq!(proc.aircraft[&AircraftId(2)].state, AircraftState::Departing);
    assert_eq!(proc.aircraft[&AircraftId(2)].load.len(), 1);
    assert_eq!(proc.aircraft[&AircraftId(1)].state, AircraftState::Idle);
    assert!(proc
        .pending_events()
        .all(|e| e.kind() != EventKind::ChargeComplete));
}
