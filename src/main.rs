use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use vertiport_sim::simulation::{
    AppliedDetail, AppliedEvent, ArrivalMode, PolicyKind, Scenario, SimConfig, Simulation,
};

#[derive(Parser)]
#[command(name = "vertiport_sim")]
#[command(about = "Discrete-event simulation of a vertiport shuttle network")]
struct Cli {
    /// Scenario JSON file; a built-in example scenario runs when omitted
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Dispatch policy: greedy or reward
    #[arg(long, default_value = "greedy")]
    policy: String,

    /// Seed for demand placement and dispatch jitter, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Stop processing events past this time, in simulated minutes
    #[arg(long, default_value = "10080")]
    time_limit: f64,

    /// Arrival placement within demand buckets: uniform or bucket-start
    #[arg(long, default_value = "uniform")]
    arrival_mode: String,

    /// Write every applied event to this path as CSV
    #[arg(long)]
    event_log: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let policy = match cli.policy.as_str() {
        "greedy" => PolicyKind::Greedy,
        "reward" => PolicyKind::Reward,
        other => anyhow::bail!("unknown policy {:?}, expected greedy or reward", other),
    };
    let arrival_mode = match cli.arrival_mode.as_str() {
        "uniform" => ArrivalMode::Uniform,
        "bucket-start" => ArrivalMode::BucketStart,
        other => anyhow::bail!(
            "unknown arrival mode {:?}, expected uniform or bucket-start",
            other
        ),
    };

    let scenario = match &cli.scenario {
        Some(path) => Scenario::load(path)?,
        None => {
            println!("No scenario file given, running the built-in example");
            Scenario::example()
        }
    };

    let config = SimConfig {
        policy,
        arrival_mode,
        seed: cli.seed,
        time_ceiling: cli.time_limit,
        ..SimConfig::default()
    };
    let mut sim = Simulation::from_scenario(&scenario, config)?;

    let report = match &cli.event_log {
        Some(path) => {
            let mut events: Vec<AppliedEvent> = Vec::new();
            let report = sim.run_with_hook(|applied| events.push(applied.clone()));
            let rows = write_event_log(path, &events)?;
            println!("Wrote {} event rows to {}", rows, path.display());
            report
        }
        None => sim.run(),
    };

    println!("{}", report.summary());
    Ok(())
}

/// Column layout of the event log. The minutes column holds the enroute
/// time for flight_arrived rows, the trip latency for passenger_arrived
/// rows and the charge length for charge_finished rows.
const EVENT_LOG_HEADER: [&str; 9] = [
    "time",
    "event",
    "identity",
    "aircraft",
    "from",
    "to",
    "passengers",
    "battery",
    "minutes",
];

fn write_event_log(path: &Path, events: &[AppliedEvent]) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating event log {}", path.display()))?;
    writer
        .write_record(EVENT_LOG_HEADER)
        .context("writing event log header")?;
    let mut rows = 0usize;
    for applied in events {
        for row in event_rows(applied) {
            writer.write_record(&row).context("writing event log row")?;
            rows += 1;
        }
    }
    writer.flush().context("flushing event log")?;
    Ok(rows)
}

/// CSV rows for one applied event. A flight arrival also yields one
/// passenger_arrived row per delivered passenger.
fn event_rows(applied: &AppliedEvent) -> Vec<[String; 9]> {
    let time = format!("{:.2}", applied.time);
    let label = applied.label().to_string();
    match &applied.detail {
        AppliedDetail::PassengerQueued {
            passenger,
            vertiport,
            dest,
        } => vec![[
            time,
            label,
            format!("p{}", passenger.0),
            String::new(),
            vertiport.to_string(),
            dest.to_string(),
            "1".to_string(),
            String::new(),
            String::new(),
        ]],
        AppliedDetail::FlightDeparted {
            flight,
            aircraft,
            from,
            to,
            passengers_aboard,
        } => vec![[
            time,
            label,
            format!("f{}", flight.0),
            aircraft.0.to_string(),
            from.to_string(),
            to.to_string(),
            passengers_aboard.to_string(),
            String::new(),
            String::new(),
        ]],
        AppliedDetail::FlightArrived {
            flight,
            aircraft,
            vertiport,
            enroute_time,
            battery_after,
            dropoffs,
        } => {
            let mut out = vec![[
                time.clone(),
                label,
                format!("f{}", flight.0),
                aircraft.0.to_string(),
                String::new(),
                vertiport.to_string(),
                dropoffs.len().to_string(),
                format!("{:.1}", battery_after),
                format!("{:.2}", enroute_time),
            ]];
            for dropoff in dropoffs {
                out.push([
                    time.clone(),
                    "passenger_arrived".to_string(),
                    format!("p{}", dropoff.passenger.0),
                    aircraft.0.to_string(),
                    String::new(),
                    vertiport.to_string(),
                    "1".to_string(),
                    String::new(),
                    format!("{:.2}", dropoff.latency),
                ]);
            }
            out
        }
        AppliedDetail::ChargeFinished {
            aircraft,
            vertiport,
            duration,
            battery_after,
        } => vec![[
            time,
            label,
            format!("a{}", aircraft.0),
            aircraft.0.to_string(),
            String::new(),
            vertiport.to_string(),
            String::new(),
            format!("{:.1}", battery_after),
            format!("{:.2}", duration),
        ]],
    }
}
