use anyhow::{Context, Result};
use clap::Parser;
use marketsim_core::{ConsoleObserver, EventLogObserver, SimConfig, Simulation, TickTimer};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a JSON config file; missing fields take defaults
    #[arg(long)]
    config: Option<String>,

    /// Number of rounds to run
    #[arg(short, long, default_value_t = 20)]
    rounds: u32,

    /// RNG seed (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// Round interval in milliseconds (overrides the config)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Pace rounds against the wall clock instead of running flat out
    #[arg(long, default_value_t = false)]
    realtime: bool,

    /// Write the event log as JSONL to this file ("-" for stdout)
    #[arg(long)]
    events: Option<String>,

    /// Suppress the per-round console summary
    #[arg(short, long, default_value_t = false)]
    quiet: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = std::str::FromStr::from_str(&args.log_level).unwrap_or(log::LevelFilter::Warn);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {path}"))?;
            serde_json::from_str::<SimConfig>(&text)
                .with_context(|| format!("parsing config {path}"))?
        }
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let mut sim = Simulation::new(config);

    if !args.quiet {
        sim.register_observer(Box::new(ConsoleObserver));
    }
    if let Some(target) = &args.events {
        let observer = if target == "-" {
            EventLogObserver::stdout()
        } else {
            EventLogObserver::file(target).with_context(|| format!("opening {target}"))?
        };
        sim.register_observer(Box::new(observer));
    }

    log::info!("running {} rounds with seed {}", args.rounds, sim.config().seed);

    let mut timer = TickTimer::new(Duration::from_millis(sim.config().round_interval_ms));
    let interval = match args.interval_ms {
        Some(ms) => {
            let interval = Duration::from_millis(ms);
            timer.set_interval(interval);
            interval
        }
        None => Duration::from_millis(sim.config().round_interval_ms),
    };
    timer.start();

    let mut completed = 0;
    while completed < args.rounds {
        let dt = if args.realtime {
            let dt = interval.min(Duration::from_millis(50));
            std::thread::sleep(dt);
            dt
        } else {
            interval
        };

        for _ in 0..timer.advance(dt) {
            if completed >= args.rounds {
                break;
            }
            sim.step_round();
            completed += 1;
        }
    }

    let state = sim.state();
    log::info!(
        "finished: round {}, cash {}, net worth {}",
        state.round,
        state.money,
        state.net_worth()
    );

    sim.shutdown();
    Ok(())
}
