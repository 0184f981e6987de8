use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use throttle_gate::{Throttle, ThrottleConfig, Valve};

/// Drive a throttle gate with a synthetic event stream.
#[derive(Parser, Debug)]
#[command(name = "throttle-gate", version, about)]
struct Args {
    /// YAML configuration file (overridden by the flags below)
    #[arg(short, long)]
    config: Option<String>,

    /// Events admitted per period
    #[arg(long)]
    max_events: Option<u64>,

    /// Period length in milliseconds
    #[arg(long)]
    period_ms: Option<u64>,

    /// Number of events to send
    #[arg(long, default_value_t = 20)]
    events: u64,

    /// Delay between events in milliseconds
    #[arg(long, default_value_t = 10)]
    interval_ms: u64,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);
    if args.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let mut config = match &args.config {
        Some(path) => ThrottleConfig::from_file(path)?,
        None => ThrottleConfig::default(),
    };
    if let Some(max_events) = args.max_events {
        config.max_events_in_period = max_events;
    }
    if let Some(period_ms) = args.period_ms {
        config.period = Duration::from_millis(period_ms);
    }

    info!(
        max_events_in_period = config.max_events_in_period,
        period_ms = config.period.as_millis() as u64,
        "Configuration loaded"
    );

    let reported = Arc::new(AtomicU64::new(0));
    let sink = Arc::clone(&reported);
    let gate = Throttle::with_config(config, move |rejected| {
        info!(rejected = rejected, "Period closed with rejected events");
        sink.fetch_add(rejected, Ordering::SeqCst);
    })?;

    let (mut open, mut closing, mut closed) = (0u64, 0u64, 0u64);
    let mut ticker = tokio::time::interval(Duration::from_millis(args.interval_ms.max(1)));

    for event in 0..args.events {
        ticker.tick().await;
        let valve = gate.check();
        debug!(event = event, valve = %valve, "Event checked");
        match valve {
            Valve::Open => open += 1,
            Valve::Closing => closing += 1,
            Valve::Closed => closed += 1,
        }
    }

    // Let the last period drain so its overflow is reported
    tokio::time::sleep(gate.period() + Duration::from_millis(10)).await;

    let stats = gate.stats();
    info!(
        open = open,
        closing = closing,
        closed = closed,
        reported_overflow = reported.load(Ordering::SeqCst),
        cycles = stats.cycles_completed,
        "Run complete"
    );

    Ok(())
}
