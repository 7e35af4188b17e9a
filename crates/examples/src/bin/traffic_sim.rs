use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use tc_core::LineSource;
use tc_runtime::{init_tracing, run_sequential, Pipeline, PipelineConfig};
use tc_views::{render_report, TopNQuery};

/// Load traffic light readings through a bounded producer/consumer queue and
/// report the most congested lights in one hour of the day.
#[derive(Parser, Debug)]
#[command(name = "traffic_sim")]
struct Args {
    /// How many of the most congested lights to report.
    n: usize,
    /// Hour of the day to report on (0-23).
    hour: u32,
    /// Data file with one `time id count` line per reading.
    #[arg(long, default_value = "./data")]
    data: PathBuf,
    /// JSON file holding a pipeline config; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    capacity: Option<usize>,
    #[arg(long)]
    producers: Option<usize>,
    #[arg(long)]
    consumers: Option<usize>,
    /// Run single-threaded instead of with thread pools.
    #[arg(long)]
    sequential: bool,
    /// Print a JSON metrics line after the report.
    #[arg(long)]
    metrics: bool,
}

fn load_config(args: &Args) -> Result<PipelineConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };
    if let Some(capacity) = args.capacity {
        cfg.capacity = capacity;
    }
    if let Some(producers) = args.producers {
        cfg.producers = producers;
    }
    if let Some(consumers) = args.consumers {
        cfg.consumers = consumers;
    }
    Ok(cfg)
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let cfg = load_config(&args)?;
    info!(data = %args.data.display(), sequential = args.sequential, "traffic_sim starting");

    let source = LineSource::open(&args.data)?;
    let outcome = if args.sequential {
        run_sequential(source, cfg.capacity)?
    } else {
        let pipeline = Pipeline::new(cfg)?;
        info!(config = ?pipeline.config(), "pipeline configured");
        pipeline.run(source)?
    };

    let query = TopNQuery {
        n: args.n,
        hour: args.hour,
    };
    let top = query
        .run(&outcome.records)
        .with_context(|| format!("top {} lights for hour {}", args.n, args.hour))?;
    print!("{}", render_report(&top));

    if args.metrics {
        let label = if args.sequential { "sequential" } else { "pipeline" };
        println!("{}", outcome.metrics.to_json_line(label, Some(outcome.elapsed)));
    }
    Ok(())
}
