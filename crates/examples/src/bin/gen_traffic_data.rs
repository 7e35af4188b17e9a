use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use tc_runtime::init_tracing;
use tc_scenarios::SyntheticTraffic;

/// Write a synthetic traffic data file: every light, every quarter hour.
#[derive(Parser, Debug)]
#[command(name = "gen_traffic_data")]
struct Args {
    #[arg(long, default_value = "./data")]
    out: PathBuf,
    #[arg(long, default_value_t = 1000)]
    lights: u32,
    #[arg(long, default_value_t = 100_000)]
    max_cars: i64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let gen = SyntheticTraffic {
        lights: args.lights,
        max_cars: args.max_cars,
        seed: args.seed,
    };

    if gen.is_empty() {
        warn!("no lights requested; the data file will be empty");
    }

    let file = File::create(&args.out).with_context(|| format!("creating {}", args.out.display()))?;
    let written = gen
        .write_to(BufWriter::new(file))
        .with_context(|| format!("writing {}", args.out.display()))?;
    info!(path = %args.out.display(), records = written, "data file written");
    Ok(())
}
