//! Standalone traffic-generator binary.
//!
//! Grounded on `cache-simulator/src/bin/traffic_generator.rs`: a thin
//! `clap` wrapper around the same generator the `trace-simulator generate`
//! subcommand uses, for callers who only ever want to synthesize traces.

use std::path::PathBuf;

use clap::Parser;

use trace_simulator::generator::{TraceGenConfig, TraceGenerator};

#[derive(Parser, Debug)]
#[command(author, version, about = "Synthetic cache trace generator", long_about = None)]
struct Args {
    #[arg(long, default_value_t = TraceGenConfig::default().rps)]
    rps: u32,

    #[arg(long, default_value_t = TraceGenConfig::default().duration_hours)]
    duration_hours: u32,

    #[arg(long, default_value_t = TraceGenConfig::default().unique_objects)]
    unique_objects: u32,

    #[arg(long, default_value_t = TraceGenConfig::default().popular_traffic_percent)]
    popular_traffic_percent: u8,

    #[arg(long, default_value_t = TraceGenConfig::default().popular_objects_percent)]
    popular_objects_percent: u8,

    #[arg(long, default_value_t = TraceGenConfig::default().min_key_size)]
    min_key_size: u32,

    #[arg(long, default_value_t = TraceGenConfig::default().max_key_size)]
    max_key_size: u32,

    #[arg(long, default_value_t = TraceGenConfig::default().min_val_size)]
    min_val_size: u32,

    #[arg(long, default_value_t = TraceGenConfig::default().max_val_size)]
    max_val_size: u32,

    #[arg(short, long, default_value = "trace_out")]
    output: PathBuf,

    #[arg(long, default_value_t = TraceGenConfig::default().seed)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = TraceGenConfig {
        rps: args.rps,
        duration_hours: args.duration_hours,
        unique_objects: args.unique_objects,
        popular_traffic_percent: args.popular_traffic_percent,
        popular_objects_percent: args.popular_objects_percent,
        min_key_size: args.min_key_size,
        max_key_size: args.max_key_size,
        min_val_size: args.min_val_size,
        max_val_size: args.max_val_size,
        output_dir: args.output.clone(),
        seed: args.seed,
        ..TraceGenConfig::default()
    };

    println!("Trace Generator");
    println!("===============");
    println!("Output directory: {}", args.output.display());

    TraceGenerator::new(config).generate()?;
    println!("Done.");
    Ok(())
}
