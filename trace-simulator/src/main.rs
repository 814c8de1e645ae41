//! CLI entry point: run policy engines over a trace, or synthesize one.
//!
//! Grounded on `cache-simulator/src/main.rs`'s `clap` derive CLI and
//! `Simulate`/`Generate` subcommand split; `anyhow::Result` replaces the
//! teacher's `Box<dyn std::error::Error>` at the binary boundary per
//! SPEC_FULL.md §2's ambient-stack note, and every former `eprintln!`
//! becomes a `tracing` call (§10.1) while user-facing summary output stays
//! on stdout via `println!`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use trace_simulator::engine::{EngineSizing, PolicyKind};
use trace_simulator::generator::{TraceGenConfig, TraceGenerator};
use trace_simulator::runner::TraceRunner;
use trace_simulator::stats;

#[derive(Parser, Debug)]
#[command(author, version, about = "Trace-driven cache policy simulator", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one or more policy engines over a directory of trace files.
    Simulate {
        /// Directory containing `.csv`/`.log`/`.txt` trace files.
        #[arg(short, long, value_name = "DIR")]
        input_dir: PathBuf,

        /// Policies to run; defaults to all 18.
        #[arg(short, long, value_name = "POLICY", value_enum, num_args = 1..)]
        policies: Option<Vec<PolicyKind>>,

        /// DRAM tier size in bytes.
        #[arg(long, default_value_t = EngineSizing::default().dram_size)]
        dram_size: u64,

        /// Flash tier size in bytes.
        #[arg(long, default_value_t = EngineSizing::default().flash_size)]
        flash_size: u64,

        /// Queue count for LRU-K-family policies.
        #[arg(long, default_value_t = EngineSizing::default().num_queues)]
        num_queues: usize,

        /// Section count for RIPQ-family policies.
        #[arg(long, default_value_t = EngineSizing::default().num_sections)]
        num_sections: u32,

        /// Partition count for partitioned/slab policies.
        #[arg(long, default_value_t = EngineSizing::default().partitions)]
        partitions: u32,

        /// Requests to process in warmup mode (not counted in stats) before
        /// measurement begins.
        #[arg(long, default_value_t = 0)]
        warmup_requests: u64,

        /// Directory to write one `<policy>.stats` (and `<policy>.cdf` for
        /// shadow tracers) file per run.
        #[arg(long, value_name = "DIR")]
        stats_dir: Option<PathBuf>,

        /// Export a summary row per policy to this CSV path.
        #[arg(long, value_name = "PATH")]
        output_csv: Option<PathBuf>,
    },

    /// Synthesize a Zipf-ish trace in this crate's CSV schema.
    Generate {
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

        /// Output directory for the generated `hour_NN.csv` files.
        #[arg(short, long, default_value = "trace_out")]
        output: PathBuf,

        /// PRNG seed; fixed by default for reproducible traces (spec §5).
        #[arg(long, default_value_t = TraceGenConfig::default().seed)]
        seed: u64,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    match args.command {
        Commands::Simulate {
            input_dir,
            policies,
            dram_size,
            flash_size,
            num_queues,
            num_sections,
            partitions,
            warmup_requests,
            stats_dir,
            output_csv,
        } => {
            let sizing = EngineSizing {
                dram_size,
                flash_size,
                num_queues,
                num_sections,
                partitions,
            };
            let policies = policies.unwrap_or_else(|| PolicyKind::all().to_vec());

            println!("Cache Policy Simulation");
            println!("=======================");
            println!("Input directory: {}", input_dir.display());
            println!("Policies: {:?}", policies);

            let runner = TraceRunner::new(input_dir, sizing, warmup_requests);
            let results = runner.run(&policies)?;

            if let Some(dir) = &stats_dir {
                std::fs::create_dir_all(dir)?;
                for result in &results {
                    std::fs::write(dir.join(format!("{}.stats", result.name)), &result.stats_dump)?;
                    if let Some(cdf) = &result.cdf_dump {
                        std::fs::write(dir.join(format!("{}.cdf", result.name)), cdf)?;
                    }
                }
                tracing::info!(dir = %dir.display(), "wrote stats/cdf files");
            }

            stats::print_summary(&results);

            if let Some(csv_path) = &output_csv {
                stats::export_csv(&results, csv_path)?;
                println!("\nResults exported to: {}", csv_path.display());
            }

            Ok(())
        }

        Commands::Generate {
            rps,
            duration_hours,
            unique_objects,
            popular_traffic_percent,
            popular_objects_percent,
            min_key_size,
            max_key_size,
            min_val_size,
            max_val_size,
            output,
            seed,
        } => {
            let config = TraceGenConfig {
                rps,
                duration_hours,
                unique_objects,
                popular_traffic_percent,
                popular_objects_percent,
                min_key_size,
                max_key_size,
                min_val_size,
                max_val_size,
                output_dir: output.clone(),
                seed,
                ..TraceGenConfig::default()
            };

            println!("Generating synthetic trace into {}", output.display());
            TraceGenerator::new(config).generate()?;
            println!("Done.");
            Ok(())
        }
    }
}
