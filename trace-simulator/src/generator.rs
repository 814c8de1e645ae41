//! Synthetic trace generator.
//!
//! Grounded on `cache-simulator/src/generator.rs`'s `TrafficLogGenerator`:
//! one thread per simulated hour, a popular/regular key split, and
//! Zipf-ish skew toward the popular group. Two differences, both required
//! by spec §5's reproducibility supplement: rows are written in this
//! crate's CSV schema (`time,app_id,type,key_size,val_size,kid`, not the
//! teacher's `timestamp,key,size,ttl`), and every thread's RNG is seeded
//! deterministically (`seed ^ hour`) instead of drawing from `rand::random`,
//! so the same seed always reproduces the same trace regardless of how the
//! per-hour threads happen to interleave.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::thread;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Parameters for a synthetic trace (spec §5, §6).
#[derive(Debug, Clone)]
pub struct TraceGenConfig {
    pub rps: u32,
    pub duration_hours: u32,
    pub unique_objects: u32,
    pub popular_traffic_percent: u8,
    pub popular_objects_percent: u8,
    pub min_key_size: u32,
    pub max_key_size: u32,
    pub min_val_size: u32,
    pub max_val_size: u32,
    pub app_id: u64,
    pub request_kind: u8,
    pub output_dir: PathBuf,
    pub seed: u64,
}

impl Default for TraceGenConfig {
    fn default() -> Self {
        Self {
            rps: 100,
            duration_hours: 24,
            unique_objects: 10_000,
            popular_traffic_percent: 80,
            popular_objects_percent: 20,
            min_key_size: 16,
            max_key_size: 64,
            min_val_size: 1024,
            max_val_size: 1024 * 1024,
            app_id: 0,
            request_kind: 0,
            output_dir: PathBuf::from("trace_out"),
            seed: 0,
        }
    }
}

pub struct TraceGenerator {
    config: TraceGenConfig,
}

impl TraceGenerator {
    pub fn new(config: TraceGenConfig) -> Self {
        Self { config }
    }

    /// Writes one `hour_NN.csv` file per simulated hour under
    /// `config.output_dir`, each independently seeded off `config.seed`.
    pub fn generate(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.config.output_dir)?;

        let popular_objects =
            (self.config.unique_objects as u64 * self.config.popular_objects_percent as u64 / 100)
                .max(1) as u32;

        let mut handles = Vec::new();
        for hour in 0..self.config.duration_hours {
            let config = self.config.clone();
            let handle = thread::spawn(move || generate_hour(&config, hour, popular_objects));
            handles.push(handle);
        }

        for handle in handles {
            handle.join().expect("generator thread panicked")?;
        }
        Ok(())
    }
}

fn generate_hour(config: &TraceGenConfig, hour: u32, popular_objects: u32) -> std::io::Result<()> {
    let path = config.output_dir.join(format!("hour_{hour:02}.csv"));
    let file = File::create(&path)?;
    let mut writer = BufWriter::with_capacity(1024 * 1024, file);
    writeln!(writer, "time,app_id,type,key_size,val_size,kid")?;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed ^ u64::from(hour));
    let requests_this_hour = config.rps as u64 * 3600;
    let base_time = hour as f64 * 3600.0;

    for i in 0..requests_this_hour {
        let time = base_time + i as f64 / config.rps.max(1) as f64;
        let is_popular = rng.gen_range(0..100) < config.popular_traffic_percent;
        let kid = if is_popular {
            rng.gen_range(0..popular_objects)
        } else {
            popular_objects + rng.gen_range(0..(config.unique_objects - popular_objects).max(1))
        };
        let key_size = rng.gen_range(config.min_key_size..=config.max_key_size);
        let val_size = rng.gen_range(config.min_val_size..=config.max_val_size);

        writeln!(
            writer,
            "{time},{},{},{key_size},{val_size},{kid}",
            config.app_id, config.request_kind
        )?;
    }

    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_reproduces_identical_traces() {
        let dir_a = std::env::temp_dir().join(format!("trace-gen-a-{}", std::process::id()));
        let dir_b = std::env::temp_dir().join(format!("trace-gen-b-{}", std::process::id()));

        let mut config_a = TraceGenConfig {
            duration_hours: 1,
            rps: 10,
            unique_objects: 100,
            ..TraceGenConfig::default()
        };
        config_a.output_dir = dir_a.clone();
        let mut config_b = config_a.clone();
        config_b.output_dir = dir_b.clone();

        TraceGenerator::new(config_a).generate().unwrap();
        TraceGenerator::new(config_b).generate().unwrap();

        let a = std::fs::read_to_string(dir_a.join("hour_00.csv")).unwrap();
        let b = std::fs::read_to_string(dir_b.join("hour_00.csv")).unwrap();
        assert_eq!(a, b);

        std::fs::remove_dir_all(&dir_a).unwrap();
        std::fs::remove_dir_all(&dir_b).unwrap();
    }

    #[test]
    fn popular_kids_stay_below_the_popular_object_count() {
        let dir = std::env::temp_dir().join(format!("trace-gen-c-{}", std::process::id()));
        let config = TraceGenConfig {
            duration_hours: 1,
            rps: 5,
            unique_objects: 20,
            popular_objects_percent: 10,
            popular_traffic_percent: 100,
            output_dir: dir.clone(),
            ..TraceGenConfig::default()
        };
        TraceGenerator::new(config).generate().unwrap();
        let contents = std::fs::read_to_string(dir.join("hour_00.csv")).unwrap();
        for line in contents.lines().skip(1) {
            let kid: u32 = line.split(',').last().unwrap().parse().unwrap();
            assert!(kid < 2);
        }
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
