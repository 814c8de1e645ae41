//! End-to-end tests for the trace pipeline: generate a trace, then run
//! policies over it and check the reported results line up with what was
//! written.
//!
//! Grounded on `examples/sigsegved-cache-rs/tests/correctness_tests.rs`'s
//! "small deterministic scenario, check the concrete outcome" style, applied
//! here to the driver crate rather than a single engine: a synthetic trace
//! written by [`TraceGenerator`] is the input, a [`TraceRunner`] pass over it
//! is the thing under test.

use trace_simulator::engine::{EngineSizing, PolicyKind};
use trace_simulator::generator::{TraceGenConfig, TraceGenerator};
use trace_simulator::runner::TraceRunner;
use trace_simulator::stats::{export_csv, CsvResultRow};

fn temp_dir(tag: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("trace-simulator-{tag}-{}", std::process::id()))
}

#[test]
fn generated_trace_round_trips_through_the_runner() {
    let dir = temp_dir("pipeline-a");
    let config = TraceGenConfig {
        duration_hours: 1,
        rps: 20,
        unique_objects: 50,
        min_key_size: 8,
        max_key_size: 8,
        min_val_size: 100,
        max_val_size: 100,
        output_dir: dir.clone(),
        seed: 7,
        ..TraceGenConfig::default()
    };
    TraceGenerator::new(config).generate().unwrap();

    let runner = TraceRunner::new(dir.clone(), EngineSizing::default(), 0);
    let results = runner.run(&[PolicyKind::Lru]).unwrap();

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.requests_processed, 20 * 3600);
    assert_eq!(result.requests_skipped, 0);
    assert_eq!(result.stats.accesses, result.requests_processed);
    assert!(result.bytes_cached > 0);
    assert!(result.bytes_cached <= EngineSizing::default().dram_size);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn multiple_policies_run_independently_over_the_same_trace() {
    let dir = temp_dir("pipeline-b");
    let config = TraceGenConfig {
        duration_hours: 1,
        rps: 10,
        unique_objects: 30,
        output_dir: dir.clone(),
        seed: 3,
        ..TraceGenConfig::default()
    };
    TraceGenerator::new(config).generate().unwrap();

    let runner = TraceRunner::new(dir.clone(), EngineSizing::default(), 0);
    let results = runner.run(&[PolicyKind::Lru, PolicyKind::Clock]).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].name, "lru");
    assert_eq!(results[1].name, "clock");
    // Each policy saw the whole trace independently; neither's counters leak
    // into the other's.
    assert_eq!(results[0].requests_processed, results[1].requests_processed);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn warmup_requests_are_admitted_but_excluded_from_reported_accesses() {
    let dir = temp_dir("pipeline-c");
    let config = TraceGenConfig {
        duration_hours: 1,
        rps: 10,
        unique_objects: 20,
        output_dir: dir.clone(),
        seed: 11,
        ..TraceGenConfig::default()
    };
    TraceGenerator::new(config).generate().unwrap();

    let total_requests = 10 * 3600;
    let warmup = 1_000;
    let runner = TraceRunner::new(dir.clone(), EngineSizing::default(), warmup);
    let results = runner.run(&[PolicyKind::Lru]).unwrap();

    let result = &results[0];
    assert_eq!(result.requests_processed, total_requests);
    assert_eq!(result.stats.accesses, total_requests - warmup);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn malformed_trace_lines_are_skipped_not_fatal() {
    let dir = temp_dir("pipeline-d");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("mixed.csv"),
        "time,app_id,type,key_size,val_size,kid\n\
         0.0,1,0,8,100,1\n\
         garbage line with no commas\n\
         1.0,1,0,8,100,0,0\n\
         2.0,1,0,8,100,2\n",
    )
    .unwrap();

    let runner = TraceRunner::new(dir.clone(), EngineSizing::default(), 0);
    let results = runner.run(&[PolicyKind::Lru]).unwrap();

    let result = &results[0];
    assert_eq!(result.requests_processed, 2);
    assert_eq!(result.requests_skipped, 2);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn shadow_tracer_runs_produce_a_cdf_dump_others_do_not() {
    let dir = temp_dir("pipeline-e");
    let config = TraceGenConfig {
        duration_hours: 1,
        rps: 10,
        unique_objects: 20,
        output_dir: dir.clone(),
        seed: 5,
        ..TraceGenConfig::default()
    };
    TraceGenerator::new(config).generate().unwrap();

    let runner = TraceRunner::new(dir.clone(), EngineSizing::default(), 0);
    let results = runner.run(&[PolicyKind::Lru, PolicyKind::ShadowLru]).unwrap();

    assert!(results[0].cdf_dump.is_none());
    assert!(results[1].cdf_dump.is_some());
    assert!(results[1].cdf_dump.as_ref().unwrap().starts_with("distance cumfrac"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn export_csv_produces_one_parsable_row_per_policy() {
    let dir = temp_dir("pipeline-f");
    let config = TraceGenConfig {
        duration_hours: 1,
        rps: 10,
        unique_objects: 20,
        output_dir: dir.clone(),
        seed: 9,
        ..TraceGenConfig::default()
    };
    TraceGenerator::new(config).generate().unwrap();

    let runner = TraceRunner::new(dir.clone(), EngineSizing::default(), 0);
    let results = runner.run(&[PolicyKind::Lru, PolicyKind::Clock]).unwrap();

    let csv_path = dir.join("results.csv");
    export_csv(&results, &csv_path).unwrap();

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let rows: Vec<CsvResultRow> = reader.deserialize().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].policy, "lru");
    assert_eq!(rows[1].policy, "clock");

    std::fs::remove_dir_all(&dir).unwrap();
}
