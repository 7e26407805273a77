//! Event scenario benchmarks using Criterion.
//!
//! These benchmarks measure realistic listener workloads:
//! - Subscriber churn (targets dropping and handles disposed between raises)
//! - Mixed inline and offloaded delivery
//! - Raise latency distribution under churn

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use herald::{Event, Executor, ThreadPool};
use herald_bench::{
    churn::{ChurnConfig, ChurnScenario},
    listeners::register_counters,
    raise_profile::RaiseProfile,
};
use std::sync::Arc;

// =============================================================================
// Churn Benchmarks
// =============================================================================

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenario/churn");

    for count in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("raise_and_churn", count), &count, |b, &n| {
            let mut scenario = ChurnScenario::with_config(ChurnConfig {
                listener_count: n,
                ..Default::default()
            });
            scenario.setup().expect("unable to set up churn scenario");

            b.iter(|| {
                scenario.update();
            });

            scenario.teardown();
        });
    }

    group.finish();
}

// =============================================================================
// Offload Benchmarks
// =============================================================================

fn bench_offload(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenario/offload");

    for threads in [1, 2, 4] {
        group.bench_with_input(BenchmarkId::new("submit_100", threads), &threads, |b, &t| {
            let pool: Arc<dyn Executor> =
                Arc::new(ThreadPool::new(t).expect("unable to start pool"));
            let event = Event::<u64>::new();
            let (_targets, _disposables) = register_counters(&event, 100, Some(pool));

            b.iter(|| event.raise(1));
        });
    }

    group.bench_function("mixed_half_offloaded", |b| {
        let mut scenario = ChurnScenario::with_config(ChurnConfig {
            listener_count: 1_000,
            offload_rate: 0.5,
            ..Default::default()
        });
        scenario.setup().expect("unable to set up churn scenario");

        b.iter(|| {
            scenario.update();
        });

        scenario.teardown();
    });

    group.finish();
}

// =============================================================================
// Latency Benchmarks
// =============================================================================

fn bench_raise_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenario/latency");

    group.bench_function("churn_1000_raises", |b| {
        b.iter_custom(|iters| {
            let mut total = std::time::Duration::ZERO;

            for _ in 0..iters {
                let mut scenario = churning_scenario();
                let mut profile = RaiseProfile::new();
                for value in 0..1000 {
                    profile.raise(scenario.event(), value);
                    scenario.churn();
                }
                total += profile.total();
            }

            total
        });
    });

    group.finish();
}

fn report_sweep_cost(_c: &mut Criterion) {
    let mut scenario = churning_scenario();
    let mut profile = RaiseProfile::new();
    for value in 0..1000 {
        profile.raise(scenario.event(), value);
        scenario.churn();
    }

    println!("raise profile under churn: {profile}");
}

fn churning_scenario() -> ChurnScenario {
    let mut scenario = ChurnScenario::with_config(ChurnConfig {
        listener_count: 1_000,
        drop_rate: 0.1,
        dispose_rate: 0.1,
        ..Default::default()
    });
    scenario
        .setup()
        .expect("unable to set up churn scenario");
    scenario
}

// =============================================================================
// Criterion Configuration
// =============================================================================

criterion_group!(
    benches,
    bench_churn,
    bench_offload,
    bench_raise_latency,
    report_sweep_cost,
);

criterion_main!(benches);
