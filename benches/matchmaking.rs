//! Matchmaking benchmark suite.
//!
//! Measures the core without any transport:
//! - Pairing throughput for growing populations
//! - Message relay through the default profanity filter
//!
//! Run with: cargo bench --bench matchmaking
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use orion_chat::chat::PassThrough;
use orion_chat::{ChatConfig, ConnectionId, Controller, LiveSet};
use serde_json::json;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const POPULATIONS: &[usize] = &[100, 1_000, 10_000];

// ============================================================================
// Helpers
// ============================================================================

fn populate(count: usize) -> (LiveSet, Controller<LiveSet>, Vec<ConnectionId>) {
    let registry = LiveSet::new();
    let mut controller =
        Controller::new(registry.clone(), ChatConfig::default()).with_sanitizer(PassThrough);
    let ids: Vec<_> = (0..count).map(|_| ConnectionId::generate()).collect();
    for id in &ids {
        registry.insert(*id);
        controller.connect(*id);
    }
    (registry, controller, ids)
}

// ============================================================================
// Benchmark: Pairing
// ============================================================================

fn bench_pairing(c: &mut Criterion) {
    let mut group = c.benchmark_group("pairing");

    for &count in POPULATIONS {
        group.bench_with_input(BenchmarkId::new("request_match", count), &count, |b, &n| {
            b.iter_batched(
                || populate(n),
                |(_registry, mut controller, ids)| {
                    for id in ids {
                        black_box(controller.request_match(id));
                    }
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Relay
// ============================================================================

fn bench_relay(c: &mut Criterion) {
    let mut group = c.benchmark_group("relay");

    let inputs = [
        ("clean", "see you tomorrow at the station"),
        ("masked", "oh damn, what the hell"),
    ];

    for (name, text) in inputs {
        group.bench_function(name, |b| {
            let registry = LiveSet::new();
            // Large budget so the throttle never trips during measurement.
            let config = ChatConfig::new().with_rate_limit(u32::MAX, Duration::from_secs(3600));
            let mut controller = Controller::new(registry.clone(), config);
            let (a, partner) = (ConnectionId::generate(), ConnectionId::generate());
            for id in [a, partner] {
                registry.insert(id);
                controller.connect(id);
                controller.request_match(id);
            }
            let payload = json!(text);

            b.iter(|| black_box(controller.send_message(a, &payload)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pairing, bench_relay);
criterion_main!(benches);
