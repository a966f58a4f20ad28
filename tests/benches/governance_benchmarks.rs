//! # Futarchy Engine Benchmarks
//!
//! | Component | Operation | Target |
//! |-----------|-----------|--------|
//! | fx-02 Proposal Queue | Insert with eviction at capacity | < 10µs |
//! | fx-03 Lifecycle | TWAP winner over 10 outcomes | < 1µs |
//! | fx-03 Lifecycle | Review → Trading → Finalized | < 50µs |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fx_02_proposal_queue::{ProposalQueue, QueueConfig, MIN_FEE};
use fx_03_lifecycle::{select_winner, try_advance_state, LifecycleConfig, LifecycleCoordinator};
use fx_tests::integration::fixtures::{as_oracles, entry, pools_for, Usdc, DAO};
use shared_bus::Outbox;
use shared_types::ManualClock;
use std::time::Duration;

// ============================================================================
// FX-02: Proposal Queue
// ============================================================================

fn bench_queue_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("fx-02-proposal-queue");
    group.measurement_time(Duration::from_secs(5));
    let clock = ManualClock::new(0);

    for size in [10usize, 30, 50] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("fill_with_evictions", size), &size, |b, &size| {
            b.iter(|| {
                let config = QueueConfig {
                    max_proposer_funded: size / 2,
                    max_concurrent_proposals: 1,
                    max_queue_size: size,
                };
                let mut queue = ProposalQueue::<Usdc>::new(DAO, config).unwrap();
                let mut outbox = Outbox::new();
                for n in 0..size as u8 {
                    let fee = MIN_FEE * (u64::from(n) + 10);
                    let _ = queue.insert(entry(n, fee, false, &clock), &clock, &mut outbox);
                }
                black_box(queue.len())
            })
        });
    }

    group.finish();
}

// ============================================================================
// FX-03: Lifecycle
// ============================================================================

fn bench_select_winner(c: &mut Criterion) {
    let mut group = c.benchmark_group("fx-03-lifecycle");
    let twaps: Vec<u128> = (0..10u128).map(|i| 1_000 + i * 150).collect();

    group.bench_function("select_winner_10_outcomes", |b| {
        b.iter(|| black_box(select_winner(black_box(&twaps), 20_000)))
    });
    group.finish();
}

fn bench_full_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("fx-03-lifecycle");
    let coordinator = LifecycleCoordinator::new(LifecycleConfig::for_testing()).unwrap();

    group.bench_function("review_to_finalized", |b| {
        b.iter(|| {
            let clock = ManualClock::new(0);
            let mut activation = coordinator
                .create_from_admitted(entry(1, MIN_FEE, false, &clock), &clock)
                .unwrap();
            let pools = pools_for(&activation.proposal, &[100, 150]);
            let mut outbox = Outbox::new();

            clock.set(1_000);
            try_advance_state(
                &mut activation.proposal,
                &mut activation.market,
                &as_oracles(&pools),
                &clock,
                &mut outbox,
            )
            .unwrap();
            clock.set(11_000);
            let done = try_advance_state(
                &mut activation.proposal,
                &mut activation.market,
                &as_oracles(&pools),
                &clock,
                &mut outbox,
            )
            .unwrap();
            outbox.discard();
            black_box(done)
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_queue_insert,
    bench_select_winner,
    bench_full_lifecycle
);
criterion_main!(benches);
