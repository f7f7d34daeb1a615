//! Index benchmarks: upsert, rank lookup and window retrieval.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use leaderboard::core::key::encode;
use leaderboard::RankedIndex;

fn populated(n: u64) -> RankedIndex {
    let index = RankedIndex::with_capacity("bench", n as usize);
    for i in 0..n {
        let score = ((i * 7919) % 1_000_000) as i64;
        index
            .upsert(format!("p{i}").as_str(), encode(score, i as i64))
            .expect("upsert");
    }
    index
}

fn bench_upsert(c: &mut Criterion) {
    let mut group = c.benchmark_group("upsert_move");
    for n in [1_000u64, 100_000] {
        let index = populated(n);
        let mut tick = 0u64;
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                tick += 1;
                let player = format!("p{}", tick % n);
                index
                    .upsert(player.as_str(), encode((tick % 1_000_000) as i64, tick as i64))
                    .expect("upsert");
            })
        });
    }
    group.finish();
}

fn bench_rank_of(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_of");
    for n in [1_000u64, 100_000] {
        let index = populated(n);
        let player = format!("p{}", n / 2);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(index.rank_of(black_box(&player)).expect("rank_of")))
        });
    }
    group.finish();
}

fn bench_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_by_rank_21");
    for n in [1_000u64, 100_000] {
        let index = populated(n);
        let mid = (n / 2) as i64;
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(index.range_by_rank(mid - 10, mid + 10).expect("range")))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_upsert, bench_rank_of, bench_range);
criterion_main!(benches);
