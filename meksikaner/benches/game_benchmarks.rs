use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use meksikaner::game::{BidOption, BidRound, deal, generate_deck, ordered_deck, shuffle};
use rand::{SeedableRng, rngs::StdRng};
use std::hint::black_box;

/// Benchmark shuffling a fresh 32-card deck
fn bench_generate_deck(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);

    c.bench_function("generate_deck", |b| {
        b.iter(|| generate_deck(&mut rng));
    });
}

/// Benchmark the shuffle alone over different slice sizes
fn bench_shuffle(c: &mut Criterion) {
    let mut group = c.benchmark_group("shuffle");
    let mut rng = StdRng::seed_from_u64(7);

    for size in [8usize, 32, 128] {
        let items: Vec<u32> = (0..size as u32).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &items, |b, items| {
            b.iter(|| {
                let mut items = items.clone();
                shuffle(&mut items, &mut rng);
                items
            });
        });
    }

    group.finish();
}

/// Benchmark partitioning a deck into hands and talon
fn bench_deal(c: &mut Criterion) {
    let deck = ordered_deck();

    c.bench_function("deal_three_hands", |b| {
        b.iter(|| deal(black_box(&deck), 3));
    });
}

/// Benchmark a complete auction: two raises, then two passes
fn bench_bidding_round(c: &mut Criterion) {
    let script = [
        (0, "6"),
        (1, "Dalje"),
        (2, "7"),
        (0, "Dalje"),
    ]
    .map(|(seat, text)| (seat, text.parse::<BidOption>().unwrap_or(BidOption::Dalje)));

    c.bench_function("bidding_round", |b| {
        b.iter(|| {
            let mut round = BidRound::new();
            for (seat, option) in script {
                let _ = round.apply(seat, option);
            }
            round
        });
    });
}

/// Benchmark option generation at various floors
fn bench_options(c: &mut Criterion) {
    let mut round = BidRound::new();
    let _ = round.apply(0, "8".parse().unwrap_or(BidOption::Dalje));

    c.bench_function("options_for_turn", |b| {
        b.iter(|| black_box(&round).options());
    });
}

criterion_group!(
    benches,
    bench_generate_deck,
    bench_shuffle,
    bench_deal,
    bench_bidding_round,
    bench_options
);
criterion_main!(benches);
