use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use counterbalance::catalogue::get_by_name;
use counterbalance::{verify_balance, CounterbalanceBuilder};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_first_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("FirstOrder");

    for conditions in [2u32, 4, 8] {
        group.bench_with_input(
            BenchmarkId::from_parameter(conditions),
            &conditions,
            |b, &l| {
                let generator = CounterbalanceBuilder::new()
                    .trials((l * l * 2) as usize)
                    .factor_levels(vec![l])
                    .build()
                    .unwrap();
                let mut rng = StdRng::seed_from_u64(0);
                b.iter(|| generator.generate_with_rng(&mut rng).unwrap());
            },
        );
    }
    group.finish();
}

fn bench_paradigms(c: &mut Criterion) {
    let mut group = c.benchmark_group("Paradigms");

    for name in ["flanker", "simon", "prime-probe"] {
        group.bench_function(name, |b| {
            let generator = get_by_name(name).unwrap().build().unwrap();
            let mut rng = StdRng::seed_from_u64(1);
            b.iter(|| generator.generate_with_rng(&mut rng).unwrap());
        });
    }
    group.finish();
}

fn bench_verify(c: &mut Criterion) {
    let seq = get_by_name("prime-probe")
        .unwrap()
        .build()
        .unwrap()
        .generate_seeded(3)
        .unwrap();

    c.bench_function("verify_prime_probe", |b| {
        b.iter(|| verify_balance(&seq, 2));
    });
}

criterion_group!(benches, bench_first_order, bench_paradigms, bench_verify);
criterion_main!(benches);
