use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use num_bigint::BigInt;
use num_contfrac::{Constant, ContinuedFraction, QuadraticSurd};

fn bench_engine_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_add");
    let e = ContinuedFraction::<BigInt>::constant(Constant::E);
    let pi = ContinuedFraction::<BigInt>::constant(Constant::Pi);

    for n in [10usize, 50, 200] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| (&e + &pi).take_terms(black_box(n)));
        });
    }

    group.finish();
}

fn bench_engine_mul(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_mul");
    let e = ContinuedFraction::<BigInt>::constant(Constant::E);
    let sqrt2 = ContinuedFraction::<BigInt>::lazy(
        std::iter::once(BigInt::from(1)).chain(std::iter::repeat(BigInt::from(2))),
    );

    for n in [10usize, 50, 200] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| (&e * &sqrt2).take_terms(black_box(n)));
        });
    }

    group.finish();
}

fn bench_surd_expand(c: &mut Criterion) {
    let mut group = c.benchmark_group("surd_expand");

    for d in [7i64, 94, 661, 9949] {
        let surd = QuadraticSurd::<i64>::new(0, d, 1).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(d), &surd, |b, s| {
            b.iter(|| s.expand());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_engine_add, bench_engine_mul, bench_surd_expand);
criterion_main!(benches);
