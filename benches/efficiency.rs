use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use doe_sampler::efficiency::{information_matrix, linalg};
use doe_sampler::generate;

fn bench_d_efficiency(c: &mut Criterion) {
    let mut group = c.benchmark_group("D_Efficiency");

    let cases: [(&str, Vec<u32>, usize); 3] = [
        ("2^3_N4", vec![2, 2, 2], 4),
        ("3^4_N9", vec![3, 3, 3, 3], 9),
        ("4_2^8_N16", vec![4, 2, 2, 2, 2, 2, 2, 2, 2], 16),
    ];

    for (name, levels, runs) in cases {
        let design = generate(&levels, runs, 10, 2).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(name), &design, |b, design| {
            b.iter(|| black_box(design.d_efficiency()));
        });
    }
    group.finish();
}

fn bench_cholesky(c: &mut Criterion) {
    let mut group = c.benchmark_group("Cholesky");

    let design = generate(&[4, 2, 2, 2, 2, 2, 2, 2, 2], 16, 10, 2).unwrap();
    let info = information_matrix(&design);
    group.bench_function("p12", |b| b.iter(|| linalg::cholesky(black_box(&info))));

    group.finish();
}

criterion_group!(benches, bench_d_efficiency, bench_cholesky);
criterion_main!(benches);
