use bloom_core::Bloom;
use criterion::{criterion_group, criterion_main, Criterion, black_box};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn keys(n: usize) -> Vec<[u8; 16]> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n).map(|_| { let mut k = [0u8; 16]; rng.fill(&mut k[..]); k }).collect()
}

fn bench_ops(c: &mut Criterion) {
    let ks = keys(100_000);
    let bloom = Bloom::new(1_000_000, 0.001).unwrap();
    for k in &ks[..50_000] { bloom.add(k).unwrap(); }
    let mut i = 0usize;
    c.bench_function("add", |b| b.iter(|| { i = (i + 1) % ks.len(); black_box(bloom.add(&ks[i]).unwrap()) }));
    c.bench_function("check_hit", |b| b.iter(|| black_box(bloom.check(&ks[7]).unwrap())));
    c.bench_function("check_miss", |b| b.iter(|| black_box(bloom.check(b"never added").unwrap())));
}

fn bench_io(c: &mut Criterion) {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("bench.blm");
    let base = tmp.path().join("bench");
    let bloom = Bloom::new(1_000_000, 0.001).unwrap();
    c.bench_function("save", |b| b.iter(|| bloom.save(&path).unwrap()));
    c.bench_function("load", |b| b.iter(|| black_box(Bloom::load(&path).unwrap())));
    c.bench_function("save_split", |b| b.iter(|| bloom.save_split(&base).unwrap()));
    c.bench_function("load_split", |b| b.iter(|| black_box(Bloom::load_split(&base).unwrap())));
}

criterion_group!(benches, bench_ops, bench_io);
criterion_main!(benches);
