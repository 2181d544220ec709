use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use province_core::{compute_checksum, ownership_checksum, ProvinceStore};
use rand::{rngs::SmallRng, Rng, SeedableRng};

fn populated_store(count: u16) -> ProvinceStore {
    let mut store = ProvinceStore::new(count as u32).expect("store capacity");
    let mut rng = SmallRng::seed_from_u64(0x5eed_0001);
    for id in 1..=count {
        store
            .add_province(id, rng.gen_range(0..16))
            .expect("unique id");
        store.set_owner(id, rng.gen_range(1..200));
    }
    store.clear_dirty();
    store
}

fn bench_lookup(c: &mut Criterion) {
    let store = populated_store(10_000);
    let mut rng = SmallRng::seed_from_u64(7);
    let ids: Vec<u16> = (0..4096).map(|_| rng.gen_range(1..=10_000)).collect();

    c.bench_function("get_state_or_default_4096", |b| {
        b.iter(|| {
            let mut owners = 0u64;
            for &id in &ids {
                owners += store.get_state_or_default(black_box(id)).owner_id as u64;
            }
            owners
        })
    });
}

fn bench_mutation(c: &mut Criterion) {
    let base = populated_store(10_000);
    c.bench_function("set_owner_then_take_dirty", |b| {
        b.iter_batched(
            || base.clone(),
            |mut store| {
                for id in (1..=10_000u16).step_by(7) {
                    store.set_owner(id, 42);
                }
                store.take_dirty()
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_checksums(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum");
    for &count in &[1_000u16, 10_000, 65_535] {
        let store = populated_store(count);
        group.bench_with_input(BenchmarkId::new("full", count), &store, |b, store| {
            b.iter(|| compute_checksum(black_box(store)))
        });
        group.bench_with_input(BenchmarkId::new("ownership", count), &store, |b, store| {
            b.iter(|| ownership_checksum(black_box(store)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_lookup, bench_mutation, bench_checksums);
criterion_main!(benches);
