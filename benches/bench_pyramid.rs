use std::time::Duration;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use sixdegrees::{
    EntityKind, PyramidEngine, SearchOptions, SqliteStore,
    bench_utils::{CastDataset, CastShape, generate_cast},
    ingest::ingest_documents,
};

const CHAIN_SEED: u64 = 0xC4A1;
const RANDOM_SEED: u64 = 0x5EED;
const SAMPLE_SIZE: usize = 20;
const WARM_UP: Duration = Duration::from_millis(300);
const MEASURE: Duration = Duration::from_millis(500);

struct PreparedCast {
    dataset: CastDataset,
    store: SqliteStore,
    label: &'static str,
}

fn bench_scale() -> usize {
    #[cfg(feature = "bench-ci")]
    {
        2_000
    }
    #[cfg(not(feature = "bench-ci"))]
    {
        10_000
    }
}

fn materialize(dataset: CastDataset, label: &'static str) -> PreparedCast {
    let store = SqliteStore::open_in_memory().expect("store");
    ingest_documents(&store, &dataset.documents, dataset.root()).expect("ingest");
    PreparedCast {
        dataset,
        store,
        label,
    }
}

fn prepared_casts() -> Vec<PreparedCast> {
    let people = bench_scale();
    vec![
        materialize(generate_cast(CastShape::Chain, people, CHAIN_SEED), "chain"),
        materialize(
            generate_cast(
                CastShape::Random {
                    groups: people / 2,
                    cast_size: 8,
                },
                people,
                RANDOM_SEED,
            ),
            "random",
        ),
    ]
}

fn farthest_person(prepared: &PreparedCast) -> i64 {
    let reference = prepared.dataset.reference_degrees(prepared.dataset.root());
    let (name, _) = reference
        .iter()
        .max_by_key(|(_, degrees)| **degrees)
        .expect("reachable people");
    prepared
        .store
        .id_by_exact_name(EntityKind::Person, name)
        .expect("lookup")
        .expect("person")
}

fn bench_find(c: &mut Criterion) {
    let casts = prepared_casts();
    let mut group = c.benchmark_group("find_farthest");
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(WARM_UP);
    group.measurement_time(MEASURE);
    for prepared in &casts {
        let target = farthest_person(prepared);
        let engine = PyramidEngine::new(&prepared.store, SearchOptions::default());
        group.bench_function(prepared.label, |b| {
            b.iter(|| engine.find(black_box(target), false).expect("find"));
        });
    }
    group.finish();
}

fn bench_find_all_cached(c: &mut Criterion) {
    let casts = prepared_casts();
    let mut group = c.benchmark_group("find_all_cached");
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(WARM_UP);
    group.measurement_time(MEASURE);
    for prepared in &casts {
        group.bench_function(prepared.label, |b| {
            b.iter_batched(
                || materialize(prepared.dataset.clone(), prepared.label),
                |fresh| {
                    PyramidEngine::new(&fresh.store, SearchOptions::default())
                        .find_all(true)
                        .expect("find_all")
                },
                BatchSize::PerIteration,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_find, bench_find_all_cached);
criterion_main!(benches);
