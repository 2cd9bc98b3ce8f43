use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use xorphf::{
    random_hash_func, BasisGen, BasisMethod, Fitness, FuncVect, Partitioner, PhfGraph, RvMgr,
    SearchConfig, Variable, VectorStore,
};

fn bench_variable_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("variable_ops");

    // Deterministic dataset for stable benches
    let mut rng = StdRng::seed_from_u64(42);
    let store = RvMgr::random(256, 1024, &mut rng);
    let a = Variable::from_vids(256, &[1, 70, 130, 200]);
    let b = Variable::from_vids(256, &[3, 70, 190]);

    group.bench_function("compose", |bencher| {
        bencher.iter(|| black_box(&a) * black_box(&b))
    });

    group.bench_function("classify_1024", |bencher| {
        bencher.iter(|| {
            store
                .vectors()
                .iter()
                .map(|rv| rv.classify(black_box(&a)))
                .sum::<u32>()
        })
    });

    group.bench_function("value_1024", |bencher| {
        bencher.iter(|| store.value(black_box(&a)))
    });

    group.finish();
}

fn bench_basis_search(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let store = RvMgr::random(64, 256, &mut rng);

    let mut group = c.benchmark_group("basis_search");
    group.sample_size(10);
    for method in [
        BasisMethod::Mcmc,
        BasisMethod::Greedy,
        BasisMethod::Simple,
        BasisMethod::Shift,
    ] {
        let gen = BasisGen::new(method, Fitness::Product, SearchConfig::quick());
        group.bench_with_input(
            BenchmarkId::new("generate_16", format!("{:?}", method)),
            &gen,
            |bencher, gen| {
                let mut rng = StdRng::seed_from_u64(1);
                bencher.iter(|| black_box(gen.generate(&store, 16, &mut rng)))
            },
        );
    }
    group.finish();
}

fn bench_realization(c: &mut Criterion) {
    let sizes = [256usize, 1024, 4096];

    let mut group = c.benchmark_group("realization");
    for k in sizes {
        let mut rng = StdRng::seed_from_u64(k as u64);
        let store = RvMgr::random(64, k, &mut rng);
        let p = store.index_size();
        let funcs: Vec<FuncVect> = (0..3)
            .map(|_| store.func_vect(&random_hash_func(64, p, 2, &mut rng)))
            .collect();

        group.bench_with_input(BenchmarkId::new("peel_mapping", k), &funcs, |bencher, funcs| {
            bencher.iter(|| black_box(PhfGraph::new(black_box(funcs)).mapping()))
        });

        group.bench_with_input(BenchmarkId::new("cf_partition", k), &funcs, |bencher, funcs| {
            let mut partitioner = Partitioner::new();
            bencher.iter(|| black_box(partitioner.cf_partition(black_box(funcs))))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_variable_ops, bench_basis_search, bench_realization);
criterion_main!(benches);
