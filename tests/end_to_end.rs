//! End-to-end scenarios: search, realization and the build drivers together.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::io::{BufReader, Cursor, Write};
use xorphf::*;

fn one_hot4() -> RvMgr {
    RvMgr::from_rows(4, &["0001", "0010", "0100", "1000"]).unwrap()
}

#[test]
fn test_primaries_split_one_vs_three() {
    let store = one_hot4();
    let primaries = primary_variables(&store, Fitness::Product);
    assert_eq!(primaries.len(), 4);
    for var in &primaries {
        assert_eq!(store.value(var), 0.75);
    }
    let x0x1 = &primaries[0] * &primaries[1];
    assert_eq!(store.value(&x0x1), 1.0);
}

#[test]
fn test_mcmc_finds_balanced_composite() {
    let store = one_hot4();
    let mut rng = StdRng::seed_from_u64(2024);
    let primaries = primary_variables(&store, Fitness::Product);
    let mut pool = VarPool::new(4);
    {
        let mut state = ComposeState::new(&primaries, store.vectors(), Fitness::Product, &mut pool);
        let stats = MhSampler::new()
            .sampling(&mut state, 20, 1, 200, &mut rng)
            .unwrap();
        assert_eq!(stats.recorded, 200);
    }
    let best = pool.into_sorted_vec();
    assert_eq!(best[0].1, 1.0);
    // a pair composite splits the four vectors two against two
    let top = &best[0].0;
    assert_eq!(top.degree(), 2);
    let ones = store.vectors().iter().filter(|rv| rv.classify(top) == 1).count();
    assert_eq!(ones, 2);
}

#[test]
fn test_every_basis_method_reaches_maximum() {
    let store = one_hot4();
    for method in [
        BasisMethod::Mcmc,
        BasisMethod::Greedy,
        BasisMethod::Simple,
        BasisMethod::Shift,
    ] {
        let mut rng = StdRng::seed_from_u64(99);
        let best = BasisGen::new(method, Fitness::Product, SearchConfig::default())
            .generate(&store, 3, &mut rng)
            .unwrap();
        assert_eq!(best[0].1, 1.0, "{:?}", method);
    }
}

#[test]
fn test_partition_disjoint_and_colliding() {
    // two width-1 functions over two vectors
    let disjoint = [
        FuncVect::from_values(2, vec![0, 1]),
        FuncVect::from_values(2, vec![1, 0]),
    ];
    let part = Partitioner::new().cf_partition(&disjoint).unwrap();
    assert_eq!(part.len(), 2);
    assert_ne!(part.slot_of(0), part.slot_of(1));

    // two vectors with identical candidates still fit: one slot per function
    let shared = [
        FuncVect::from_values(2, vec![1, 1]),
        FuncVect::from_values(2, vec![0, 0]),
    ];
    let part = Partitioner::new().cf_partition(&shared).unwrap();
    assert_eq!(part.slot_of(0), (0, 1));
    assert_eq!(part.slot_of(1), (1, 0));

    // a third vector with the same candidates has nowhere to go
    let colliding = [
        FuncVect::from_values(2, vec![1, 1, 1]),
        FuncVect::from_values(2, vec![0, 0, 0]),
    ];
    assert!(matches!(
        Partitioner::new().cf_partition(&colliding),
        Err(RealizeError::PartitionExhausted { vector: 2 })
    ));
}

#[test]
fn test_dataset_file_to_phf_index() {
    let mut rng = StdRng::seed_from_u64(5);
    let generated = RvMgr::random(48, 150, &mut rng);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    generated.write_data(&mut file).unwrap();
    file.flush().unwrap();

    let reader = BufReader::new(std::fs::File::open(file.path()).unwrap());
    let store = RvMgr::read_data(reader).unwrap();
    assert_eq!(store.vectors(), generated.vectors());

    let index = build_phf(&store, &BuildConfig::quick(), &mut rng).unwrap();
    let rows: HashSet<u32> = store.vectors().iter().map(|rv| index.lookup(rv)).collect();
    assert_eq!(rows.len(), store.len());
    assert!(rows.iter().all(|&r| (r as usize) < store.len()));
}

#[test]
fn test_phf_index_artifact_roundtrip() {
    let mut rng = StdRng::seed_from_u64(6);
    let store = RvMgr::random(16, 40, &mut rng);
    let index = build_phf(&store, &BuildConfig::quick(), &mut rng).unwrap();

    let json = serde_json::to_string(&index).unwrap();
    let from_json: PhfIndex = serde_json::from_str(&json).unwrap();
    assert_eq!(from_json, index);

    let bin = bincode::serialize(&index).unwrap();
    let from_bin: PhfIndex = bincode::deserialize(&bin).unwrap();
    for rv in store.vectors() {
        assert_eq!(from_bin.lookup(rv) as usize, rv.index());
    }
}

#[test]
fn test_partition_index_with_basis_functions() {
    let mut rng = StdRng::seed_from_u64(8);
    let store = RvMgr::random(32, 100, &mut rng);
    let config = BuildConfig {
        source: FuncSource::Basis,
        multiplicity: 2,
        ..BuildConfig::quick()
    };
    let index = build_partition(&store, &config, &mut rng).unwrap();
    let slots: HashSet<(usize, u32)> = store.vectors().iter().map(|rv| index.slot_of(rv)).collect();
    assert_eq!(slots.len(), store.len());
}

#[test]
fn test_duplicate_rows_do_not_consume_indices() {
    let text = "5 5\n10101\n01010\n10101\n11111\n01010\n";
    let store = RvMgr::read_data(Cursor::new(text)).unwrap();
    assert_eq!(store.len(), 3);
    assert_eq!(store.index_size(), 2);
    let indices: Vec<usize> = store.vectors().iter().map(RegVect::index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}
