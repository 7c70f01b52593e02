use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use gsm_mining::{
    mine_partitioned, Dictionary, DictionaryBuilder, MinerConfig, PatternCollector, PatternMiner,
    SequenceDatabase, Taxonomy,
};

/// Deterministic corpus: `sequences` records of `length` items drawn from a
/// `vocabulary`-sized alphabet with a skewed distribution, plus a two-level
/// taxonomy grouping items into tens.
fn synthetic_corpus(
    sequences: usize,
    length: usize,
    vocabulary: usize,
) -> (Dictionary, SequenceDatabase) {
    let mut taxonomy = Taxonomy::new();
    for item in 0..vocabulary {
        taxonomy.add_relation(&format!("item{item}"), &format!("group{}", item / 10));
    }

    let mut state = 0x2545F4914F6CDD1Du64;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    let corpus: Vec<Vec<String>> = (0..sequences)
        .map(|_| {
            (0..length)
                // Squaring skews the draw toward low item indices.
                .map(|_| {
                    let draw = (next() as usize % vocabulary) * (next() as usize % vocabulary);
                    format!("item{}", draw / vocabulary.max(1))
                })
                .collect()
        })
        .collect();

    let mut builder = DictionaryBuilder::new(taxonomy);
    for sequence in &corpus {
        builder.count_sequence(sequence.iter(), 1);
    }
    let dictionary = builder.build().unwrap();

    let mut database = SequenceDatabase::new();
    for sequence in &corpus {
        let encoded: Vec<i32> = sequence
            .iter()
            .map(|name| dictionary.id(name).unwrap() as i32)
            .collect();
        database.push(encoded, 1);
    }
    (dictionary, database)
}

fn bench_mine(c: &mut Criterion) {
    let (dictionary, database) = synthetic_corpus(500, 12, 50);
    let config = MinerConfig::new(10, 1, 4);

    let mut group = c.benchmark_group("mine");
    group.bench_function("single", |b| {
        b.iter(|| {
            let mut miner = PatternMiner::new(&dictionary, config.clone()).unwrap();
            miner.register_database(&database);
            let mut collector = PatternCollector::new();
            miner.mine(&mut collector).unwrap()
        })
    });
    for partitions in [2, 4] {
        group.bench_with_input(
            BenchmarkId::new("partitioned", partitions),
            &partitions,
            |b, &partitions| {
                b.iter(|| {
                    mine_partitioned(
                        &dictionary,
                        &database,
                        &config,
                        partitions,
                        PatternCollector::new(),
                    )
                    .unwrap()
                })
            },
        );
    }
    group.finish();
}

fn bench_dictionary_build(c: &mut Criterion) {
    c.bench_function("dictionary_build", |b| {
        b.iter(|| synthetic_corpus(200, 12, 50))
    });
}

criterion_group!(benches, bench_mine, bench_dictionary_build);
criterion_main!(benches);
