//! End-to-end mining behavior, checked against a naive reference scan.

use gsm_mining::{
    mine_partitioned, Dictionary, DictionaryBuilder, ItemId, MinerConfig, PatternCollector,
    PatternMiner, SequenceDatabase, Taxonomy,
};
use proptest::prelude::*;

/// Does `observed` generalize to `wanted` through the dictionary taxonomy?
fn generalizes(dictionary: &Dictionary, observed: ItemId, wanted: ItemId) -> bool {
    observed == wanted || dictionary.ancestors(observed).contains(&wanted)
}

/// Cumulative gap between two matched positions, measured in the original
/// transaction: items between them weigh 1, gap markers their magnitude.
fn gap_between(transaction: &[i32], from: usize, to: usize) -> usize {
    transaction[from + 1..to]
        .iter()
        .map(|&value| if value < 0 { value.unsigned_abs() as usize } else { 1 })
        .sum()
}

fn matches_from(
    dictionary: &Dictionary,
    transaction: &[i32],
    pattern: &[ItemId],
    previous: Option<usize>,
    max_gap: usize,
) -> bool {
    let Some((&wanted, rest)) = pattern.split_first() else {
        return true;
    };
    let start = previous.map(|p| p + 1).unwrap_or(0);
    for position in start..transaction.len() {
        let value = transaction[position];
        if value < 0 {
            continue;
        }
        if let Some(previous) = previous {
            if gap_between(transaction, previous, position) > max_gap {
                break;
            }
        }
        if generalizes(dictionary, value as ItemId, wanted)
            && matches_from(dictionary, transaction, rest, Some(position), max_gap)
        {
            return true;
        }
    }
    false
}

/// Reference support: full rescan of the registered transactions with
/// taxonomy generalization applied.
fn naive_support(
    dictionary: &Dictionary,
    database: &SequenceDatabase,
    pattern: &[ItemId],
    max_gap: usize,
) -> u64 {
    database
        .iter()
        .filter(|(transaction, _)| {
            matches_from(dictionary, transaction, pattern, None, max_gap)
        })
        .map(|(_, weight)| weight)
        .sum()
}

/// Every frequent pattern, found by exhaustive enumeration.
fn naive_mine(
    dictionary: &Dictionary,
    database: &SequenceDatabase,
    config: &MinerConfig,
) -> Vec<(Vec<ItemId>, u64)> {
    let items: Vec<ItemId> = (1..=dictionary.len() as ItemId).collect();
    let mut frontier: Vec<Vec<ItemId>> = vec![Vec::new()];
    let mut frequent = Vec::new();
    for _ in 0..config.max_length {
        let mut next = Vec::new();
        for prefix in &frontier {
            for &item in &items {
                let mut candidate = prefix.clone();
                candidate.push(item);
                let support = naive_support(dictionary, database, &candidate, config.max_gap);
                if support >= config.min_support {
                    frequent.push((candidate.clone(), support));
                    next.push(candidate);
                }
            }
        }
        frontier = next;
    }
    frequent.sort();
    frequent
}

fn build(corpus: &[&[&str]], taxonomy: Taxonomy) -> (Dictionary, SequenceDatabase) {
    let mut builder = DictionaryBuilder::new(taxonomy);
    for sequence in corpus {
        builder.count_sequence(sequence.iter().copied(), 1);
    }
    let dictionary = builder.build().unwrap();
    let mut database = SequenceDatabase::new();
    for sequence in corpus {
        let encoded: Vec<i32> = sequence
            .iter()
            .map(|name| dictionary.id(name).unwrap() as i32)
            .collect();
        database.push(encoded, 1);
    }
    (dictionary, database)
}

fn mine(
    dictionary: &Dictionary,
    database: &SequenceDatabase,
    config: MinerConfig,
) -> Vec<(Vec<ItemId>, u64)> {
    let mut miner = PatternMiner::new(dictionary, config).unwrap();
    miner.register_database(database);
    let mut collector = PatternCollector::new();
    miner.mine(&mut collector).unwrap();
    let mut patterns = collector.into_patterns();
    patterns.sort();
    patterns
}

fn names(dictionary: &Dictionary, patterns: &[(Vec<ItemId>, u64)]) -> Vec<(Vec<String>, u64)> {
    let mut named: Vec<(Vec<String>, u64)> = patterns
        .iter()
        .map(|(pattern, support)| {
            (
                pattern
                    .iter()
                    .map(|&id| dictionary.name(id).to_string())
                    .collect(),
                *support,
            )
        })
        .collect();
    named.sort();
    named
}

#[test]
fn reports_exactly_the_frequent_patterns() {
    let corpus: &[&[&str]] = &[&["a", "b", "c"], &["a", "c"], &["b", "c"]];
    let (dictionary, database) = build(corpus, Taxonomy::new());
    let config = MinerConfig::new(2, 0, 3).with_unbounded_gap();
    let found = names(&dictionary, &mine(&dictionary, &database, config));
    let expected: Vec<(Vec<String>, u64)> = vec![
        (vec!["a".into()], 2),
        (vec!["a".into(), "c".into()], 2),
        (vec!["b".into()], 2),
        (vec!["b".into(), "c".into()], 2),
        (vec!["c".into()], 3),
    ];
    assert_eq!(found, expected);
}

#[test]
fn generalized_singleton_is_reported() {
    let mut taxonomy = Taxonomy::new();
    taxonomy.add_relation("x", "y");
    let corpus: &[&[&str]] = &[&["x"]];
    let (dictionary, database) = build(corpus, taxonomy);
    let found = names(&dictionary, &mine(&dictionary, &database, MinerConfig::new(1, 0, 3)));
    assert_eq!(
        found,
        vec![(vec!["x".into()], 1), (vec!["y".into()], 1)]
    );
}

#[test]
fn zero_gap_forbids_skipping() {
    let corpus: &[&[&str]] = &[&["a", "b", "c"]];
    let (dictionary, database) = build(corpus, Taxonomy::new());
    let found = names(&dictionary, &mine(&dictionary, &database, MinerConfig::new(1, 0, 2)));
    let pairs: Vec<&(Vec<String>, u64)> =
        found.iter().filter(|(p, _)| p.len() == 2).collect();
    assert_eq!(
        pairs,
        vec![
            &(vec!["a".into(), "b".into()], 1),
            &(vec!["b".into(), "c".into()], 1),
        ]
    );
}

#[test]
fn taxonomy_generalization_lifts_support_over_threshold() {
    let mut taxonomy = Taxonomy::new();
    taxonomy.add_relation("espresso", "coffee");
    taxonomy.add_relation("latte", "coffee");
    let corpus: &[&[&str]] = &[&["espresso", "muffin"], &["latte", "muffin"]];
    let (dictionary, database) = build(corpus, taxonomy);
    let found = names(&dictionary, &mine(&dictionary, &database, MinerConfig::new(2, 0, 2)));
    assert!(found.contains(&(vec!["coffee".into(), "muffin".into()], 2)));
    assert!(!found.iter().any(|(p, _)| p[0] == "espresso"));
}

#[test]
fn miner_agrees_with_naive_enumeration() {
    let mut taxonomy = Taxonomy::new();
    taxonomy.add_relation("a", "t");
    taxonomy.add_relation("b", "t");
    let corpus: &[&[&str]] = &[
        &["a", "b", "c", "a"],
        &["c", "a", "b"],
        &["b", "b", "c"],
        &["a", "c"],
    ];
    let (dictionary, database) = build(corpus, taxonomy);
    for (min_support, max_gap, max_length) in
        [(1, 0, 2), (2, 1, 3), (1, 2, 3), (3, 1, 2)]
    {
        let config = MinerConfig::new(min_support, max_gap, max_length);
        assert_eq!(
            mine(&dictionary, &database, config.clone()),
            naive_mine(&dictionary, &database, &config),
            "sigma={min_support} gamma={max_gap} lambda={max_length}"
        );
    }
}

#[test]
fn partitions_tile_the_output() {
    let corpus: &[&[&str]] = &[
        &["a", "b", "c", "d"],
        &["d", "c", "b", "a"],
        &["a", "c", "a", "c"],
        &["b", "d"],
    ];
    let mut taxonomy = Taxonomy::new();
    taxonomy.add_relation("c", "thing");
    taxonomy.add_relation("d", "thing");
    let (dictionary, database) = build(corpus, taxonomy);
    let config = MinerConfig::new(2, 1, 3);
    let expected = mine(&dictionary, &database, config.clone());

    for partitions in [2, 3, 5] {
        let (count, collector) = mine_partitioned(
            &dictionary,
            &database,
            &config,
            partitions,
            PatternCollector::new(),
        )
        .unwrap();
        let mut patterns = collector.into_patterns();
        patterns.sort();
        assert_eq!(patterns, expected, "partitions={partitions}");
        assert_eq!(count as usize, expected.len(), "partitions={partitions}");
    }
}

#[test]
fn dictionary_survives_a_disk_round_trip() {
    let corpus: &[&[&str]] = &[&["a", "b"], &["b", "c"]];
    let mut taxonomy = Taxonomy::new();
    taxonomy.add_relation("a", "thing");
    let (dictionary, database) = build(corpus, taxonomy);

    let file = tempfile::NamedTempFile::new().unwrap();
    dictionary.to_path(file.path()).unwrap();
    let reloaded = Dictionary::from_path(file.path()).unwrap();

    let config = MinerConfig::new(1, 1, 2);
    assert_eq!(
        mine(&dictionary, &database, config.clone()),
        mine(&reloaded, &database, config)
    );
}

/// Random corpora over a fixed small vocabulary with a two-level taxonomy.
fn corpus_strategy() -> impl Strategy<Value = Vec<Vec<&'static str>>> {
    let vocabulary = prop::sample::select(vec!["a", "b", "c", "d"]);
    prop::collection::vec(prop::collection::vec(vocabulary, 1..6), 1..7)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_miner_is_exact(
        corpus in corpus_strategy(),
        min_support in 1u64..4,
        max_gap in 0usize..3,
        max_length in 1usize..4,
    ) {
        let mut taxonomy = Taxonomy::new();
        taxonomy.add_relation("a", "t");
        taxonomy.add_relation("b", "t");
        let sequences: Vec<&[&str]> = corpus.iter().map(|s| s.as_slice()).collect();
        let (dictionary, database) = build(&sequences, taxonomy);
        let config = MinerConfig::new(min_support, max_gap, max_length);
        prop_assert_eq!(
            mine(&dictionary, &database, config.clone()),
            naive_mine(&dictionary, &database, &config)
        );
    }

    #[test]
    fn prop_partitioning_preserves_the_output(
        corpus in corpus_strategy(),
        min_support in 1u64..3,
        max_gap in 0usize..2,
        partitions in 2usize..5,
    ) {
        let mut taxonomy = Taxonomy::new();
        taxonomy.add_relation("c", "t");
        let sequences: Vec<&[&str]> = corpus.iter().map(|s| s.as_slice()).collect();
        let (dictionary, database) = build(&sequences, taxonomy);
        let config = MinerConfig::new(min_support, max_gap, 3);

        let expected = mine(&dictionary, &database, config.clone());
        let (_, collector) = mine_partitioned(
            &dictionary,
            &database,
            &config,
            partitions,
            PatternCollector::new(),
        )
        .unwrap();
        let mut patterns = collector.into_patterns();
        patterns.sort();
        prop_assert_eq!(patterns, expected);
    }

    #[test]
    fn prop_reported_patterns_respect_length_and_gap(
        corpus in corpus_strategy(),
        max_gap in 0usize..2,
        max_length in 1usize..3,
    ) {
        let sequences: Vec<&[&str]> = corpus.iter().map(|s| s.as_slice()).collect();
        let (dictionary, database) = build(&sequences, Taxonomy::new());
        let config = MinerConfig::new(1, max_gap, max_length);
        for (pattern, support) in mine(&dictionary, &database, config) {
            prop_assert!(pattern.len() <= max_length);
            // Recomputing with the same gap budget must reproduce the
            // support; a gap violation would lower it.
            prop_assert_eq!(
                naive_support(&dictionary, &database, &pattern, max_gap),
                support
            );
        }
    }
}
