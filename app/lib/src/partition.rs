//! Partitioned mining across the item-ID space.
//!
//! Every pattern has a fixed item set, and pivot containment becomes
//! permanently true the first time an item at or above a partition's
//! `begin` bound enters the prefix. Tiling the ID space into disjoint
//! contiguous ranges therefore splits the full output without duplicates:
//! each pattern is reported by exactly the partition whose range contains
//! its largest item ID. Workers share the read-only dictionary and the
//! encoded transaction snapshot and own everything else, so they run
//! embarrassingly parallel on the rayon pool.

use rayon::prelude::*;

use crate::config::MinerConfig;
use crate::corpus::SequenceDatabase;
use crate::dictionary::{Dictionary, ItemId};
use crate::error::Result;
use crate::miner::PatternMiner;
use crate::writer::{PatternSink, SharedSink};

/// A contiguous slice `[begin, end)` of the item-ID space that one worker
/// is responsible for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionRange {
    /// Inclusive lower bound.
    pub begin: ItemId,
    /// Exclusive upper bound.
    pub end: ItemId,
}

/// Tile the ID space `1..=num_items` into up to `num_partitions` contiguous
/// disjoint ranges covering `[0, ItemId::MAX)`.
///
/// The first range begins at 0 and the last ends at `ItemId::MAX`, so the
/// union always covers every possible pattern; with one partition this
/// degenerates to the full range.
pub fn partition_ranges(num_items: usize, num_partitions: usize) -> Vec<PartitionRange> {
    let count = num_partitions.max(1).min(num_items.max(1));
    let base = num_items / count;
    let remainder = num_items % count;

    let mut ranges = Vec::with_capacity(count);
    let mut next: ItemId = 1;
    for index in 0..count {
        let size = base + usize::from(index < remainder);
        let begin = if index == 0 { 0 } else { next };
        next += size as ItemId;
        let end = if index == count - 1 { ItemId::MAX } else { next };
        ranges.push(PartitionRange { begin, end });
    }
    ranges
}

/// Mine the database with `num_partitions` independent miners in parallel,
/// streaming every pattern into `sink`, and return the total number of
/// patterns reported.
///
/// The concatenated output across partitions is the same multiset of
/// `(pattern, support)` pairs a single full-range miner would report; only
/// the arrival order differs.
pub fn mine_partitioned<S>(
    dictionary: &Dictionary,
    database: &SequenceDatabase,
    config: &MinerConfig,
    num_partitions: usize,
    sink: S,
) -> Result<(u64, S)>
where
    S: PatternSink + Send,
{
    config.validate()?;
    let ranges = partition_ranges(dictionary.len(), num_partitions);
    let shared = SharedSink::new(sink);

    let counts: Result<Vec<u64>> = ranges
        .par_iter()
        .map(|range| {
            let worker_config = config.clone().with_partition(range.begin, range.end);
            let mut miner = PatternMiner::new(dictionary, worker_config)?;
            miner.register_database(database);
            let mut sink = shared.clone();
            miner.mine(&mut sink)
        })
        .collect();
    let total = counts?.into_iter().sum();

    let sink = shared
        .into_inner()
        .expect("all worker sink handles dropped");
    Ok((total, sink))
}
