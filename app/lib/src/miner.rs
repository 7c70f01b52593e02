//! Depth-first, pattern-growth mining over compressed posting lists.
//!
//! The miner owns the transactions registered with it for the duration of
//! one mining run. Registration builds one top-level posting list per item
//! (taxonomy ancestors included); `mine` then grows frequent prefixes
//! depth-first, projecting each prefix's posting list into a frame-local
//! accumulator for the next level. The dictionary and the top-level support
//! index are read-only throughout the search, so independent miners with
//! disjoint partition ranges can share them.

use std::sync::Arc;

use crate::config::MinerConfig;
use crate::corpus::SequenceDatabase;
use crate::dictionary::{Dictionary, ItemId};
use crate::error::Result;
use crate::posting::{PostingAccumulator, PostingReader};
use crate::writer::PatternSink;

/// Mines frequent, taxonomy-generalized sequential patterns.
pub struct PatternMiner<'a> {
    config: MinerConfig,
    dictionary: &'a Dictionary,
    transactions: Vec<Arc<[i32]>>,
    weights: Vec<u64>,
    global_items: PostingAccumulator,
    patterns_found: u64,
}

impl<'a> PatternMiner<'a> {
    /// Create a miner over the given dictionary snapshot.
    pub fn new(dictionary: &'a Dictionary, config: MinerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            dictionary,
            transactions: Vec::new(),
            weights: Vec::new(),
            global_items: PostingAccumulator::new(),
            patterns_found: 0,
        })
    }

    /// The configuration this miner runs with.
    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Number of registered transactions.
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Append one encoded transaction with the given support weight.
    ///
    /// Positive values are item IDs, negative values are run-length gap
    /// markers ("skip that many positions"). Every non-gap item and each of
    /// its taxonomy ancestors is indexed, except items at or above the
    /// partition's `end_item` bound: those still feed their in-range
    /// ancestors and later count as gap, which is what keeps partitions
    /// over a shared corpus complete and duplicate-free.
    ///
    /// Panics if a value is not a valid item ID of the dictionary — that is
    /// an encoding bug in the caller, not a recoverable input error.
    pub fn register_transaction(&mut self, items: impl Into<Arc<[i32]>>, weight: u64) {
        let items: Arc<[i32]> = items.into();
        let transaction_id = self.transactions.len() as u32;
        self.weights.push(weight);

        for (position, &value) in items.iter().enumerate() {
            if value < 0 {
                continue;
            }
            let item = value as ItemId;
            assert!(
                item >= 1 && item as usize <= self.dictionary.len(),
                "value {item} at position {position} is not a dictionary item ID"
            );
            if item < self.config.end_item {
                self.global_items
                    .record(item, transaction_id, weight, position as u32);
            }
            for &ancestor in self.dictionary.ancestors(item) {
                if ancestor < self.config.end_item {
                    self.global_items
                        .record(ancestor, transaction_id, weight, position as u32);
                }
            }
        }
        self.transactions.push(items);
    }

    /// Register every transaction of an encoded database.
    pub fn register_database(&mut self, database: &SequenceDatabase) {
        for (items, weight) in database.iter() {
            self.register_transaction(Arc::clone(items), weight);
        }
    }

    /// Run the search, reporting every frequent, pivot-contained pattern to
    /// `sink`, and return how many were reported.
    ///
    /// Working state (posting lists and the transaction store) is cleared
    /// afterwards; register transactions again before the next call.
    pub fn mine<S: PatternSink + ?Sized>(&mut self, sink: &mut S) -> Result<u64> {
        self.patterns_found = 0;
        let global = std::mem::take(&mut self.global_items);
        let mut prefix = Vec::with_capacity(self.config.max_length.min(64));

        for (item, posting) in global.iter() {
            if posting.support < self.config.min_support {
                continue;
            }
            prefix.clear();
            prefix.push(item);
            let has_pivot = item >= self.config.begin_item;
            if has_pivot {
                self.patterns_found += 1;
                sink.write(&prefix, posting.support)?;
            }
            self.dfs(&global, &mut prefix, &posting.bytes, has_pivot, sink)?;
        }

        self.transactions.clear();
        self.weights.clear();
        Ok(self.patterns_found)
    }

    /// Number of patterns reported by the last `mine` call.
    pub fn patterns_found(&self) -> u64 {
        self.patterns_found
    }

    fn dfs<S: PatternSink + ?Sized>(
        &mut self,
        global: &PostingAccumulator,
        prefix: &mut Vec<ItemId>,
        posting: &[u8],
        has_pivot: bool,
        sink: &mut S,
    ) -> Result<()> {
        if prefix.len() >= self.config.max_length {
            return Ok(());
        }

        // Project the prefix's occurrences one level deeper. The local
        // accumulator is owned by this frame and dropped on return.
        let mut local = PostingAccumulator::new();
        let mut reader = PostingReader::new(posting);
        loop {
            let transaction_id = reader.next_value() - 1;
            let weight = self.weights[transaction_id as usize];
            while reader.has_next_value() {
                let position = reader.next_value() - 1;
                self.extend_window(global, &mut local, transaction_id, weight, position);
            }
            if !reader.next_posting() {
                break;
            }
        }

        for (item, posting) in local.iter() {
            if posting.support < self.config.min_support {
                continue;
            }
            prefix.push(item);
            let contains_pivot = has_pivot || item >= self.config.begin_item;
            if contains_pivot {
                self.patterns_found += 1;
                sink.write(prefix, posting.support)?;
            }
            // Descend even without a pivot: an extension may still pick one
            // up and must be explored.
            self.dfs(global, prefix, &posting.bytes, contains_pivot, sink)?;
            prefix.pop();
        }
        Ok(())
    }

    /// Scan the right gamma-neighborhood of one prefix occurrence and
    /// record every eligible item (and its ancestors) into `local`.
    fn extend_window(
        &self,
        global: &PostingAccumulator,
        local: &mut PostingAccumulator,
        transaction_id: u32,
        weight: u64,
        position: u32,
    ) {
        let transaction = &self.transactions[transaction_id as usize];
        let mut gap = 0usize;
        let mut index = position as usize + 1;
        while gap <= self.config.max_gap && index < transaction.len() {
            let value = transaction[index];
            if value < 0 {
                gap += value.unsigned_abs() as usize;
                index += 1;
                continue;
            }
            gap += 1;
            let item = value as ItemId;
            if item < self.config.end_item && global.support(item) >= self.config.min_support {
                local.record(item, transaction_id, weight, index as u32);
            }
            for &ancestor in self.dictionary.ancestors(item) {
                if ancestor < self.config.end_item
                    && global.support(ancestor) >= self.config.min_support
                {
                    local.record(ancestor, transaction_id, weight, index as u32);
                }
            }
            index += 1;
        }
    }
}
