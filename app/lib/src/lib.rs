//! # Generalized Sequence Mining Library
//!
//! Mines frequent sequential patterns from a transactional sequence
//! database, generalizing items through an "is-a" taxonomy and constraining
//! patterns by minimum support, maximum item-to-item gap, and maximum
//! length.
//!
//! A run has three stages: build a [`Dictionary`] from the corpus and
//! taxonomy (dense item IDs plus an ancestor-closure table), encode the
//! corpus into a [`SequenceDatabase`], then let a [`PatternMiner`] grow
//! frequent prefixes depth-first over compressed posting lists. Large runs
//! can tile the item-ID space across parallel workers with
//! [`mine_partitioned`].
//!
//! ```
//! use gsm_mining::{
//!     DictionaryBuilder, MinerConfig, PatternCollector, PatternMiner, Taxonomy,
//! };
//!
//! let mut taxonomy = Taxonomy::new();
//! taxonomy.add_relation("espresso", "coffee");
//! taxonomy.add_relation("latte", "coffee");
//!
//! let corpus: &[&[&str]] = &[
//!     &["espresso", "muffin"],
//!     &["latte", "muffin"],
//! ];
//! let mut builder = DictionaryBuilder::new(taxonomy);
//! for sequence in corpus {
//!     builder.count_sequence(sequence.iter().copied(), 1);
//! }
//! let dictionary = builder.build().unwrap();
//!
//! let mut miner = PatternMiner::new(&dictionary, MinerConfig::new(2, 0, 2)).unwrap();
//! for sequence in corpus {
//!     let encoded: Vec<i32> = sequence
//!         .iter()
//!         .map(|name| dictionary.id(name).unwrap() as i32)
//!         .collect();
//!     miner.register_transaction(encoded, 1);
//! }
//! let mut patterns = PatternCollector::new();
//! miner.mine(&mut patterns).unwrap();
//!
//! // "espresso muffin" and "latte muffin" each occur once, but the
//! // generalized "coffee muffin" reaches the support threshold.
//! let coffee = dictionary.id("coffee").unwrap();
//! let muffin = dictionary.id("muffin").unwrap();
//! assert!(patterns
//!     .patterns()
//!     .iter()
//!     .any(|(p, s)| p == &[coffee, muffin] && *s == 2));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod corpus;
pub mod dictionary;
pub mod error;
pub mod miner;
pub mod partition;
pub mod posting;
pub mod taxonomy;
pub mod writer;

pub use config::MinerConfig;
pub use corpus::{encode_items, parse_record, SequenceDatabase, SequenceRecord};
pub use dictionary::{Dictionary, DictionaryBuilder, DictionaryEntry, ItemId};
pub use error::{GsmError, Result};
pub use miner::PatternMiner;
pub use partition::{mine_partitioned, partition_ranges, PartitionRange};
pub use taxonomy::Taxonomy;
pub use writer::{PatternCollector, PatternSink, SharedSink, TextPatternWriter};
