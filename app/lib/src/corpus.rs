//! Sequence corpus parsing and encoding.
//!
//! A corpus is line-oriented: each record is a separator-delimited token
//! list whose first token is an external sequence identifier (carried
//! through but ignored by the miner) and whose remaining tokens are item
//! names. Encoding replaces names with dictionary IDs, producing the
//! `i32` transaction representation the miner consumes.

use std::io::BufRead;
use std::sync::Arc;

use crate::dictionary::Dictionary;
use crate::error::{GsmError, Result};

/// A parsed but not yet encoded sequence record.
#[derive(Debug, PartialEq, Eq)]
pub struct SequenceRecord<'a> {
    /// External sequence identifier (first token of the record).
    pub id: &'a str,
    /// Item names in sequence order.
    pub items: Vec<&'a str>,
}

/// Split one corpus line into its identifier and item tokens.
///
/// `separator` of `None` splits on any whitespace. A record without at
/// least an identifier token is malformed; a record with an identifier but
/// no items is accepted (an empty sequence).
pub fn parse_record(line: &str, separator: Option<char>) -> Result<SequenceRecord<'_>> {
    let mut tokens: Vec<&str> = match separator {
        Some(sep) => line.split(sep).map(str::trim).filter(|t| !t.is_empty()).collect(),
        None => line.split_whitespace().collect(),
    };
    if tokens.is_empty() {
        return Err(GsmError::MalformedSequence(
            "record has no sequence identifier".to_string(),
        ));
    }
    let id = tokens.remove(0);
    Ok(SequenceRecord { id, items: tokens })
}

/// Encode item names as dictionary IDs. Unknown names fail fast rather
/// than being skipped, since dropped positions would corrupt gap and
/// support accounting.
pub fn encode_items(dictionary: &Dictionary, items: &[&str]) -> Result<Vec<i32>> {
    items
        .iter()
        .map(|&name| {
            dictionary
                .id(name)
                .map(|id| id as i32)
                .ok_or_else(|| GsmError::UnknownItem(name.to_string()))
        })
        .collect()
}

/// An encoded, immutable transaction set shared by every miner of a run.
///
/// Transactions are held behind `Arc` so that partitioned mining hands the
/// same snapshot to each worker without copying the item data.
#[derive(Debug, Default, Clone)]
pub struct SequenceDatabase {
    transactions: Vec<Arc<[i32]>>,
    weights: Vec<u64>,
}

impl SequenceDatabase {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one encoded transaction with its support weight.
    pub fn push(&mut self, items: impl Into<Arc<[i32]>>, weight: u64) {
        self.transactions.push(items.into());
        self.weights.push(weight);
    }

    /// Number of transactions.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Whether the database holds no transactions.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Iterate `(transaction, weight)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<[i32]>, u64)> {
        self.transactions
            .iter()
            .zip(self.weights.iter().copied())
    }

    /// Read and encode a whole corpus, one record per non-blank line, each
    /// with weight 1.
    pub fn read_from<R: BufRead>(
        reader: R,
        dictionary: &Dictionary,
        separator: Option<char>,
    ) -> Result<Self> {
        let mut database = SequenceDatabase::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = parse_record(&line, separator)?;
            database.push(encode_items(dictionary, &record.items)?, 1);
        }
        Ok(database)
    }
}
