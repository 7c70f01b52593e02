//! Run parameters for a mining pass.

use serde::{Deserialize, Serialize};

use crate::dictionary::ItemId;
use crate::error::{GsmError, Result};

/// Parameters controlling one mining run.
///
/// `min_support`, `max_gap` and `max_length` are the sigma/gamma/lambda
/// thresholds of generalized sequence mining. The partition bounds default
/// to the full item-ID range, which makes every pattern reportable by a
/// single miner; `crate::partition` tiles them across workers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinerConfig {
    /// Minimum (weighted) number of transactions a pattern must occur in.
    pub min_support: u64,
    /// Maximum cumulative gap allowed between consecutive pattern items,
    /// measured in the source transaction.
    pub max_gap: usize,
    /// Maximum number of items in a reported pattern.
    pub max_length: usize,
    /// Inclusive lower bound of the partition's pivot range.
    pub begin_item: ItemId,
    /// Exclusive upper bound of the partition's item range.
    pub end_item: ItemId,
}

impl MinerConfig {
    /// Create a configuration with the given thresholds and the full
    /// partition range.
    pub fn new(min_support: u64, max_gap: usize, max_length: usize) -> Self {
        Self {
            min_support,
            max_gap,
            max_length,
            begin_item: 0,
            end_item: ItemId::MAX,
        }
    }

    /// Restrict reporting to the partition range `[begin, end)`.
    pub fn with_partition(mut self, begin: ItemId, end: ItemId) -> Self {
        self.begin_item = begin;
        self.end_item = end;
        self
    }

    /// Treat any gap between consecutive pattern items as acceptable.
    pub fn with_unbounded_gap(mut self) -> Self {
        self.max_gap = usize::MAX;
        self
    }

    /// Check the parameters for internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.min_support == 0 {
            return Err(GsmError::InvalidConfig(
                "min_support must be at least 1".to_string(),
            ));
        }
        if self.max_length == 0 {
            return Err(GsmError::InvalidConfig(
                "max_length must be at least 1".to_string(),
            ));
        }
        if self.begin_item >= self.end_item {
            return Err(GsmError::InvalidConfig(format!(
                "empty partition range [{}, {})",
                self.begin_item, self.end_item
            )));
        }
        Ok(())
    }
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self::new(1, 0, 5)
    }
}
