//! Error types for the mining library.

use thiserror::Error;

use crate::dictionary::ItemId;

/// Errors produced while building dictionaries, parsing input data, or
/// mining patterns.
#[derive(Error, Debug)]
pub enum GsmError {
    /// The taxonomy contains a cycle, so ancestor closure is undefined.
    /// Reported before any mining work starts.
    #[error("taxonomy is cyclic: item '{item}' is its own ancestor")]
    CyclicTaxonomy {
        /// An item on the detected cycle.
        item: String,
    },

    /// An ancestor table entry violates the "ancestor ID < item ID"
    /// ordering every downstream pruning step relies on.
    #[error("ancestor table corrupt: item {item} lists ancestor {ancestor}")]
    AncestorOrder {
        /// The offending item.
        item: ItemId,
        /// The listed ancestor with a non-smaller ID.
        ancestor: ItemId,
    },

    /// A dictionary record could not be parsed.
    #[error("malformed dictionary record at line {line}: {message}")]
    MalformedDictionary {
        /// 1-based line number of the record.
        line: usize,
        /// What was wrong with it.
        message: String,
    },

    /// A taxonomy record could not be parsed.
    #[error("malformed taxonomy record at line {line}: {message}")]
    MalformedTaxonomy {
        /// 1-based line number of the record.
        line: usize,
        /// What was wrong with it.
        message: String,
    },

    /// A sequence record could not be parsed.
    #[error("malformed sequence record: {0}")]
    MalformedSequence(String),

    /// An item name has no entry in the dictionary.
    #[error("unknown item '{0}'")]
    UnknownItem(String),

    /// Mining parameters failed validation.
    #[error("invalid mining parameters: {0}")]
    InvalidConfig(String),

    /// Underlying IO failure; surfaced to the caller, never retried here.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Failure reading or writing the tab-separated dictionary format.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Failure serializing the dictionary as JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, GsmError>;
