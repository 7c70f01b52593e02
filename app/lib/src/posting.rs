//! Compressed posting lists.
//!
//! A posting list records the `(transaction, position)` occurrences of one
//! item as a byte stream: per transaction a group of variable-length
//! integers `(transactionId + 1), (position + 1)*` with positions ascending,
//! groups separated by an encoded 0. The +1 shifts keep every stored value
//! positive, so the single zero byte is unambiguous as a separator.
//!
//! Values use 7-bit little-endian groups with a continuation bit: only the
//! value 0 encodes to a bare zero byte, so the reader can probe for a group
//! boundary by peeking one byte.

use std::collections::BTreeMap;

use crate::dictionary::ItemId;

/// Append one non-negative value to a compressed posting list.
pub fn append_value(buffer: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buffer.push(byte);
            return;
        }
        buffer.push(byte | 0x80);
    }
}

/// Sequential reader over a compressed posting list.
///
/// The reader expects a well-formed stream as produced by
/// [`PostingAccumulator`]; it is not a validating decoder.
pub struct PostingReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> PostingReader<'a> {
    /// Start reading at the first transaction group.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Whether the current transaction group has another value.
    pub fn has_next_value(&self) -> bool {
        self.offset < self.data.len() && self.data[self.offset] != 0
    }

    /// Decode the next value of the current group.
    pub fn next_value(&mut self) -> u32 {
        let mut value = 0u32;
        let mut shift = 0;
        loop {
            let byte = self.data[self.offset];
            self.offset += 1;
            value |= u32::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return value;
            }
            shift += 7;
        }
    }

    /// Skip the remainder of the current group and its separator. Returns
    /// false once the stream is exhausted.
    pub fn next_posting(&mut self) -> bool {
        // Separators are bare zero bytes; every byte of a positive value is
        // nonzero, so a byte-wise scan lands exactly on group boundaries.
        while self.offset < self.data.len() {
            let byte = self.data[self.offset];
            self.offset += 1;
            if byte == 0 {
                return self.offset < self.data.len();
            }
        }
        false
    }
}

/// One item's posting list under construction, plus its support count.
#[derive(Debug, Default)]
pub struct Posting {
    /// Accumulated support: transaction weight counted once per distinct
    /// transaction the item occurs in.
    pub support: u64,
    /// Compressed occurrence stream.
    pub bytes: Vec<u8>,
    last_transaction: Option<u32>,
    last_position: Option<u32>,
}

/// Builds one posting list per item while scanning a (projected) database.
///
/// Entries iterate in ascending item-ID order, which keeps mining output
/// deterministic across runs.
#[derive(Debug, Default)]
pub struct PostingAccumulator {
    items: BTreeMap<ItemId, Posting>,
}

impl PostingAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an occurrence of `item` at `(transaction_id, position)`.
    ///
    /// Within one transaction, support is added only on the first
    /// occurrence, and a repeat of the last written position is skipped —
    /// an item that generalizes to the same ancestor over two taxonomy
    /// paths must not be stored twice.
    pub fn record(&mut self, item: ItemId, transaction_id: u32, weight: u64, position: u32) {
        let posting = self.items.entry(item).or_default();
        if posting.last_transaction == Some(transaction_id) {
            if posting.last_position != Some(position) {
                append_value(&mut posting.bytes, position + 1);
                posting.last_position = Some(position);
            }
        } else {
            if !posting.bytes.is_empty() {
                append_value(&mut posting.bytes, 0);
            }
            posting.support += weight;
            posting.last_transaction = Some(transaction_id);
            posting.last_position = Some(position);
            append_value(&mut posting.bytes, transaction_id + 1);
            append_value(&mut posting.bytes, position + 1);
        }
    }

    /// Accumulated support of an item; 0 when the item was never recorded.
    pub fn support(&self, item: ItemId) -> u64 {
        self.items.get(&item).map(|posting| posting.support).unwrap_or(0)
    }

    /// Iterate `(item, posting)` pairs in ascending item-ID order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &Posting)> {
        self.items.iter().map(|(&item, posting)| (item, posting))
    }

    /// Number of distinct items recorded.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop all postings.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Decode a posting list into `(transactionId, positions)` groups.
///
/// Test and diagnostics helper; the miner consumes posting lists
/// incrementally through [`PostingReader`].
pub fn decode(bytes: &[u8]) -> Vec<(u32, Vec<u32>)> {
    let mut groups = Vec::new();
    if bytes.is_empty() {
        return groups;
    }
    let mut reader = PostingReader::new(bytes);
    loop {
        let transaction_id = reader.next_value() - 1;
        let mut positions = Vec::new();
        while reader.has_next_value() {
            positions.push(reader.next_value() - 1);
        }
        groups.push((transaction_id, positions));
        if !reader.next_posting() {
            return groups;
        }
    }
}
