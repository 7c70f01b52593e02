//! Pattern sinks: where discovered patterns go.
//!
//! The miner reports each frequent, pivot-contained pattern exactly once
//! through the [`PatternSink`] seam. Patterns arrive in DFS pre-order, so a
//! pattern's prefixes are always seen before its extensions; no further
//! ordering is promised.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::dictionary::{Dictionary, ItemId};
use crate::error::Result;

/// Receives `(pattern, support)` pairs from the miner.
pub trait PatternSink {
    /// Called once per frequent, pivot-contained pattern.
    fn write(&mut self, pattern: &[ItemId], support: u64) -> Result<()>;
}

/// Collects patterns into memory; mostly useful for tests and small runs.
#[derive(Debug, Default)]
pub struct PatternCollector {
    patterns: Vec<(Vec<ItemId>, u64)>,
}

impl PatternCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected `(pattern, support)` pairs, in arrival order.
    pub fn patterns(&self) -> &[(Vec<ItemId>, u64)] {
        &self.patterns
    }

    /// Consume the collector and return the collected pairs.
    pub fn into_patterns(self) -> Vec<(Vec<ItemId>, u64)> {
        self.patterns
    }
}

impl PatternSink for PatternCollector {
    fn write(&mut self, pattern: &[ItemId], support: u64) -> Result<()> {
        self.patterns.push((pattern.to_vec(), support));
        Ok(())
    }
}

/// Writes patterns as text, one `name name ...\tsupport` line per pattern,
/// translating item IDs back to their dictionary names.
pub struct TextPatternWriter<'a, W: Write> {
    dictionary: &'a Dictionary,
    writer: W,
}

impl<'a, W: Write> TextPatternWriter<'a, W> {
    /// Create a writer translating IDs through `dictionary`.
    pub fn new(dictionary: &'a Dictionary, writer: W) -> Self {
        Self { dictionary, writer }
    }

    /// Flush buffered output.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Consume the writer, flushing and returning the inner writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> PatternSink for TextPatternWriter<'_, W> {
    fn write(&mut self, pattern: &[ItemId], support: u64) -> Result<()> {
        let mut first = true;
        for &item in pattern {
            if !first {
                self.writer.write_all(b" ")?;
            }
            first = false;
            self.writer.write_all(self.dictionary.name(item).as_bytes())?;
        }
        writeln!(self.writer, "\t{support}")?;
        Ok(())
    }
}

/// A cloneable sink handle serializing writes from concurrent partitions
/// into one underlying sink.
pub struct SharedSink<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> SharedSink<S> {
    /// Wrap a sink for shared use.
    pub fn new(sink: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sink)),
        }
    }

    /// Recover the inner sink once all other handles are dropped.
    pub fn into_inner(self) -> Option<S> {
        Arc::try_unwrap(self.inner).ok().map(Mutex::into_inner)
    }
}

impl<S> Clone for SharedSink<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: PatternSink> PatternSink for SharedSink<S> {
    fn write(&mut self, pattern: &[ItemId], support: u64) -> Result<()> {
        self.inner.lock().write(pattern, support)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::DictionaryBuilder;
    use crate::taxonomy::Taxonomy;

    #[test]
    fn test_collector_keeps_arrival_order() {
        let mut collector = PatternCollector::new();
        collector.write(&[2], 3).unwrap();
        collector.write(&[2, 1], 2).unwrap();
        assert_eq!(
            collector.into_patterns(),
            vec![(vec![2], 3), (vec![2, 1], 2)]
        );
    }

    #[test]
    fn test_text_writer_translates_names() {
        let mut builder = DictionaryBuilder::new(Taxonomy::new());
        builder.count_sequence(["b", "a", "a"], 1);
        let dictionary = builder.build().unwrap();
        let a = dictionary.id("a").unwrap();
        let b = dictionary.id("b").unwrap();

        let mut writer = TextPatternWriter::new(&dictionary, Vec::new());
        writer.write(&[a, b], 2).unwrap();
        let output = writer.finish().unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "a b\t2\n");
    }

    #[test]
    fn test_shared_sink_fans_into_one_collector() {
        let shared = SharedSink::new(PatternCollector::new());
        let mut first = shared.clone();
        let mut second = shared.clone();
        first.write(&[1], 1).unwrap();
        second.write(&[2], 1).unwrap();
        drop(first);
        drop(second);
        let collector = shared.into_inner().unwrap();
        assert_eq!(collector.patterns().len(), 2);
    }
}
