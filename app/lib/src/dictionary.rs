//! Dictionary: dense item identifiers plus the ancestor-closure table.
//!
//! Items are numbered 1..N in descending order of their aggregate
//! collection frequency (an occurrence of an item also counts for every
//! taxonomy ancestor), with frequency ties broken by ascending topological
//! order. That ordering guarantees every ancestor's ID is strictly smaller
//! than the IDs of all its descendants, which is what lets the closure
//! table be built in a single forward pass and lets the miner prune by ID.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{GsmError, Result};
use crate::taxonomy::Taxonomy;

/// Dense 1-based item identifier; 0 is reserved as a structural separator
/// and never denotes an item.
pub type ItemId = u32;

/// Immutable item dictionary with name/ID mappings, per-item frequencies,
/// and the flat ancestor-closure table.
///
/// A dictionary is built once (or loaded from its at-rest form) and then
/// shared read-only by every miner of a run.
#[derive(Debug, Clone)]
pub struct Dictionary {
    // All indexed by item ID; slot 0 is unused.
    names: Vec<String>,
    ids: HashMap<String, ItemId>,
    collection_frequencies: Vec<u64>,
    document_frequencies: Vec<u64>,
    // ancestor_offsets[id]..ancestor_offsets[id + 1] delimits the closure
    // slice of `id` in ancestor_ids, sorted ascending.
    ancestor_offsets: Vec<usize>,
    ancestor_ids: Vec<ItemId>,
}

/// One dictionary record, as serialized in the JSON export.
#[derive(Debug, Serialize)]
pub struct DictionaryEntry<'a> {
    /// Raw item name.
    pub name: &'a str,
    /// Aggregate collection frequency (occurrences, ancestors included).
    pub collection_frequency: u64,
    /// Aggregate document frequency (sequences, ancestors included).
    pub document_frequency: u64,
    /// Assigned dense identifier.
    pub id: ItemId,
    /// Transitive ancestor IDs, all strictly smaller than `id`.
    pub ancestors: &'a [ItemId],
}

impl Dictionary {
    /// Number of items.
    pub fn len(&self) -> usize {
        self.names.len() - 1
    }

    /// Whether the dictionary holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the ID assigned to a raw item name.
    pub fn id(&self, name: &str) -> Option<ItemId> {
        self.ids.get(name).copied()
    }

    /// The raw name of an item.
    ///
    /// Panics if `id` is not a valid item ID of this dictionary.
    pub fn name(&self, id: ItemId) -> &str {
        &self.names[id as usize]
    }

    /// Aggregate collection frequency of an item.
    pub fn collection_frequency(&self, id: ItemId) -> u64 {
        self.collection_frequencies[id as usize]
    }

    /// Aggregate document frequency of an item.
    pub fn document_frequency(&self, id: ItemId) -> u64 {
        self.document_frequencies[id as usize]
    }

    /// The transitive ancestors of an item, ascending by ID.
    pub fn ancestors(&self, id: ItemId) -> &[ItemId] {
        let id = id as usize;
        &self.ancestor_ids[self.ancestor_offsets[id]..self.ancestor_offsets[id + 1]]
    }

    /// Iterate all records in ID order.
    pub fn entries(&self) -> impl Iterator<Item = DictionaryEntry<'_>> {
        (1..=self.len() as ItemId).map(move |id| DictionaryEntry {
            name: self.name(id),
            collection_frequency: self.collection_frequency(id),
            document_frequency: self.document_frequency(id),
            id,
            ancestors: self.ancestors(id),
        })
    }

    /// Defensive post-condition check: every listed ancestor ID must be
    /// strictly smaller than its item's ID. A violation is an internal
    /// consistency failure, not a user error.
    fn verify_ancestor_order(&self) -> Result<()> {
        for id in 1..=self.len() as ItemId {
            for &ancestor in self.ancestors(id) {
                if ancestor == 0 || ancestor >= id {
                    return Err(GsmError::AncestorOrder { item: id, ancestor });
                }
            }
        }
        Ok(())
    }

    /// Write the at-rest form: one tab-separated record per item,
    /// `name  collectionFreq  documentFreq  itemId  ancestorIds`, where the
    /// last field is a comma-separated ID list (empty for roots).
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(writer);
        for entry in self.entries() {
            let ancestors = entry
                .ancestors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.write_record([
                entry.name,
                &entry.collection_frequency.to_string(),
                &entry.document_frequency.to_string(),
                &entry.id.to_string(),
                &ancestors,
            ])?;
        }
        out.flush()?;
        Ok(())
    }

    /// Write the at-rest form to a file path.
    pub fn to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.write_to(BufWriter::new(File::create(path)?))
    }

    /// Serialize all records as pretty-printed JSON.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        let entries: Vec<DictionaryEntry<'_>> = self.entries().collect();
        serde_json::to_writer_pretty(writer, &entries)?;
        Ok(())
    }

    /// Load a dictionary from its at-rest form.
    ///
    /// Records may appear in any order but the IDs must cover 1..N exactly
    /// once; malformed records fail fast with their line number rather than
    /// being skipped, since silent gaps would corrupt support counts.
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        let mut input = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .from_reader(reader);

        struct Row {
            name: String,
            collection_frequency: u64,
            document_frequency: u64,
            id: ItemId,
            ancestors: Vec<ItemId>,
        }

        let mut rows: Vec<Row> = Vec::new();
        for (index, record) in input.records().enumerate() {
            let line = index + 1;
            let record = record?;
            if record.len() != 5 {
                return Err(GsmError::MalformedDictionary {
                    line,
                    message: format!(
                        "expected 5 tab-separated fields, found {}",
                        record.len()
                    ),
                });
            }
            let number = |field: &str, what: &str| -> Result<u64> {
                field.parse::<u64>().map_err(|_| GsmError::MalformedDictionary {
                    line,
                    message: format!("non-numeric {what} '{field}'"),
                })
            };
            let id = number(&record[3], "item ID")? as ItemId;
            if id == 0 {
                return Err(GsmError::MalformedDictionary {
                    line,
                    message: "item ID 0 is reserved".to_string(),
                });
            }
            let mut ancestors = Vec::new();
            if !record[4].is_empty() {
                for field in record[4].split(',') {
                    let ancestor = number(field, "ancestor ID")? as ItemId;
                    if ancestor == 0 || ancestor >= id {
                        return Err(GsmError::MalformedDictionary {
                            line,
                            message: format!(
                                "ancestor {ancestor} of item {id} breaks the \
                                 ancestor < item ordering"
                            ),
                        });
                    }
                    ancestors.push(ancestor);
                }
                ancestors.sort_unstable();
                ancestors.dedup();
            }
            rows.push(Row {
                name: record[0].to_string(),
                collection_frequency: number(&record[1], "collection frequency")?,
                document_frequency: number(&record[2], "document frequency")?,
                id,
                ancestors,
            });
        }

        rows.sort_by_key(|row| row.id);
        for (index, row) in rows.iter().enumerate() {
            if row.id as usize != index + 1 {
                return Err(GsmError::MalformedDictionary {
                    line: 0,
                    message: format!(
                        "item IDs are not dense: expected {}, found {}",
                        index + 1,
                        row.id
                    ),
                });
            }
        }

        let item_count = rows.len();
        let mut names = Vec::with_capacity(item_count + 1);
        names.push(String::new());
        let mut ids = HashMap::with_capacity(item_count);
        let mut collection_frequencies = vec![0u64];
        let mut document_frequencies = vec![0u64];
        let mut ancestor_offsets = vec![0usize; item_count + 2];
        let mut ancestor_ids = Vec::new();
        for row in rows {
            ids.insert(row.name.clone(), row.id);
            names.push(row.name);
            collection_frequencies.push(row.collection_frequency);
            document_frequencies.push(row.document_frequency);
            ancestor_offsets[row.id as usize + 1] =
                ancestor_offsets[row.id as usize] + row.ancestors.len();
            ancestor_ids.extend_from_slice(&row.ancestors);
        }

        let dictionary = Dictionary {
            names,
            ids,
            collection_frequencies,
            document_frequencies,
            ancestor_offsets,
            ancestor_ids,
        };
        dictionary.verify_ancestor_order()?;
        Ok(dictionary)
    }

    /// Load a dictionary from a file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::read_from(BufReader::new(File::open(path)?))
    }
}

/// Accumulates corpus statistics and produces a [`Dictionary`].
///
/// Feed every sequence of the corpus through [`count_sequence`] before
/// calling [`build`]; each occurrence of an item also counts for all of its
/// taxonomy ancestors, so an ancestor's aggregate frequency is always at
/// least the sum over its descendants.
///
/// [`count_sequence`]: DictionaryBuilder::count_sequence
/// [`build`]: DictionaryBuilder::build
#[derive(Debug, Default)]
pub struct DictionaryBuilder {
    taxonomy: Taxonomy,
    collection: HashMap<String, u64>,
    document: HashMap<String, u64>,
    // Closure memo; sequences repeat the same items constantly.
    closures: HashMap<String, Arc<[String]>>,
}

impl DictionaryBuilder {
    /// Create a builder generalizing through the given taxonomy.
    pub fn new(taxonomy: Taxonomy) -> Self {
        Self {
            taxonomy,
            ..Self::default()
        }
    }

    /// Count one sequence with the given support weight (normally 1;
    /// larger values represent pre-aggregated records).
    pub fn count_sequence<I, S>(&mut self, items: I, weight: u64)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut word_counts: HashMap<String, u64> = HashMap::new();
        for item in items {
            let item = item.as_ref();
            *word_counts.entry(item.to_string()).or_default() += 1;
            for ancestor in self.closure_of(item).iter() {
                *word_counts.entry(ancestor.clone()).or_default() += 1;
            }
        }
        for (term, count) in word_counts {
            *self.collection.entry(term.clone()).or_default() += count * weight;
            *self.document.entry(term).or_default() += weight;
        }
    }

    fn closure_of(&mut self, item: &str) -> Arc<[String]> {
        if let Some(closure) = self.closures.get(item) {
            return Arc::clone(closure);
        }
        let closure: Arc<[String]> = self.taxonomy.ancestor_closure(item).into();
        self.closures.insert(item.to_string(), Arc::clone(&closure));
        closure
    }

    /// Assign item IDs and build the ancestor-closure table.
    ///
    /// Fails before any ID is assigned if the taxonomy is cyclic, and
    /// fails afterwards if the built table violates the ancestor ordering
    /// invariant (an internal error that should never be reachable).
    pub fn build(self) -> Result<Dictionary> {
        let order = self.taxonomy.topological_order()?;
        let rank: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(index, name)| (name.as_str(), index))
            .collect();

        let mut terms: Vec<(&String, u64)> = self
            .collection
            .iter()
            .map(|(term, &frequency)| (term, frequency))
            .collect();
        // Frequency descending, then topological order ascending so that an
        // ancestor tied with a descendant still sorts first, then name for
        // a fully deterministic assignment.
        terms.sort_by(|(a, fa), (b, fb)| {
            fb.cmp(fa)
                .then_with(|| {
                    let ra = rank.get(a.as_str()).copied().unwrap_or(usize::MAX);
                    let rb = rank.get(b.as_str()).copied().unwrap_or(usize::MAX);
                    ra.cmp(&rb)
                })
                .then_with(|| a.cmp(b))
        });

        let item_count = terms.len();
        let mut names = Vec::with_capacity(item_count + 1);
        names.push(String::new());
        let mut ids = HashMap::with_capacity(item_count);
        let mut collection_frequencies = vec![0u64];
        let mut document_frequencies = vec![0u64];
        for (index, (term, frequency)) in terms.iter().enumerate() {
            let id = (index + 1) as ItemId;
            names.push((*term).clone());
            ids.insert((*term).clone(), id);
            collection_frequencies.push(*frequency);
            document_frequencies.push(self.document.get(*term).copied().unwrap_or(0));
        }

        // Forward pass: when item `id` is reached, every parent already has
        // a smaller ID and a complete closure slice to union in.
        let mut ancestor_offsets = vec![0usize; item_count + 2];
        let mut ancestor_ids: Vec<ItemId> = Vec::new();
        for id in 1..=item_count {
            let mut slice: Vec<ItemId> = Vec::new();
            for parent in self.taxonomy.parents_of(&names[id]) {
                // A parent without an ID never occurred anywhere; treat the
                // reference as "no parent".
                if let Some(&parent_id) = ids.get(parent) {
                    slice.push(parent_id);
                    let parent_range = ancestor_offsets[parent_id as usize]
                        ..ancestor_offsets[parent_id as usize + 1];
                    slice.extend_from_slice(&ancestor_ids[parent_range]);
                }
            }
            slice.sort_unstable();
            slice.dedup();
            ancestor_offsets[id + 1] = ancestor_offsets[id] + slice.len();
            ancestor_ids.extend_from_slice(&slice);
        }

        let dictionary = Dictionary {
            names,
            ids,
            collection_frequencies,
            document_frequencies,
            ancestor_offsets,
            ancestor_ids,
        };
        dictionary.verify_ancestor_order()?;
        Ok(dictionary)
    }
}
