//! Item taxonomy: a DAG of "is-a" relations over raw item names.
//!
//! The taxonomy is consumed twice while building a dictionary: once to
//! propagate occurrence counts from items to all their ancestors, and once
//! to compute a topological order that breaks frequency ties so that an
//! ancestor always receives a smaller item ID than its descendants.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::BufRead;

use crate::error::{GsmError, Result};

const NO_PARENTS: &[String] = &[];

/// A DAG of child -> parent relations over item names.
///
/// An item may have several parents. Items never mentioned in the taxonomy
/// are roots. Cycles are rejected when a topological order is requested.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    // BTreeMap keeps iteration deterministic across runs.
    parents: BTreeMap<String, Vec<String>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

impl Taxonomy {
    /// Create an empty taxonomy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `child` is-a `parent`. Duplicate relations are ignored.
    pub fn add_relation(&mut self, child: &str, parent: &str) {
        let parents = self.parents.entry(child.to_string()).or_default();
        if !parents.iter().any(|p| p == parent) {
            parents.push(parent.to_string());
        }
    }

    /// Direct parents of `name`; empty for roots and unknown items.
    pub fn parents_of(&self, name: &str) -> &[String] {
        self.parents
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(NO_PARENTS)
    }

    /// Number of items with at least one parent.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Whether no relations have been recorded.
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// All transitive ancestors of `name`, each listed once even when
    /// reachable over several paths, in name order.
    pub fn ancestor_closure(&self, name: &str) -> Vec<String> {
        let mut closure = BTreeSet::new();
        let mut pending: Vec<&str> = self.parents_of(name).iter().map(String::as_str).collect();
        while let Some(ancestor) = pending.pop() {
            if closure.insert(ancestor.to_string()) {
                pending.extend(self.parents_of(ancestor).iter().map(String::as_str));
            }
        }
        closure.into_iter().collect()
    }

    /// Topological order over every item mentioned in a relation, ancestors
    /// before descendants. Fails on a cyclic taxonomy.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        let mut marks: HashMap<&str, Mark> = HashMap::new();
        let mut order = Vec::new();

        for child in self.parents.keys() {
            self.visit(child, &mut marks, &mut order)?;
        }
        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        node: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        order: &mut Vec<String>,
    ) -> Result<()> {
        match marks.get(node) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                return Err(GsmError::CyclicTaxonomy {
                    item: node.to_string(),
                })
            }
            None => {}
        }
        marks.insert(node, Mark::Visiting);
        for parent in self.parents_of(node) {
            self.visit(parent, marks, order)?;
        }
        marks.insert(node, Mark::Done);
        order.push(node.to_string());
        Ok(())
    }

    /// Read relations from line-oriented text: one `child <sep> parent`
    /// record per line. Blank lines are skipped; anything else with a field
    /// count other than two fails fast.
    pub fn read_from<R: BufRead>(reader: R, separator: Option<char>) -> Result<Self> {
        let mut taxonomy = Taxonomy::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let fields: Vec<&str> = match separator {
                Some(sep) => trimmed.split(sep).map(str::trim).collect(),
                None => trimmed.split_whitespace().collect(),
            };
            if fields.len() != 2 || fields.iter().any(|f| f.is_empty()) {
                return Err(GsmError::MalformedTaxonomy {
                    line: index + 1,
                    message: format!(
                        "expected 'child parent', found {} field(s)",
                        fields.len()
                    ),
                });
            }
            taxonomy.add_relation(fields[0], fields[1]);
        }
        Ok(taxonomy)
    }
}
