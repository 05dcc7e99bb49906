//! Shared map from formula id to exploration record.
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use losat_formula::{FormulaId, Var};

use crate::node::NodeEntry;

/// Concurrent map `formula id → exploration record`.
///
/// The table only ever grows during exploration. [`insert_if_absent`](NodeTable::insert_if_absent)
/// decides ownership atomically: exactly one caller per id sees `true` and is responsible for
/// enqueueing the formula; every other caller sees `false` and records a redundant hit.
#[derive(Default)]
pub struct NodeTable {
    entries: Mutex<FxHashMap<FormulaId, NodeEntry>>,
}

impl NodeTable {
    pub fn new() -> NodeTable {
        NodeTable::default()
    }

    pub fn contains(&self, id: FormulaId) -> bool {
        self.entries.lock().contains_key(&id)
    }

    /// Insert a fresh record unless the id is already present.
    ///
    /// Returns whether the record was newly created.
    pub fn insert_if_absent(&self, id: FormulaId, body: impl FnOnce() -> String) -> bool {
        use std::collections::hash_map::Entry;

        match self.entries.lock().entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(NodeEntry::new(body()));
                true
            }
        }
    }

    /// Record a child edge, in branch order: pivot-true first, pivot-false second.
    ///
    /// Terminal children are recorded as the `T`/`F` sentinel ids.
    pub fn append_child(&self, parent: FormulaId, child: FormulaId) {
        let mut entries = self.entries.lock();
        let entry = entries
            .get_mut(&parent)
            .expect("appending a child to an unknown node");
        entry.children.push(child);
    }

    /// Mark a node as a redundant target: it was reached again through another branch.
    pub fn mark_redundant(&self, id: FormulaId) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(&id) {
            entry.status = crate::node::NodeStatus::Redundant;
        }
    }

    /// Remember the satisfying assignment found under `parent`, unless one is already recorded.
    pub fn record_witness(&self, parent: FormulaId, witness: FxHashMap<Var, bool>) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(&parent) {
            entry.witness.get_or_insert(witness);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Move the accumulated records out of the table.
    ///
    /// Only meaningful once exploration has finished and no worker writes anymore.
    pub fn take_entries(&self) -> FxHashMap<FormulaId, NodeEntry> {
        std::mem::take(&mut *self.entries.lock())
    }
}
