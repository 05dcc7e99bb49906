//! Exploration records.
use rustc_hash::FxHashMap;

use losat_formula::{FormulaId, Var};

/// Classification of a child produced by a split.
///
/// The first worker to insert a child's id owns it and classifies it `Unique`; every later
/// encounter of the same id is `Redundant`. Terminal boolean children are `Evaluated` and never
/// enter the node table.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum NodeStatus {
    Unique,
    Redundant,
    Evaluated,
}

impl Default for NodeStatus {
    fn default() -> NodeStatus {
        NodeStatus::Unique
    }
}

/// Counters computed by the post-exploration stats pass.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct NodeCounters {
    /// Distinct ids reachable from the node, the node itself included.
    pub unique_descendants: u64,
    /// Distinct ids reached more than once in a traversal from the node.
    pub redundant_descendants: u64,
    /// Total number of repeat visits in a traversal from the node.
    pub redundant_hits: u64,
}

/// Exploration record of one canonical formula.
#[derive(Default, Debug)]
pub struct NodeEntry {
    /// `Unique` until the node is reached a second time through another branch.
    pub status: NodeStatus,
    /// Canonical body text, exactly the bytes that were hashed into the node's id.
    pub body: String,
    /// Children in branch order: the pivot-true branch first, then the pivot-false branch.
    /// Terminal children are recorded as the `T`/`F` sentinel ids.
    pub children: Vec<FormulaId>,
    /// Filled in by the stats pass after exploration.
    pub counters: NodeCounters,
    /// The satisfying assignment discovered when a branch of this node evaluated to true.
    pub witness: Option<FxHashMap<Var, bool>>,
}

impl NodeEntry {
    pub fn new(body: String) -> NodeEntry {
        NodeEntry {
            body,
            ..NodeEntry::default()
        }
    }
}
