//! Post-exploration subgraph accounting.
//!
//! For every node of the explored DAG, count the distinct ids reachable from it, the distinct
//! ids reached more than once, and the total number of repeat visits. The traversal is a plain
//! per-node DFS over the sentinel-free adjacency, worst case `O(|V|·|E|)`, sharded across
//! worker threads on disjoint id subsets.
use std::sync::Arc;
use std::thread;

use rustc_hash::{FxHashMap, FxHashSet};

use losat_formula::FormulaId;

use crate::node::{NodeCounters, NodeEntry};

/// Ids handled per stats worker.
const STATS_CHUNK: usize = 100_000;

/// Aggregate result of the stats pass.
#[derive(Default, Debug)]
pub struct GraphStats {
    /// The root node's counters, i.e. totals for the whole exploration.
    pub root: NodeCounters,
    /// Repeat-visit counts per redundant node, harvested from the root's traversal.
    pub root_redundants: FxHashMap<FormulaId, u64>,
}

type Adjacency = FxHashMap<FormulaId, Vec<FormulaId>>;

fn subgraph_counters(
    start: FormulaId,
    adjacency: &Adjacency,
) -> (NodeCounters, FxHashMap<FormulaId, u64>) {
    let mut descendants = FxHashSet::default();
    let mut repeats: FxHashMap<FormulaId, u64> = FxHashMap::default();

    // explicit work list; fan-out times depth can exceed the call stack
    let mut stack = vec![start];
    while let Some(current) = stack.pop() {
        if !descendants.insert(current) {
            *repeats.entry(current).or_insert(0) += 1;
            continue;
        }
        if let Some(children) = adjacency.get(&current) {
            stack.extend(children.iter().copied());
        }
    }

    let counters = NodeCounters {
        unique_descendants: descendants.len() as u64,
        redundant_descendants: repeats.len() as u64,
        redundant_hits: repeats.values().sum(),
    };
    (counters, repeats)
}

fn count_ids(
    ids: Vec<FormulaId>,
    adjacency: &Adjacency,
    root: FormulaId,
) -> Vec<(FormulaId, NodeCounters, Option<FxHashMap<FormulaId, u64>>)> {
    ids.into_iter()
        .map(|id| {
            let (counters, repeats) = subgraph_counters(id, adjacency);
            let root_repeats = if id == root { Some(repeats) } else { None };
            (id, counters, root_repeats)
        })
        .collect()
}

/// Compute and store the counters of every node.
///
/// Counters are written into `entries`; the returned [`GraphStats`] carries the root totals and
/// the per-redundant-node hit counts seen from the root.
pub fn compute_graph_stats(
    root: FormulaId,
    entries: &mut FxHashMap<FormulaId, NodeEntry>,
    max_threads: usize,
) -> GraphStats {
    let adjacency: Arc<Adjacency> = Arc::new(
        entries
            .iter()
            .map(|(&id, entry)| {
                let children: Vec<FormulaId> = entry
                    .children
                    .iter()
                    .copied()
                    .filter(|child| !child.is_terminal())
                    .collect();
                (id, children)
            })
            .collect(),
    );

    let ids: Vec<FormulaId> = adjacency.keys().copied().collect();
    let chunks: Vec<Vec<FormulaId>> = ids
        .chunks(STATS_CHUNK)
        .map(|chunk| chunk.to_vec())
        .collect();

    let results = if max_threads > 1 && chunks.len() > 1 {
        let mut handles = vec![];
        let mut pending = chunks.into_iter();
        let mut results = vec![];

        loop {
            while handles.len() < max_threads {
                match pending.next() {
                    Some(chunk) => {
                        let adjacency = Arc::clone(&adjacency);
                        handles.push(thread::spawn(move || count_ids(chunk, &adjacency, root)));
                    }
                    None => break,
                }
            }
            match handles.pop() {
                Some(handle) => match handle.join() {
                    Ok(result) => results.extend(result),
                    Err(panic) => std::panic::resume_unwind(panic),
                },
                None => break,
            }
        }
        results
    } else {
        chunks
            .into_iter()
            .flat_map(|chunk| count_ids(chunk, &adjacency, root))
            .collect()
    };

    let mut stats = GraphStats::default();
    for (id, counters, root_repeats) in results {
        if let Some(entry) = entries.get_mut(&id) {
            entry.counters = counters;
        }
        if let Some(repeats) = root_repeats {
            stats.root_redundants = repeats;
        }
    }
    stats.root = entries
        .get(&root)
        .map(|entry| entry.counters)
        .unwrap_or_default();

    stats
}
