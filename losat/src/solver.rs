//! Boolean satisfiability solver.
use std::io;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

use anyhow::Error;
use log::info;
use rustc_hash::{FxHashMap, FxHashSet};

use losat_formula::{CnfFormula, FormulaId, Lit, Var};

use crate::config::{SolverConfig, SolverConfigUpdate};
use crate::context::Context;
use crate::graph;
use crate::node::NodeEntry;
use crate::stats::{self, GraphStats};
use crate::worker;

/// Queue size at which inline seeding hands over to the worker pool.
fn spawn_threshold(threads: usize) -> usize {
    threads.min(32).max(1)
}

/// The result of one exploration run.
struct Outcome {
    satisfiable: bool,
    solution: Option<FxHashMap<Var, bool>>,
    root: Option<FormulaId>,
    entries: FxHashMap<FormulaId, NodeEntry>,
    stats: GraphStats,
    uniques: u64,
    redundant_hits: u64,
}

impl Outcome {
    /// Outcome of an input that was terminal before any split.
    fn trivial(satisfiable: bool) -> Outcome {
        Outcome {
            satisfiable,
            solution: if satisfiable {
                // no variable is constrained
                Some(FxHashMap::default())
            } else {
                None
            },
            root: None,
            entries: FxHashMap::default(),
            stats: GraphStats::default(),
            uniques: 0,
            redundant_hits: 0,
        }
    }
}

/// A boolean satisfiability solver.
///
/// Decides satisfiability by canonicalizing every subformula into linearly ordered form,
/// content-addressing it, and exploring the resulting DAG of subproblems breadth-first under a
/// pool of workers. Structurally equivalent subproblems reached through different branches are
/// recognized by their hash and not recomputed.
#[derive(Default)]
pub struct Solver {
    config: SolverConfig,
    input: CnfFormula,
    outcome: Option<Outcome>,
}

impl Solver {
    /// Create a new solver with the default configuration.
    pub fn new() -> Solver {
        Solver::default()
    }

    /// Create a new solver with the given configuration.
    pub fn with_config(config: SolverConfig) -> Solver {
        Solver {
            config,
            ..Solver::default()
        }
    }

    /// Apply a partial configuration update.
    pub fn config(&mut self, update: &SolverConfigUpdate) -> Result<(), Error> {
        self.config.apply(update)
    }

    /// Add the clauses of a formula to the solver.
    pub fn add_formula(&mut self, formula: &CnfFormula) {
        if formula.value() == Some(false) {
            // an already-false formula contributes an empty clause
            self.input.add_clause(std::iter::empty::<Lit>());
            return;
        }
        for clause in formula.iter() {
            self.input.add_clause(clause.lits());
        }
    }

    /// Reads and adds a formula in DIMACS CNF format.
    pub fn add_dimacs_cnf(&mut self, input: impl io::Read) -> Result<(), Error> {
        let formula = losat_dimacs::parse_dimacs(input)?;

        info!(
            "Parsed formula with {} variables and {} clauses",
            formula.variables().len(),
            formula.len()
        );

        self.add_formula(&formula);
        Ok(())
    }

    /// Parses and adds a formula in the single-line format, e.g. `1|-2&3`.
    pub fn add_line_format(&mut self, input: &str) -> Result<(), Error> {
        let formula = losat_dimacs::parse_line(input)?;
        self.add_formula(&formula);
        Ok(())
    }

    /// Check the satisfiability of the current formula.
    pub fn solve(&mut self) -> bool {
        let mut root = self.input.clone();

        // inputs that never reach the exploration loop
        if root.value() == Some(false) {
            self.outcome = Some(Outcome::trivial(false));
            return false;
        }
        if root.value() == Some(true) || root.is_empty() {
            self.outcome = Some(Outcome::trivial(true));
            return true;
        }

        root.assume_original_names();
        root.to_lo_condition(self.config.mode, self.config.sort_by_size, self.config.thief_method);
        let root_id = root.id();

        let threads = self.config.effective_threads();
        info!(
            "solving in {} mode with {} worker thread(s)",
            self.config.mode, threads
        );

        let ctx = Arc::new(Context::new(
            self.config.mode.descendant_mode(),
            self.config.sort_by_size,
            self.config.thief_method,
            self.config.exit_upon_solving,
        ));

        ctx.table.insert_if_absent(root_id, || root.canonical_string());
        ctx.uniques.fetch_add(1, Ordering::Relaxed);
        ctx.enqueue(root);

        if threads <= 1 {
            worker::process_queue(&ctx);
        } else {
            worker::seed_queue(&ctx, spawn_threshold(threads));

            if ctx.queue_len() > 0 {
                let mut handles = Vec::with_capacity(threads);
                for index in 0..threads {
                    let ctx = Arc::clone(&ctx);
                    let handle = thread::Builder::new()
                        .name(format!("losat-worker-{}", index))
                        .spawn(move || worker::process_queue(&ctx))
                        .expect("failed to spawn worker thread");
                    handles.push(handle);
                }
                for handle in handles {
                    if let Err(panic) = handle.join() {
                        std::panic::resume_unwind(panic);
                    }
                }
            }
        }

        let satisfiable = ctx.is_satisfiable();
        let solution = ctx.take_solution();
        let mut entries = ctx.table.take_entries();
        let uniques = ctx.uniques.load(Ordering::Relaxed);
        let redundant_hits = ctx.redundant_hits.load(Ordering::Relaxed);

        let stats = stats::compute_graph_stats(root_id, &mut entries, threads);

        info!(
            "explored {} unique nodes, {} redundant subtrees, {} redundant hits",
            stats.root.unique_descendants,
            stats.root.redundant_descendants,
            stats.root.redundant_hits,
        );

        self.outcome = Some(Outcome {
            satisfiable,
            solution,
            root: Some(root_id),
            entries,
            stats,
            uniques,
            redundant_hits,
        });

        satisfiable
    }

    /// The result of the last [`solve`](Solver::solve) call.
    pub fn satisfiable(&self) -> Option<bool> {
        self.outcome.as_ref().map(|outcome| outcome.satisfiable)
    }

    /// The discovered partial assignment, keyed by input variable name.
    ///
    /// Variables absent from the map are unconstrained.
    pub fn assignment(&self) -> Option<&FxHashMap<Var, bool>> {
        self.outcome.as_ref()?.solution.as_ref()
    }

    /// Set of literals that satisfy the formula.
    ///
    /// Covers every input variable; variables the witness leaves unconstrained are set to true.
    pub fn model(&self) -> Option<Vec<Lit>> {
        let outcome = self.outcome.as_ref()?;
        if !outcome.satisfiable {
            return None;
        }
        let assignment = outcome.solution.as_ref();
        Some(
            self.input
                .variables()
                .into_iter()
                .map(|var| {
                    let value = assignment
                        .and_then(|a| a.get(&var))
                        .copied()
                        .unwrap_or(true);
                    Lit::from_var(var, value)
                })
                .collect(),
        )
    }

    /// Check the model against every input clause.
    pub fn verify_model(&self) -> Option<bool> {
        let model: FxHashSet<Lit> = self.model()?.into_iter().collect();
        Some(
            self.input
                .iter()
                .all(|clause| clause.lits().iter().any(|lit| model.contains(lit))),
        )
    }

    /// Id of the canonicalized root, if the run explored anything.
    pub fn root_id(&self) -> Option<FormulaId> {
        self.outcome.as_ref()?.root
    }

    /// The exploration records, keyed by formula id.
    pub fn nodes(&self) -> Option<&FxHashMap<FormulaId, NodeEntry>> {
        self.outcome.as_ref().map(|outcome| &outcome.entries)
    }

    /// Number of unique formulas explored, the root included.
    pub fn node_count(&self) -> usize {
        self.outcome
            .as_ref()
            .map(|outcome| outcome.entries.len())
            .unwrap_or(0)
    }

    /// Totals of the post-exploration stats pass.
    pub fn stats(&self) -> Option<&GraphStats> {
        self.outcome.as_ref().map(|outcome| &outcome.stats)
    }

    /// Number of `Unique` classification events during exploration, the root included.
    pub fn unique_events(&self) -> Option<u64> {
        self.outcome.as_ref().map(|outcome| outcome.uniques)
    }

    /// Number of `Redundant` classification events during exploration.
    pub fn redundant_events(&self) -> Option<u64> {
        self.outcome.as_ref().map(|outcome| outcome.redundant_hits)
    }

    /// Write the explored DAG in DOT format.
    pub fn write_dot(&self, target: &mut impl io::Write) -> io::Result<()> {
        match self.outcome.as_ref() {
            Some(outcome) => graph::write_dot(target, &outcome.entries),
            None => graph::write_dot(target, &FxHashMap::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use losat_formula::{cnf_formula, var};

    #[test]
    fn empty_input_is_satisfiable() {
        let mut solver = Solver::new();
        assert!(solver.solve());
        assert_eq!(solver.model(), Some(vec![]));
        assert_eq!(solver.node_count(), 0);
    }

    #[test]
    fn single_unit_clause() {
        let mut solver = Solver::new();
        solver.add_formula(&cnf_formula![-3;]);
        assert!(solver.solve());
        assert_eq!(solver.assignment().unwrap().get(&var!(3)), Some(&false));
        assert_eq!(solver.verify_model(), Some(true));
        assert_eq!(solver.node_count(), 1);
    }

    #[test]
    fn contradiction_is_unsat() {
        let mut solver = Solver::new();
        solver.add_formula(&cnf_formula![1; -1;]);
        assert!(!solver.solve());
        assert_eq!(solver.model(), None);
        // the root is the only node: both branches are terminal
        assert_eq!(solver.node_count(), 1);
    }
}
