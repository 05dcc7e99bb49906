//! The per-task procedure: split, classify both children, enqueue the fresh ones.
use std::sync::atomic::Ordering;

use log::{debug, info};

use losat_formula::{CnfFormula, FormulaId};

use crate::context::Context;
use crate::node::NodeStatus;

/// How many splits a worker performs between progress log lines.
const LOG_INTERVAL: u64 = 1024;

/// Split one formula and classify both children.
///
/// Children are handled in branch order, pivot-true first. A terminal child is recorded as a
/// sentinel edge (and published as the solution when true); a proper child is canonicalized,
/// hashed and inserted into the node table. Exactly one worker wins the insertion of a given id
/// and enqueues the formula, everyone else just records the redundant hit.
pub fn process_formula(ctx: &Context, mut formula: CnfFormula) {
    let parent_id = formula.id();
    debug!("splitting node {}", parent_id);

    let (left, right) = formula.evaluate();

    for mut child in [left, right] {
        match child.value() {
            Some(value) => {
                // terminal children never enter the table; NodeStatus::Evaluated
                if value {
                    ctx.table
                        .record_witness(parent_id, child.evaluated_vars().clone());
                    ctx.publish_solution(child.evaluated_vars().clone());
                }
                ctx.table
                    .append_child(parent_id, FormulaId::terminal(value));
            }
            None => {
                child.to_lo_condition(ctx.mode, ctx.sort_by_size, ctx.thief_method);
                let id = child.id();

                let status = if ctx.table.insert_if_absent(id, || child.canonical_string()) {
                    NodeStatus::Unique
                } else {
                    NodeStatus::Redundant
                };
                ctx.table.append_child(parent_id, id);

                match status {
                    NodeStatus::Unique => {
                        ctx.uniques.fetch_add(1, Ordering::Relaxed);
                        ctx.enqueue(child);
                    }
                    _ => {
                        ctx.redundant_hits.fetch_add(1, Ordering::Relaxed);
                        ctx.table.mark_redundant(id);
                    }
                }
            }
        }
    }

    let processed = ctx.processed.fetch_add(1, Ordering::Relaxed) + 1;
    if processed % LOG_INTERVAL == 0 {
        info!(
            "nodes: {} | queue: {} | uniques: {} | redundant hits: {}",
            ctx.table.len(),
            ctx.queue_len(),
            ctx.uniques.load(Ordering::Relaxed),
            ctx.redundant_hits.load(Ordering::Relaxed),
        );
    }
}

/// Worker loop: drain the shared queue until the run is over.
pub fn process_queue(ctx: &Context) {
    while let Some(formula) = ctx.next_task() {
        process_formula(ctx, formula);
        ctx.task_done();
    }
}

/// Drain the queue single-threaded until it holds at least `target` formulas.
///
/// Used to grow enough independent subproblems before the worker pool takes over. Returns early
/// when the whole problem was exhausted first.
pub fn seed_queue(ctx: &Context, target: usize) {
    while ctx.queue_len() < target {
        match ctx.try_next_task() {
            Some(formula) => {
                process_formula(ctx, formula);
                ctx.task_done();
            }
            None => break,
        }
    }
}
