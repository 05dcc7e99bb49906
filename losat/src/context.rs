//! Shared state of one exploration run.
//!
//! Everything the workers touch concurrently lives here and is threaded into them explicitly;
//! there is no process-wide state.
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;

use losat_formula::{CnfFormula, Mode, Var};

use crate::queue::WorkQueue;
use crate::table::NodeTable;

struct QueueState {
    queue: WorkQueue,
    /// Number of workers currently processing a popped formula.
    busy: usize,
    /// Set once the run is over; blocked workers drain out through this.
    done: bool,
}

/// Shared state of one exploration run.
pub struct Context {
    state: Mutex<QueueState>,
    work_available: Condvar,
    pub table: NodeTable,

    /// Canonicalization applied to formulas produced by splits.
    pub mode: Mode,
    pub sort_by_size: bool,
    pub thief_method: bool,
    exit_upon_solving: bool,

    satisfiable: AtomicBool,
    solution: Mutex<Option<FxHashMap<Var, bool>>>,

    stop: AtomicBool,

    /// Exploration counters, kept for progress logging and consistency checks.
    pub uniques: AtomicU64,
    pub redundant_hits: AtomicU64,
    pub processed: AtomicU64,
}

impl Context {
    pub fn new(
        mode: Mode,
        sort_by_size: bool,
        thief_method: bool,
        exit_upon_solving: bool,
    ) -> Context {
        Context {
            state: Mutex::new(QueueState {
                queue: WorkQueue::new(),
                busy: 0,
                done: false,
            }),
            work_available: Condvar::new(),
            table: NodeTable::new(),
            mode,
            sort_by_size,
            thief_method,
            exit_upon_solving,
            satisfiable: AtomicBool::new(false),
            solution: Mutex::new(None),
            stop: AtomicBool::new(false),
            uniques: AtomicU64::new(0),
            redundant_hits: AtomicU64::new(0),
            processed: AtomicU64::new(0),
        }
    }

    /// Append a formula to the shared queue and wake one waiting worker.
    pub fn enqueue(&self, formula: CnfFormula) {
        let mut state = self.state.lock();
        state.queue.insert(formula);
        self.work_available.notify_one();
    }

    /// Blocking pop.
    ///
    /// Returns `None` when the run is over: the queue ran dry with no busy worker left, or
    /// cancellation was requested. A returned formula counts its worker as busy until
    /// [`task_done`](Context::task_done).
    pub fn next_task(&self) -> Option<CnfFormula> {
        let mut state = self.state.lock();
        loop {
            if state.done || self.stop.load(Ordering::Relaxed) {
                state.done = true;
                self.work_available.notify_all();
                return None;
            }
            if let Some(formula) = state.queue.pop() {
                state.busy += 1;
                return Some(formula);
            }
            if state.busy == 0 {
                state.done = true;
                self.work_available.notify_all();
                return None;
            }
            self.work_available.wait(&mut state);
        }
    }

    /// Non-blocking pop, used while seeding the queue single-threaded.
    pub fn try_next_task(&self) -> Option<CnfFormula> {
        let mut state = self.state.lock();
        if state.done || self.stop.load(Ordering::Relaxed) {
            return None;
        }
        let formula = state.queue.pop()?;
        state.busy += 1;
        Some(formula)
    }

    /// Balance a preceding [`next_task`](Context::next_task); detects termination.
    pub fn task_done(&self) {
        let mut state = self.state.lock();
        state.busy -= 1;
        if state.busy == 0 && state.queue.is_empty() {
            state.done = true;
            self.work_available.notify_all();
        }
    }

    pub fn queue_len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Ask every worker to return at its next loop iteration.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
        let mut state = self.state.lock();
        state.done = true;
        self.work_available.notify_all();
    }

    /// Record a terminal-true branch.
    ///
    /// Satisfiability is sticky; the witness slot is publish-once, the first solution wins.
    /// With `exit_upon_solving` set this also cancels the run.
    pub fn publish_solution(&self, witness: FxHashMap<Var, bool>) {
        self.satisfiable.store(true, Ordering::Relaxed);

        {
            let mut slot = self.solution.lock();
            if slot.is_none() {
                *slot = Some(witness);
            }
        }

        if self.exit_upon_solving {
            self.request_stop();
        }
    }

    pub fn is_satisfiable(&self) -> bool {
        self.satisfiable.load(Ordering::Relaxed)
    }

    /// Move the published solution out of the context.
    pub fn take_solution(&self) -> Option<FxHashMap<Var, bool>> {
        self.solution.lock().take()
    }
}
