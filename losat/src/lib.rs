//! A canonicalizing, deduplicating parallel SAT solver (library).
//!
//! Formulas are brought into a linearly ordered canonical form, content-addressed by hash, and
//! split on a pivot literal; the resulting DAG of subproblems is explored breadth-first by a
//! pool of workers that recognize structurally equivalent subproblems and solve them once.

pub mod config;
pub mod node;
pub mod queue;
pub mod solver;
pub mod stats;
pub mod table;

mod context;
mod graph;
mod worker;

pub use losat_formula::{Clause, CnfFormula, FormulaId, Lit, Mode, Var};

pub use losat_dimacs as dimacs;

pub use crate::config::{SolverConfig, SolverConfigUpdate};
pub use crate::solver::Solver;
