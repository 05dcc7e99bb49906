//! CNF formulas and their linearly ordered canonical form.
use std::error::Error;
use std::fmt;
use std::io;
use std::str::FromStr;

use rustc_hash::{FxHashMap, FxHashSet};
use sha1::{Digest, Sha1};
use vec_mut_scan::VecMutScan;

use crate::clause::{Clause, ClauseForm};
use crate::lit::{Lit, Var};

/// Canonicalization mode.
///
/// Selects which invariants [`CnfFormula::to_lo_condition`] enforces:
///
/// * `Normal`: literals within each clause are sorted; nothing else.
/// * `Lou` (linearly ordered universal): additionally, variables first appear in the dense
///   sequence `1, 2, 3, …` when reading clauses left to right.
/// * `Lo`: `Lou` plus canonical clause order, applied to the root formula only; descendants
///   are canonicalized as `Lou`.
/// * `Flo`: `Lo` at every formula.
/// * `Flop`: `Flo` with clauses additionally grouped by length ascending.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Mode {
    Normal,
    Lou,
    Lo,
    Flo,
    Flop,
}

impl Mode {
    /// Whether this mode enforces an order on the clause list.
    pub fn orders_clauses(self) -> bool {
        matches!(self, Mode::Lo | Mode::Flo | Mode::Flop)
    }

    /// The mode used for descendants of a formula canonicalized with `self`.
    pub fn descendant_mode(self) -> Mode {
        match self {
            Mode::Lo => Mode::Lou,
            other => other,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Mode::Normal => "normal",
            Mode::Lou => "lou",
            Mode::Lo => "lo",
            Mode::Flo => "flo",
            Mode::Flop => "flop",
        };
        write!(f, "{}", name)
    }
}

/// Error returned when parsing an unknown mode name.
#[derive(Debug)]
pub struct UnknownMode(pub String);

impl fmt::Display for UnknownMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "unknown mode '{}', expected one of normal, lou, lo, flo, flop",
            self.0
        )
    }
}

impl Error for UnknownMode {}

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Mode, UnknownMode> {
        match &s.to_ascii_lowercase()[..] {
            "normal" => Ok(Mode::Normal),
            "lou" => Ok(Mode::Lou),
            "lo" => Ok(Mode::Lo),
            "flo" => Ok(Mode::Flo),
            "flop" => Ok(Mode::Flop),
            other => Err(UnknownMode(other.to_owned())),
        }
    }
}

/// Content address of a canonical formula.
///
/// The SHA-1 digest of the canonical text encoding (see [`CnfFormula::write_canonical`]).
/// Formulas that canonicalize to the same clause structure share the same id, which is what
/// makes subproblem deduplication work.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FormulaId([u8; 20]);

impl FormulaId {
    /// Digest of an encoded formula body.
    pub fn of_bytes(data: &[u8]) -> FormulaId {
        let digest = Sha1::digest(data);
        FormulaId(digest.into())
    }

    /// The sentinel id of the terminal `true` or `false` formula.
    pub fn terminal(value: bool) -> FormulaId {
        FormulaId::of_bytes(if value { b"T" } else { b"F" })
    }

    /// Whether this id is one of the two terminal sentinels.
    pub fn is_terminal(self) -> bool {
        self == FormulaId::terminal(true) || self == FormulaId::terminal(false)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

/// Lowercase hex.
impl fmt::Debug for FormulaId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Lowercase hex.
impl fmt::Display for FormulaId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A formula in conjunctive normal form.
///
/// Either a terminal boolean or a conjunction of clauses, together with the bookkeeping that
/// ties the current variable names back to the names of the input formula:
///
/// * `final_names_map[i]` is the name that variable `i + 1` carried before the last round(s) of
///   renaming (the composition of all renames applied since the formula was split off).
/// * `original_values` maps the names the formula carried *at split time* to input names.
/// * `evaluated_vars` is the partial assignment, in input names, accumulated along the branch
///   that produced this formula.
#[derive(Clone, Default)]
pub struct CnfFormula {
    clauses: Vec<Clause>,
    value: Option<bool>,
    final_names_map: Vec<Var>,
    original_values: FxHashMap<Var, Var>,
    evaluated_vars: FxHashMap<Var, bool>,
    highest_occurring: Option<Lit>,
    cached_id: Option<FormulaId>,
    next_initial_index: u32,
}

impl CnfFormula {
    /// Create an empty formula.
    ///
    /// An empty formula carries no value; it becomes terminal or proper through
    /// [`add_clause`](CnfFormula::add_clause).
    pub fn new() -> CnfFormula {
        CnfFormula::default()
    }

    /// The terminal value of the formula, if it has one.
    pub fn value(&self) -> Option<bool> {
        self.value
    }

    /// Whether the formula has collapsed to a terminal boolean.
    pub fn is_terminal(&self) -> bool {
        self.value.is_some()
    }

    /// Number of clauses.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Iterator over all clauses.
    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    /// Appends a clause to the formula.
    ///
    /// The literals are normalized first: duplicates are dropped and tautological clauses
    /// collapse to `true` and are not stored. An empty clause makes the whole formula `false`.
    /// Every call consumes one input position, so initial indices stay aligned with the input
    /// even when a tautology was dropped.
    ///
    /// `literals` can be an `IntoIterator<Item = Lit>` or `IntoIterator<Item = &Lit>`.
    pub fn add_clause<L>(&mut self, literals: impl IntoIterator<Item = L>)
    where
        Vec<Lit>: Extend<L>,
    {
        if self.value == Some(false) {
            return;
        }

        self.next_initial_index += 1;
        let index = self.next_initial_index;

        let mut lits = Vec::new();
        lits.extend(literals);

        match Clause::normalize(lits) {
            ClauseForm::False => self.value = Some(false),
            ClauseForm::True => {
                if self.clauses.is_empty() {
                    self.value = Some(true);
                }
            }
            ClauseForm::Clause(mut clause) => {
                clause.set_initial_index(index);
                self.clauses.push(clause);
                self.value = None;
            }
        }

        self.cached_id = None;
    }

    /// The distinct variables of the formula, ascending.
    pub fn variables(&self) -> Vec<Var> {
        let mut set = FxHashSet::default();
        for clause in &self.clauses {
            for lit in clause.lits() {
                set.insert(lit.var());
            }
        }
        let mut vars: Vec<Var> = set.into_iter().collect();
        vars.sort_unstable();
        vars
    }

    /// Point `original_values` at the formula's own names.
    ///
    /// Used on the root formula before canonicalization; descendants get their map derived
    /// during the split.
    pub fn assume_original_names(&mut self) {
        self.original_values = self.variables().into_iter().map(|v| (v, v)).collect();
    }

    /// The partial assignment, in input variable names, accumulated along this branch.
    pub fn evaluated_vars(&self) -> &FxHashMap<Var, bool> {
        &self.evaluated_vars
    }

    /// Map from the names this formula carried at split time to input names.
    pub fn original_values(&self) -> &FxHashMap<Var, Var> {
        &self.original_values
    }

    /// Rename history: entry `i` is the pre-rename name of variable `i + 1`.
    pub fn final_names_map(&self) -> &[Var] {
        &self.final_names_map
    }

    /// The literal with the most occurrences after the last rename.
    pub fn highest_occurring_var(&self) -> Option<Lit> {
        self.highest_occurring
    }

    /// The branch variable: the first literal of the first clause.
    pub fn pivot(&self) -> Option<Var> {
        self.clauses
            .first()
            .and_then(|cl| cl.lits().first())
            .map(|lit| lit.var())
    }

    /// Give every variable a fresh dense name in order of first appearance.
    ///
    /// Reading clauses left to right and literals left to right, the first unseen variable
    /// becomes `1`, the next `2`, and so on; polarities are preserved. The rename history
    /// (`final_names_map`) is recomposed and literals re-sorted within each clause.
    pub fn rename_vars(&mut self) {
        let mut names: FxHashMap<Var, Var> = FxHashMap::default();
        let mut first_seen: Vec<Var> = Vec::new();
        let mut occurrences: FxHashMap<Lit, u32> = FxHashMap::default();

        for clause in &mut self.clauses {
            for lit in clause.lits_mut() {
                let old = lit.var();
                let new = match names.get(&old) {
                    Some(&new) => new,
                    None => {
                        let new = Var::from_index(first_seen.len());
                        names.insert(old, new);
                        first_seen.push(old);
                        new
                    }
                };
                *lit = lit.with_var(new);
                *occurrences.entry(*lit).or_insert(0) += 1;
            }
            clause.sort();
        }

        self.highest_occurring = occurrences
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(lit, _)| lit);

        if self.final_names_map.is_empty() {
            self.final_names_map = first_seen;
        } else {
            self.final_names_map = first_seen
                .iter()
                .map(|old| self.final_names_map[old.index()])
                .collect();
        }

        self.cached_id = None;
    }

    /// Whether the formula satisfies the invariants of `mode`.
    ///
    /// `Normal` asks nothing beyond the intra-clause order that holds by construction. Other
    /// modes require first-appearance density; the clause-ordering modes additionally require
    /// the canonical clause order, grouped by length first when `mode` is `Flop` or
    /// `sort_by_size` is set.
    pub fn is_linearly_ordered(&self, mode: Mode, sort_by_size: bool) -> bool {
        if self.clauses.is_empty() || mode == Mode::Normal {
            return true;
        }

        // first-appearance density: a fresh variable's name must be 1 + number of variables
        // seen before it
        let mut seen = FxHashSet::default();
        for clause in &self.clauses {
            for lit in clause.lits() {
                let var = lit.var();
                if !seen.contains(&var) {
                    if var.index() != seen.len() {
                        return false;
                    }
                    seen.insert(var);
                }
            }
        }

        if mode.orders_clauses() {
            let grouped = mode == Mode::Flop || sort_by_size;
            for pair in self.clauses.windows(2) {
                if grouped {
                    match pair[0].len().cmp(&pair[1].len()) {
                        std::cmp::Ordering::Greater => return false,
                        std::cmp::Ordering::Equal => {
                            if pair[0] > pair[1] {
                                return false;
                            }
                        }
                        std::cmp::Ordering::Less => (),
                    }
                } else if pair[0] > pair[1] {
                    return false;
                }
            }
        }

        true
    }

    fn sort_clauses(&mut self, length_grouped: bool) {
        self.clauses.sort();
        if length_grouped {
            // stable, so the canonical order survives within each length group
            self.clauses.sort_by_key(|cl| cl.len());
        }
        self.cached_id = None;
    }

    fn sort_clauses_by_length(&mut self) {
        self.clauses.sort_by_key(|cl| cl.len());
        self.cached_id = None;
    }

    fn sort_clauses_by_len_and_initial_index(&mut self) {
        self.clauses
            .sort_by_key(|cl| (cl.len(), cl.initial_index()));
        self.cached_id = None;
    }

    /// Bring the formula into the linearly ordered form of `mode`.
    ///
    /// Renaming and clause sorting can invalidate each other, so both run to a fixpoint:
    /// sorting clauses changes which variable is seen first, renaming changes the clause
    /// order. `thief_method` pre-sorts clauses by `(length, initial index)`.
    pub fn to_lo_condition(&mut self, mode: Mode, sort_by_size: bool, thief_method: bool) {
        if self.value.is_some() || self.clauses.is_empty() {
            return;
        }

        if thief_method {
            self.sort_clauses_by_len_and_initial_index();
        }
        if mode == Mode::Flop || sort_by_size {
            self.sort_clauses_by_length();
        }

        self.rename_vars();
        while !self.is_linearly_ordered(mode, sort_by_size) {
            if mode.orders_clauses() {
                self.sort_clauses(mode == Mode::Flop || sort_by_size);
                if self.is_linearly_ordered(mode, sort_by_size) {
                    break;
                }
            }
            self.rename_vars();
        }

        self.cached_id = None;
    }

    /// Substitute boolean values for variables, by current name.
    ///
    /// Satisfied clauses are removed, falsified literals deleted from the rest. A clause with
    /// no literals left falsifies the whole formula.
    pub fn substitute_vars(&mut self, assignment: &FxHashMap<Var, bool>) {
        let mut falsified = false;

        let mut scan = VecMutScan::new(&mut self.clauses);
        while let Some(mut clause) = scan.next() {
            let satisfied = clause
                .lits()
                .iter()
                .any(|lit| assignment.get(&lit.var()) == Some(&lit.is_positive()));
            if satisfied {
                clause.remove();
                continue;
            }

            clause.retain_vars(|var| !assignment.contains_key(&var));
            if clause.is_empty() {
                falsified = true;
            }
        }
        drop(scan);

        if falsified {
            self.value = Some(false);
        }
        self.cached_id = None;
    }

    /// Split the formula on its pivot.
    ///
    /// The pivot is the variable of the first literal of the first clause. The left branch
    /// assumes the pivot is true, the right branch that it is false. Each branch drops its
    /// satisfied clauses and strips the pivot from the others; a clause stripped to nothing
    /// makes that branch terminal `false`, a branch without remaining clauses is terminal
    /// `true`. Both children get their own provenance maps and the pivot's input name is
    /// recorded in their accumulated assignments.
    pub fn evaluate(&self) -> (CnfFormula, CnfFormula) {
        assert!(
            self.value.is_none() && !self.clauses.is_empty(),
            "cannot split a terminal or empty formula"
        );

        let pivot = self.clauses[0].lits()[0].var();
        let pos = pivot.positive();
        let neg = pivot.negative();

        let mut left = CnfFormula::new();
        let mut right = CnfFormula::new();

        for clause in &self.clauses {
            if clause.contains(pos) {
                // satisfied in the left branch; the right branch keeps the remainder
                match clause.without(pos) {
                    Some(rest) => right.clauses.push(rest),
                    None => right.value = Some(false),
                }
            } else if clause.contains(neg) {
                match clause.without(neg) {
                    Some(rest) => left.clauses.push(rest),
                    None => left.value = Some(false),
                }
            } else {
                left.clauses.push(clause.copied());
                right.clauses.push(clause.copied());
            }
        }

        for branch in [&mut left, &mut right].iter_mut() {
            if branch.clauses.is_empty() && branch.value.is_none() {
                branch.value = Some(true);
            }

            branch.original_values = branch
                .variables()
                .into_iter()
                .map(|var| (var, self.original_values[&self.final_names_map[var.index()]]))
                .collect();
        }

        let input_pivot = self.original_values[&self.final_names_map[pivot.index()]];

        left.evaluated_vars = self.evaluated_vars.clone();
        left.evaluated_vars.insert(input_pivot, true);
        right.evaluated_vars = self.evaluated_vars.clone();
        right.evaluated_vars.insert(input_pivot, false);

        (left, right)
    }

    /// Write the canonical text encoding.
    ///
    /// Clauses are joined by `&`, literals within a clause by `|`, as ASCII decimal integers
    /// with no spaces. The terminal formulas are the single characters `T` and `F`.
    pub fn write_canonical(&self, target: &mut impl io::Write) -> io::Result<()> {
        match self.value {
            Some(true) => target.write_all(b"T"),
            Some(false) => target.write_all(b"F"),
            None => {
                assert!(
                    !self.clauses.is_empty(),
                    "formula has neither clauses nor a value"
                );
                for (i, clause) in self.clauses.iter().enumerate() {
                    if i > 0 {
                        target.write_all(b"&")?;
                    }
                    for (j, lit) in clause.lits().iter().enumerate() {
                        if j > 0 {
                            target.write_all(b"|")?;
                        }
                        itoa::write(&mut *target, lit.to_dimacs())?;
                    }
                }
                Ok(())
            }
        }
    }

    /// The canonical text encoding as bytes.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.write_canonical(&mut buf);
        buf
    }

    /// The canonical text encoding as a string.
    pub fn canonical_string(&self) -> String {
        String::from_utf8_lossy(&self.canonical_bytes()).into_owned()
    }

    /// The formula's content address, memoized.
    pub fn id(&mut self) -> FormulaId {
        match self.cached_id {
            Some(id) => id,
            None => {
                let id = self.compute_id();
                self.cached_id = Some(id);
                id
            }
        }
    }

    /// The formula's content address, computed without touching the memo.
    pub fn compute_id(&self) -> FormulaId {
        FormulaId::of_bytes(&self.canonical_bytes())
    }
}

/// Convert any iterable of [`Lit`] iterables into a CnfFormula
impl<F, I, L> From<F> for CnfFormula
where
    F: IntoIterator<Item = I>,
    I: IntoIterator<Item = L>,
    Vec<Lit>: Extend<L>,
{
    fn from(formula: F) -> CnfFormula {
        let mut cnf_formula = CnfFormula::new();
        for clause in formula {
            cnf_formula.add_clause(clause);
        }
        cnf_formula
    }
}

/// Structural equality: terminal value and clause literals. Provenance bookkeeping is ignored.
impl PartialEq for CnfFormula {
    fn eq(&self, other: &CnfFormula) -> bool {
        self.value == other.value && self.clauses == other.clauses
    }
}

impl Eq for CnfFormula {}

impl fmt::Debug for CnfFormula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.value {
            Some(value) => write!(f, "{}", if value { "T" } else { "F" }),
            None => f.debug_list().entries(self.clauses.iter()).finish(),
        }
    }
}

/// The human-readable form: `(1 | -2)[1] & (3)[2]`, with each clause's input position in
/// brackets. Terminals render as `T` / `F`.
impl fmt::Display for CnfFormula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.value {
            Some(value) => write!(f, "{}", if value { "T" } else { "F" }),
            None => {
                for (i, clause) in self.clauses.iter().enumerate() {
                    if i > 0 {
                        write!(f, " & ")?;
                    }
                    write!(f, "(")?;
                    for (j, lit) in clause.lits().iter().enumerate() {
                        if j > 0 {
                            write!(f, " | ")?;
                        }
                        write!(f, "{}", lit)?;
                    }
                    write!(f, ")[{}]", clause.initial_index())?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(any(test, feature = "proptest-strategies"))]
#[doc(hidden)]
pub mod strategy {
    use super::*;

    use proptest::{collection::SizeRange, prelude::*, *};

    use crate::lit::strategy::lit;

    pub fn vec_formula(
        vars: impl Strategy<Value = usize>,
        clauses: impl Into<SizeRange>,
        clause_len: impl Into<SizeRange>,
    ) -> impl Strategy<Value = Vec<Vec<Lit>>> {
        let clauses = clauses.into();
        let clause_len = clause_len.into();

        // Not using ind_flat_map makes shrinking too expensive
        vars.prop_ind_flat_map(move |vars| {
            collection::vec(
                collection::vec(lit(0..vars), clause_len.clone()),
                clauses.clone(),
            )
        })
    }

    pub fn cnf_formula(
        vars: impl Strategy<Value = usize>,
        clauses: impl Into<SizeRange>,
        clause_len: impl Into<SizeRange>,
    ) -> impl Strategy<Value = CnfFormula> {
        vec_formula(vars, clauses, clause_len).prop_map(CnfFormula::from)
    }
}

#[cfg(test)]
mod tests {
    use super::{strategy::*, *};

    use proptest::*;

    #[test]
    fn tautological_input_collapses_to_true() {
        let formula = cnf_formula![1, -1;];
        assert_eq!(formula.value(), Some(true));
        assert_eq!(formula.len(), 0);
        assert_eq!(formula.canonical_string(), "T");
    }

    #[test]
    fn empty_clause_collapses_to_false() {
        let mut formula = CnfFormula::new();
        formula.add_clause(&[lit!(1), lit!(2)][..]);
        formula.add_clause(&[] as &[Lit]);
        assert_eq!(formula.value(), Some(false));
        assert_eq!(formula.canonical_string(), "F");
    }

    #[test]
    fn tautologies_are_dropped_but_consume_an_index() {
        let formula = cnf_formula![1, 2; 3, -3; 4;];
        assert_eq!(formula.len(), 2);
        let indices: Vec<u32> = formula.iter().map(|cl| cl.initial_index()).collect();
        assert_eq!(indices, vec![1, 3]);
    }

    #[test]
    fn canonical_encoding() {
        let formula = cnf_formula![1, -2; 3;];
        assert_eq!(formula.canonical_string(), "1|-2&3");
    }

    #[test]
    fn rename_assigns_names_in_first_appearance_order() {
        let mut formula = cnf_formula![5, 7; 11, -13;];
        formula.rename_vars();
        assert_eq!(formula.canonical_string(), "1|2&3|-4");
        let history: Vec<isize> = formula
            .final_names_map()
            .iter()
            .map(|v| v.to_dimacs())
            .collect();
        assert_eq!(history, vec![5, 7, 11, 13]);
    }

    #[test]
    fn rename_composes_history() {
        let mut formula = cnf_formula![5, 7; 11, -13;];
        formula.rename_vars();
        // a second rename round must keep the composed history intact
        formula.sort_clauses(false);
        formula.rename_vars();
        let history: Vec<isize> = formula
            .final_names_map()
            .iter()
            .map(|v| v.to_dimacs())
            .collect();
        assert_eq!(history, vec![5, 7, 11, 13]);
    }

    #[test]
    fn structural_twins_share_an_id() {
        let mut a = cnf_formula![1, 2; 3, 4;];
        let mut b = cnf_formula![5, 7; 11, 13;];
        a.assume_original_names();
        b.assume_original_names();
        a.to_lo_condition(Mode::Flo, false, false);
        b.to_lo_condition(Mode::Flo, false, false);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn terminal_ids_are_the_sentinels() {
        let mut formula = cnf_formula![1, -1;];
        assert_eq!(formula.id(), FormulaId::terminal(true));
        assert!(FormulaId::terminal(true).is_terminal());
        assert_ne!(FormulaId::terminal(true), FormulaId::terminal(false));
    }

    #[test]
    fn split_unit_chain() {
        let mut formula = cnf_formula![1; 2;];
        formula.assume_original_names();
        formula.to_lo_condition(Mode::Lou, false, false);

        let (left, right) = formula.evaluate();
        assert_eq!(right.value(), Some(false));
        assert_eq!(left.value(), None);
        assert_eq!(left.canonical_string(), "2");
        assert_eq!(
            left.evaluated_vars().get(&var!(1)),
            Some(&true),
            "left branch records pivot = true under its input name"
        );
        assert_eq!(right.evaluated_vars().get(&var!(1)), Some(&false));
    }

    #[test]
    fn split_keeps_provenance_through_renames() {
        // after canonicalization the pivot is a renamed variable; its recorded
        // assignment must use the input name
        let mut formula = cnf_formula![9, 4; -9, 4;];
        formula.assume_original_names();
        formula.to_lo_condition(Mode::Lou, false, false);
        assert_eq!(formula.canonical_string(), "1|2&-1|2");

        let (left, right) = formula.evaluate();
        assert_eq!(left.evaluated_vars().get(&var!(9)), Some(&true));
        assert_eq!(right.evaluated_vars().get(&var!(9)), Some(&false));

        // both remainders are the unit clause over input variable 4
        assert_eq!(left.canonical_string(), "2");
        assert_eq!(
            left.original_values().get(&var!(2)),
            Some(&var!(4)),
            "left remainder still names input variable 4"
        );
        assert_eq!(right.original_values().get(&var!(2)), Some(&var!(4)));
    }

    #[test]
    fn substitute_vars_reduces() {
        let mut formula = cnf_formula![1, 2; -1, 3; -2, -3;];
        let mut assignment = rustc_hash::FxHashMap::default();
        assignment.insert(var!(1), true);
        formula.substitute_vars(&assignment);
        assert_eq!(formula.canonical_string(), "3&-2|-3");

        assignment.clear();
        assignment.insert(var!(3), false);
        formula.substitute_vars(&assignment);
        assert_eq!(formula.value(), Some(false));
    }

    #[test]
    fn thief_method_orders_by_len_then_input_position() {
        let mut formula = cnf_formula![1, 2, 3; 4, 5; 6;];
        formula.to_lo_condition(Mode::Normal, false, true);
        let indices: Vec<u32> = formula.iter().map(|cl| cl.initial_index()).collect();
        assert_eq!(indices, vec![3, 2, 1]);
    }

    #[test]
    fn flop_groups_by_length() {
        let mut formula = cnf_formula![1, 2, 3; 2; 1, 3;];
        formula.to_lo_condition(Mode::Flop, false, false);
        assert!(formula.is_linearly_ordered(Mode::Flop, false));
        let lens: Vec<usize> = formula.iter().map(|cl| cl.len()).collect();
        assert_eq!(lens, vec![1, 2, 3]);
    }

    proptest! {
        #[test]
        fn canonicalization_is_idempotent(
            input in vec_formula(1..20usize, 1..30, 1..6),
            mode_index in 0..5usize,
            sort_by_size in proptest::bool::ANY,
        ) {
            let mode = [Mode::Normal, Mode::Lou, Mode::Lo, Mode::Flo, Mode::Flop][mode_index];
            let mut formula = CnfFormula::from(input.iter().map(|cl| cl.iter().cloned()));
            if formula.is_terminal() {
                return Ok(());
            }
            formula.assume_original_names();
            formula.to_lo_condition(mode, sort_by_size, false);
            let once = formula.clone();
            let id_once = formula.id();
            formula.to_lo_condition(mode, sort_by_size, false);
            prop_assert_eq!(&once, &formula);
            prop_assert_eq!(id_once, formula.id());
        }

        #[test]
        fn canonical_form_is_linearly_ordered(
            input in vec_formula(1..20usize, 1..30, 1..6),
            mode_index in 0..5usize,
        ) {
            let mode = [Mode::Normal, Mode::Lou, Mode::Lo, Mode::Flo, Mode::Flop][mode_index];
            let mut formula = CnfFormula::from(input.iter().map(|cl| cl.iter().cloned()));
            if formula.is_terminal() {
                return Ok(());
            }
            formula.assume_original_names();
            formula.to_lo_condition(mode, false, false);
            prop_assert!(formula.is_linearly_ordered(mode, false));
        }

        #[test]
        fn split_preserves_models(input in vec_formula(1..12usize, 1..20, 1..5)) {
            let mut formula = CnfFormula::from(input.iter().map(|cl| cl.iter().cloned()));
            if formula.is_terminal() || formula.is_empty() {
                return Ok(());
            }
            formula.assume_original_names();
            formula.to_lo_condition(Mode::Lou, false, false);

            let pivot = formula.pivot().unwrap();
            let (left, right) = formula.evaluate();

            // soundness and completeness of the split, checked against the parent by
            // exhaustive enumeration over the parent's variables
            let vars = formula.variables();
            for bits in 0..(1u32 << vars.len()) {
                let assignment: rustc_hash::FxHashMap<Var, bool> = vars
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| (v, bits & (1 << i) != 0))
                    .collect();

                let parent_sat = formula.iter().all(|cl| {
                    cl.lits()
                        .iter()
                        .any(|lit| assignment[&lit.var()] == lit.is_positive())
                });

                let child = if assignment[&pivot] { &left } else { &right };
                let child_sat = match child.value() {
                    Some(value) => value,
                    None => child.iter().all(|cl| {
                        cl.lits()
                            .iter()
                            .any(|lit| assignment[&lit.var()] == lit.is_positive())
                    }),
                };

                prop_assert_eq!(parent_sat, child_sat);
            }
        }
    }
}
