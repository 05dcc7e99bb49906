//! Literals and variables.
use std::{cmp::Ordering, fmt, ops};

/// A boolean variable.
///
/// Variables are identified by a 1-based positive name, the same convention used by the DIMACS CNF
/// format. Canonicalization renames variables so that the names of a formula in linearly ordered
/// form are exactly `1..=n`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Var {
    name: u32,
}

impl Var {
    /// Creates a variable from a 1-based name as used in the DIMACS CNF encoding.
    ///
    /// The parameter must be positive.
    #[inline]
    pub fn from_dimacs(number: isize) -> Var {
        debug_assert!(number > 0);
        Var {
            name: number as u32,
        }
    }

    /// Creates a variable from a 0-based index.
    #[inline]
    pub fn from_index(index: usize) -> Var {
        Var {
            name: (index + 1) as u32,
        }
    }

    /// The 1-based name representing this variable in the DIMACS CNF encoding.
    #[inline]
    pub fn to_dimacs(self) -> isize {
        self.name as isize
    }

    /// The 0-based index of this variable.
    ///
    /// Positional maps (e.g. the rename history of a formula) are indexed by this.
    #[inline]
    pub const fn index(self) -> usize {
        (self.name - 1) as usize
    }

    /// Creates a literal from this var and a `bool` that is `true` when the literal is positive.
    ///
    /// Shortcut for `Lit::from_var(var, polarity)`.
    #[inline]
    pub fn lit(self, polarity: bool) -> Lit {
        Lit::from_var(self, polarity)
    }

    /// Creates a positive literal from this var.
    #[inline]
    pub fn positive(self) -> Lit {
        Lit::from_var(self, true)
    }

    /// Creates a negative literal from this var.
    #[inline]
    pub fn negative(self) -> Lit {
        Lit::from_var(self, false)
    }
}

/// Uses the 1-based DIMACS CNF encoding.
impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

/// Uses the 1-based DIMACS CNF encoding.
impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A boolean literal.
///
/// A literal is a variable or the negation of a variable.
///
/// Internally a literal is stored as a nonzero signed integer whose magnitude is the variable's
/// name and whose sign is the literal's polarity, exactly the DIMACS CNF convention.
///
/// The derived order is *not* used for sorting; literals inside a clause are ordered by
/// [`Lit::cmp`], which compares variables ascending and puts the positive literal before the
/// negative one of the same variable.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Lit {
    code: i32,
}

impl Lit {
    /// Creates a literal from a `Var` and a `bool` that is `true` when the literal is positive.
    #[inline]
    pub fn from_var(var: Var, polarity: bool) -> Lit {
        Lit {
            code: if polarity {
                var.name as i32
            } else {
                -(var.name as i32)
            },
        }
    }

    /// Create a positive literal from a `Var`.
    #[inline]
    pub fn positive(var: Var) -> Lit {
        Lit::from_var(var, true)
    }

    /// Create a negative literal from a `Var`.
    #[inline]
    pub fn negative(var: Var) -> Lit {
        Lit::from_var(var, false)
    }

    /// Create a literal from a 0-based variable index and a `bool` that is `true` when the literal
    /// is positive.
    #[inline]
    pub fn from_index(index: usize, polarity: bool) -> Lit {
        Lit::from_var(Var::from_index(index), polarity)
    }

    /// Creates a literal from a nonzero integer.
    ///
    /// The absolute value is used as 1-based variable name, the sign of the integer is used as
    /// sign of the literal.
    #[inline]
    pub fn from_dimacs(number: isize) -> Lit {
        debug_assert!(number != 0);
        Lit {
            code: number as i32,
        }
    }

    /// Integer representation of the literal, opposite of `from_dimacs`.
    #[inline]
    pub fn to_dimacs(self) -> isize {
        self.code as isize
    }

    /// The literal's variable.
    #[inline]
    pub fn var(self) -> Var {
        Var {
            name: self.code.unsigned_abs(),
        }
    }

    /// 0-based index of the literal's _variable_.
    #[inline]
    pub fn index(self) -> usize {
        self.var().index()
    }

    /// Whether the literal is negative, i.e. a negated variable.
    #[inline]
    pub fn is_negative(self) -> bool {
        self.code < 0
    }

    /// Whether the literal is positive, i.e. a non-negated variable.
    #[inline]
    pub fn is_positive(self) -> bool {
        self.code > 0
    }

    /// Replaces the literal's variable, keeping the polarity.
    #[inline]
    pub fn with_var(self, var: Var) -> Lit {
        Lit::from_var(var, self.is_positive())
    }
}

/// Variables ascending, positive literal before the negative one of the same variable.
impl Ord for Lit {
    #[inline]
    fn cmp(&self, other: &Lit) -> Ordering {
        (self.var(), self.is_negative()).cmp(&(other.var(), other.is_negative()))
    }
}

impl PartialOrd for Lit {
    #[inline]
    fn partial_cmp(&self, other: &Lit) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl ops::Not for Lit {
    type Output = Lit;

    #[inline]
    fn not(self) -> Lit {
        Lit { code: -self.code }
    }
}

impl ops::BitXor<bool> for Lit {
    type Output = Lit;

    #[inline]
    fn bitxor(self, rhs: bool) -> Lit {
        if rhs {
            !self
        } else {
            self
        }
    }
}

impl From<Var> for Lit {
    #[inline]
    fn from(var: Var) -> Lit {
        Lit::positive(var)
    }
}

/// Uses the 1-based DIMACS CNF encoding.
impl fmt::Debug for Lit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

/// Uses the 1-based DIMACS CNF encoding.
impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(any(test, feature = "proptest-strategies"))]
#[doc(hidden)]
pub mod strategy {
    use super::*;
    use proptest::{prelude::*, *};

    pub fn var(index: impl Strategy<Value = usize>) -> impl Strategy<Value = Var> {
        index.prop_map(Var::from_index)
    }

    pub fn lit(index: impl Strategy<Value = usize>) -> impl Strategy<Value = Lit> {
        (var(index), bool::ANY).prop_map(|(var, polarity)| var.lit(polarity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lit_roundtrip() {
        for &number in &[1isize, -1, 5, -17, 42] {
            let lit = Lit::from_dimacs(number);
            assert_eq!(lit.to_dimacs(), number);
            assert_eq!(lit.var().to_dimacs(), number.abs());
            assert_eq!(lit.is_positive(), number > 0);
            assert_eq!((!lit).to_dimacs(), -number);
        }
    }

    #[test]
    fn lit_order() {
        let mut lits = vec![
            Lit::from_dimacs(-3),
            Lit::from_dimacs(2),
            Lit::from_dimacs(-1),
            Lit::from_dimacs(3),
            Lit::from_dimacs(1),
        ];
        lits.sort();
        let sorted: Vec<isize> = lits.iter().map(|l| l.to_dimacs()).collect();
        assert_eq!(sorted, vec![1, -1, 2, 3, -3]);
    }
}
