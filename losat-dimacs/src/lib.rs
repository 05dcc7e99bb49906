//! DIMACS CNF and single-line formula parsing for the losat SAT solver.

use std::{borrow::Borrow, io};

use losat_formula::{CnfFormula, Lit};

use anyhow::Error;
use thiserror::Error;

/// Largest magnitude accepted for a literal.
const MAX_LITERAL: i64 = i32::max_value() as i64;

/// Possible errors while parsing a formula.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error(
        "line {}: Unexpected character in DIMACS CNF input: '{}'",
        line,
        unexpected
    )]
    UnexpectedInput { line: usize, unexpected: char },
    #[error("line {}: Literal magnitude is too large: {}", line, literal)]
    LiteralTooLarge { line: usize, literal: String },
    #[error("line {}: Invalid header syntax: {}", line, header)]
    InvalidHeader { line: usize, header: String },
    #[error("line {}: Unterminated clause", line)]
    UnterminatedClause { line: usize },
    #[error(
        "Formula has {} variables while the header specifies {} variables",
        var_count,
        header_var_count
    )]
    VarCount {
        var_count: usize,
        header_var_count: usize,
    },
    #[error(
        "Formula has {} clauses while the header specifies {} clauses",
        clause_count,
        header_clause_count
    )]
    ClauseCount {
        clause_count: usize,
        header_clause_count: usize,
    },
    #[error("'{}' is not a literal", literal)]
    InvalidLiteral { literal: String },
    #[error("the input contains no clauses")]
    EmptyInput,
}

/// Variable and clause count present in a DIMACS CNF header.
#[derive(Copy, Clone, Debug)]
pub struct DimacsHeader {
    pub var_count: usize,
    pub clause_count: usize,
}

/// Parser for DIMACS CNF input.
///
/// Consumes the whole input at once; comments and an optional `p cnf` header are recognized and
/// the header's counts are checked against the parsed formula.
#[derive(Default)]
struct DimacsParser {
    formula: CnfFormula,
    partial_clause: Vec<Lit>,
    header: Option<DimacsHeader>,

    line_number: usize,
    clause_count: usize,
    var_count: usize,
}

impl DimacsParser {
    fn parse(&mut self, input: &[u8]) -> Result<(), ParserError> {
        self.line_number = 1;
        let mut pos = 0;

        while pos < input.len() {
            match input[pos] {
                b'\n' => {
                    self.line_number += 1;
                    pos += 1;
                }
                b' ' | b'\t' | b'\r' => pos += 1,
                // the newline is left in place so the main loop counts the line
                b'c' => pos = line_end(input, pos),
                b'p' => {
                    let end = line_end(input, pos);
                    self.parse_header(&input[pos..end])?;
                    pos = end;
                }
                b'-' | b'0'..=b'9' => {
                    let (literal, end) = self.parse_literal(input, pos)?;
                    match literal {
                        0 => self.end_clause(),
                        n => {
                            self.var_count = self.var_count.max(n.unsigned_abs() as usize);
                            self.partial_clause.push(Lit::from_dimacs(n as isize));
                        }
                    }
                    pos = end;
                }
                unexpected => {
                    return Err(ParserError::UnexpectedInput {
                        line: self.line_number,
                        unexpected: unexpected as char,
                    })
                }
            }
        }

        if !self.partial_clause.is_empty() {
            return Err(ParserError::UnterminatedClause {
                line: self.line_number,
            });
        }

        Ok(())
    }

    fn parse_literal(&mut self, input: &[u8], start: usize) -> Result<(i64, usize), ParserError> {
        let mut pos = start;
        let negative = input[pos] == b'-';
        if negative {
            pos += 1;
        }

        let digits_start = pos;
        let mut value: i64 = 0;
        while pos < input.len() && input[pos].is_ascii_digit() {
            value = value * 10 + (input[pos] - b'0') as i64;
            if value > MAX_LITERAL {
                return Err(ParserError::LiteralTooLarge {
                    line: self.line_number,
                    literal: String::from_utf8_lossy(&input[start..=pos]).into_owned(),
                });
            }
            pos += 1;
        }

        if pos == digits_start {
            return Err(ParserError::UnexpectedInput {
                line: self.line_number,
                unexpected: '-',
            });
        }

        Ok((if negative { -value } else { value }, pos))
    }

    fn parse_header(&mut self, line: &[u8]) -> Result<(), ParserError> {
        let header = String::from_utf8_lossy(line).trim_end().to_owned();
        let invalid = || ParserError::InvalidHeader {
            line: self.line_number,
            header: header.clone(),
        };

        let mut fields = header.split_ascii_whitespace();
        if fields.next() != Some("p") || fields.next() != Some("cnf") {
            return Err(invalid());
        }
        let var_count: usize = fields.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
        let clause_count: usize =
            fields.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
        if fields.next().is_some() {
            return Err(invalid());
        }

        self.header = Some(DimacsHeader {
            var_count,
            clause_count,
        });
        Ok(())
    }

    fn end_clause(&mut self) {
        self.clause_count += 1;
        let clause = std::mem::replace(&mut self.partial_clause, vec![]);
        self.formula.add_clause(clause);
    }

    fn check_header(&self) -> Result<(), ParserError> {
        if let Some(header) = self.header {
            if self.var_count != header.var_count {
                return Err(ParserError::VarCount {
                    var_count: self.var_count,
                    header_var_count: header.var_count,
                });
            }
            if self.clause_count != header.clause_count {
                return Err(ParserError::ClauseCount {
                    clause_count: self.clause_count,
                    header_clause_count: header.clause_count,
                });
            }
        }
        Ok(())
    }
}

fn line_end(input: &[u8], pos: usize) -> usize {
    input[pos..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|offset| pos + offset)
        .unwrap_or(input.len())
}

/// Parse DIMACS CNF input and check the header if present.
pub fn parse_dimacs(input: impl io::Read) -> Result<CnfFormula, Error> {
    use io::Read;

    let mut bytes = vec![];
    let mut input = input;
    input.read_to_end(&mut bytes)?;

    let mut parser = DimacsParser::default();
    parser.parse(&bytes)?;
    parser.check_header()?;

    Ok(parser.formula)
}

/// Parse the single-line formula format.
///
/// Clauses are separated by `&`, literals within a clause by `|`; literals are signed decimal
/// integers and parentheses are ignored: `(1|-2)&(3)` and `1|-2&3` denote the same formula.
pub fn parse_line(input: &str) -> Result<CnfFormula, ParserError> {
    let stripped: String = input
        .chars()
        .filter(|&c| c != '(' && c != ')' && !c.is_whitespace())
        .collect();

    if stripped.is_empty() {
        return Err(ParserError::EmptyInput);
    }

    let mut formula = CnfFormula::new();
    for clause_text in stripped.split('&') {
        let mut clause = vec![];
        for literal_text in clause_text.split('|') {
            let value: i64 = literal_text.parse().map_err(|_| ParserError::InvalidLiteral {
                literal: literal_text.to_owned(),
            })?;
            if value == 0 || value.abs() > MAX_LITERAL {
                return Err(ParserError::InvalidLiteral {
                    literal: literal_text.to_owned(),
                });
            }
            clause.push(Lit::from_dimacs(value as isize));
        }
        formula.add_clause(clause);
    }

    Ok(formula)
}

/// Write a DIMACS CNF header.
pub fn write_dimacs_header(target: &mut impl io::Write, header: DimacsHeader) -> io::Result<()> {
    writeln!(
        target,
        "p cnf {var_count} {clause_count}",
        var_count = header.var_count,
        clause_count = header.clause_count
    )
}

/// Write an iterator of clauses as headerless DIMACS CNF.
///
/// Can be used with [`write_dimacs_header`] to implement incremental writing.
pub fn write_dimacs_clauses(
    target: &mut impl io::Write,
    clauses: impl IntoIterator<Item = impl IntoIterator<Item = impl Borrow<Lit>>>,
) -> io::Result<()> {
    for clause in clauses.into_iter() {
        for lit in clause.into_iter() {
            itoa::write(&mut *target, lit.borrow().to_dimacs())?;
            target.write_all(b" ")?;
        }
        target.write_all(b"0\n")?;
    }
    Ok(())
}

/// Write a formula as DIMACS CNF.
pub fn write_dimacs(target: &mut impl io::Write, formula: &CnfFormula) -> io::Result<()> {
    let var_count = formula
        .variables()
        .last()
        .map(|var| var.to_dimacs() as usize)
        .unwrap_or(0);

    match formula.value() {
        Some(true) => write_dimacs_header(
            &mut *target,
            DimacsHeader {
                var_count: 0,
                clause_count: 0,
            },
        ),
        Some(false) => {
            write_dimacs_header(
                &mut *target,
                DimacsHeader {
                    var_count: 0,
                    clause_count: 1,
                },
            )?;
            target.write_all(b"0\n")
        }
        None => {
            write_dimacs_header(
                &mut *target,
                DimacsHeader {
                    var_count,
                    clause_count: formula.len(),
                },
            )?;
            write_dimacs_clauses(&mut *target, formula.iter().map(|clause| clause.lits()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use losat_formula::{cnf_formula, lits};
    use proptest::prelude::*;

    use losat_formula::cnf::strategy::vec_formula;

    #[test]
    fn parse_simple_dimacs() {
        let input = b"c a comment\np cnf 3 2\n1 -2 0\n2 3 0\n";
        let formula = parse_dimacs(&input[..]).unwrap();
        assert_eq!(formula, cnf_formula![1, -2; 2, 3;]);
    }

    #[test]
    fn parse_multiline_clause() {
        let input = b"1 2\n-3 0\n";
        let formula = parse_dimacs(&input[..]).unwrap();
        assert_eq!(formula, cnf_formula![1, 2, -3;]);
    }

    #[test]
    fn rejects_unexpected_character() {
        let input = b"p cnf 1 1\n1 x 0\n";
        let err = parse_dimacs(&input[..]).unwrap_err();
        match err.downcast_ref::<ParserError>() {
            Some(ParserError::UnexpectedInput { line: 2, unexpected: 'x' }) => (),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn rejects_unterminated_clause() {
        let input = b"p cnf 2 1\n1 2\n";
        let err = parse_dimacs(&input[..]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ParserError>(),
            Some(ParserError::UnterminatedClause { .. })
        ));
    }

    #[test]
    fn rejects_header_mismatch() {
        let input = b"p cnf 2 5\n1 2 0\n";
        let err = parse_dimacs(&input[..]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ParserError>(),
            Some(ParserError::ClauseCount {
                clause_count: 1,
                header_clause_count: 5
            })
        ));

        let input = b"p cnf 1 1\n1 2 0\n";
        let err = parse_dimacs(&input[..]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ParserError>(),
            Some(ParserError::VarCount {
                var_count: 2,
                header_var_count: 1
            })
        ));

        // a header that overstates the variable count is rejected too
        let input = b"p cnf 999 1\n1 2 0\n";
        let err = parse_dimacs(&input[..]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ParserError>(),
            Some(ParserError::VarCount {
                var_count: 2,
                header_var_count: 999
            })
        ));
    }

    #[test]
    fn rejects_bad_header() {
        for &input in &[&b"p dnf 1 1\n"[..], b"p cnf one 1\n", b"p cnf 1\n"] {
            let err = parse_dimacs(input).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ParserError>(),
                Some(ParserError::InvalidHeader { .. })
            ));
        }
    }

    #[test]
    fn parse_line_format() {
        let formula = parse_line("1|-2&3").unwrap();
        assert_eq!(formula, cnf_formula![1, -2; 3;]);

        let with_parens = parse_line("(1 | -2) & (3)").unwrap();
        assert_eq!(with_parens, formula);
    }

    #[test]
    fn parse_line_drops_duplicates_and_tautologies() {
        let formula = parse_line("1|1|2&3|-3").unwrap();
        assert_eq!(formula, cnf_formula![1, 2;]);
    }

    #[test]
    fn parse_line_rejects_garbage() {
        for input in &["", "1|&2", "1|x", "0", "1&2|"] {
            match parse_line(input) {
                Err(ParserError::InvalidLiteral { .. }) | Err(ParserError::EmptyInput) => (),
                other => panic!("expected an error for {:?}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn write_simple_dimacs() {
        let formula = CnfFormula::from(vec![lits![1, 2, -3].to_vec(), lits![-1].to_vec()]);
        let mut output = vec![];
        write_dimacs(&mut output, &formula).unwrap();
        assert_eq!(&output[..], &b"p cnf 3 2\n1 2 -3 0\n-1 0\n"[..]);
    }

    proptest! {
        #[test]
        fn roundtrip_through_dimacs(input in vec_formula(1..100usize, 1..100, 1..10)) {
            let formula = CnfFormula::from(input);
            if formula.is_terminal() {
                // a terminal formula has no clause body to roundtrip
                return Ok(());
            }
            let mut written = vec![];
            write_dimacs(&mut written, &formula).unwrap();
            let parsed = parse_dimacs(&written[..]).unwrap();
            prop_assert_eq!(formula, parsed);
        }
    }
}
