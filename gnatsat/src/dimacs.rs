/*****************************************************************************************[dimacs.rs]
Copyright (c) 2003-2010, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2018-2018, Masaki Hara
Copyright (c) 2020, Stephan Brumme (microsat-cpp)

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

//! DIMACS CNF reading and writing.
//!
//! The reader is generic over [`SolverInterface`], so the same code can
//! feed a solver or a [`CnfWriter`]. Comment lines are skipped wherever
//! they appear, before and between clauses alike.

use {
    crate::interface::SolverInterface,
    crate::{Error, Result},
    std::io::{self, BufRead, Write},
};

/// The `p cnf <vars> <clauses>` problem line.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub n_vars: u32,
    pub n_clauses: u64,
}

/// Read the problem header, skipping any leading comment lines.
///
/// Fails with `Error::Parse` when the header is missing, malformed, or
/// declares zero variables or zero clauses.
pub fn parse_header<R: BufRead>(input: &mut R) -> Result<Header> {
    loop {
        skip_whitespace(input)?;
        match next_byte(input)? {
            Some(b'c') => skip_line(input)?,
            _ => break,
        }
    }
    let mut marker = [0; 5];
    input.read_exact(&mut marker).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::Parse("missing `p cnf` header".into())
        } else {
            Error::Io(e)
        }
    })?;
    if &marker != b"p cnf" {
        return Err(Error::Parse("expected `p cnf` header".into()));
    }
    let n_vars = parse_int(input)?;
    let n_clauses = parse_int(input)?;
    if n_vars <= 0 || n_clauses <= 0 {
        return Err(Error::Parse(
            "header must declare at least one variable and one clause".into(),
        ));
    }
    Ok(Header {
        n_vars: n_vars as u32,
        n_clauses: n_clauses as u64,
    })
}

/// Read the clauses following the header into `solver`.
///
/// `is_strict` additionally verifies the clause count declared in the
/// header.
pub fn parse_body<R: BufRead, S: SolverInterface>(
    input: &mut R,
    solver: &mut S,
    header: &Header,
    is_strict: bool,
) -> Result<()> {
    let mut lits = vec![];
    let mut num_read: u64 = 0;
    loop {
        skip_whitespace(input)?;
        match next_byte(input)? {
            None => break,
            Some(b'c') => skip_line(input)?,
            Some(_) => {
                read_clause(input, &mut lits)?;
                solver.add_clause(&lits)?;
                num_read += 1;
            }
        }
    }
    if is_strict && num_read != header.n_clauses {
        return Err(Error::Parse(format!(
            "header declares {} clauses but {} were read",
            header.n_clauses, num_read
        )));
    }
    Ok(())
}

/// Parse a whole file: header first, then clauses into the solver built
/// by `mk_solver` from the declared variable count.
pub fn parse<R: BufRead, S: SolverInterface, F: FnOnce(Header) -> S>(
    input: &mut R,
    mk_solver: F,
    is_strict: bool,
) -> Result<S> {
    let header = parse_header(input)?;
    let mut solver = mk_solver(header);
    parse_body(input, &mut solver, &header, is_strict)?;
    Ok(solver)
}

fn read_clause<R: BufRead>(input: &mut R, lits: &mut Vec<i32>) -> Result<()> {
    lits.clear();
    loop {
        let parsed_lit = parse_int(input)?;
        if parsed_lit == 0 {
            return Ok(());
        }
        lits.push(parsed_lit);
    }
}

fn parse_int<R: BufRead>(input: &mut R) -> Result<i32> {
    skip_whitespace(input)?;
    let ch = next_byte(input)?;
    let neg = if ch == Some(b'+') || ch == Some(b'-') {
        input.consume(1);
        ch == Some(b'-')
    } else {
        false
    };
    match next_byte(input)? {
        Some(ch) if ch.is_ascii_digit() => {}
        Some(ch) => {
            return Err(Error::Parse(format!(
                "unexpected character `{}`",
                ch as char
            )))
        }
        None => return Err(Error::Parse("unexpected end of file".into())),
    }
    let mut val = 0i32;
    while let Some(ch) = next_byte(input)? {
        if !ch.is_ascii_digit() {
            break;
        }
        input.consume(1);
        val = val * 10 + (ch - b'0') as i32;
    }
    Ok(if neg { -val } else { val })
}

#[inline(always)]
fn is_whitespace(ch: Option<u8>) -> bool {
    ch.map(|ch| (b'\x09'..=b'\x0d').contains(&ch) || ch == b' ')
        .unwrap_or(false)
}

fn skip_whitespace<R: BufRead>(input: &mut R) -> Result<()> {
    while is_whitespace(next_byte(input)?) {
        input.consume(1);
    }
    Ok(())
}

fn skip_line<R: BufRead>(input: &mut R) -> Result<()> {
    loop {
        if let Some(ch) = next_byte(input)? {
            input.consume(1);
            if ch == b'\n' {
                return Ok(());
            }
        } else {
            return Ok(());
        }
    }
}

fn next_byte<R: BufRead>(input: &mut R) -> Result<Option<u8>> {
    Ok(input.fill_buf()?.first().copied())
}

/// Collects clauses through the same interface as a solver and emits them
/// as a DIMACS CNF file. Handy for converting an encoding to a file, and
/// as the inverse of the reader in round-trip tests.
pub struct CnfWriter {
    n_vars: u32,
    clauses: Vec<Vec<i32>>,
}

impl CnfWriter {
    pub fn new(n_vars: u32) -> Self {
        Self {
            n_vars,
            clauses: vec![],
        }
    }

    pub fn n_clauses(&self) -> usize {
        self.clauses.len()
    }

    /// Emit a comment line, the header and one clause per line.
    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "c generated by gnatsat")?;
        writeln!(out, "p cnf {} {}", self.n_vars, self.clauses.len())?;
        for clause in &self.clauses {
            for &l in clause {
                write!(out, "{} ", l)?;
            }
            writeln!(out, "0")?;
        }
        Ok(())
    }
}

impl SolverInterface for CnfWriter {
    fn num_vars(&self) -> u32 {
        self.n_vars
    }
    fn is_ok(&self) -> bool {
        true
    }
    fn add_clause(&mut self, lits: &[i32]) -> Result<()> {
        let mut lits = lits;
        if let Some((&0, rest)) = lits.split_last() {
            lits = rest;
        }
        for &l in lits {
            if l == 0 {
                return Err(Error::InvalidInput("zero literal inside clause".into()));
            }
            if l.unsigned_abs() > self.n_vars {
                return Err(Error::InvalidInput(format!(
                    "variable {} beyond declared maximum {}",
                    l.unsigned_abs(),
                    self.n_vars
                )));
            }
        }
        self.clauses.push(lits.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_after_comments() {
        let mut input = Cursor::new(b"c one\nc two\np cnf 3 2\n1 2 0 -3 0\n" as &[u8]);
        let h = parse_header(&mut input).unwrap();
        assert_eq!(h.n_vars, 3);
        assert_eq!(h.n_clauses, 2);
    }

    #[test]
    fn header_missing() {
        let mut input = Cursor::new(b"1 2 0\n" as &[u8]);
        assert!(matches!(parse_header(&mut input), Err(Error::Parse(_))));
    }

    #[test]
    fn header_zero_counts() {
        for src in &["p cnf 0 2\n", "p cnf 3 0\n"] {
            let mut input = Cursor::new(src.as_bytes());
            assert!(matches!(parse_header(&mut input), Err(Error::Parse(_))));
        }
    }

    #[test]
    fn body_into_writer() {
        let mut input = Cursor::new(b"p cnf 3 2\n1 -2 0\nc interleaved\n2 3 0\n" as &[u8]);
        let w = parse(&mut input, |h| CnfWriter::new(h.n_vars), true).unwrap();
        assert_eq!(w.n_clauses(), 2);
        let mut out = vec![];
        w.write(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("p cnf 3 2"));
        assert!(text.ends_with("2 3 0\n"));
    }

    #[test]
    fn strict_clause_count() {
        let mut input = Cursor::new(b"p cnf 2 3\n1 0 2 0\n" as &[u8]);
        let res = parse(&mut input, |h| CnfWriter::new(h.n_vars), true);
        assert!(matches!(res, Err(Error::Parse(_))));
    }

    #[test]
    fn rejects_non_integer_token() {
        let mut input = Cursor::new(b"p cnf 2 1\n1 x 0\n" as &[u8]);
        let res = parse(&mut input, |h| CnfWriter::new(h.n_vars), false);
        assert!(matches!(res, Err(Error::Parse(_))));
    }
}
