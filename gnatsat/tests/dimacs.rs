use gnatsat::{dimacs, BasicSolver, CnfWriter, Error, SolverInterface};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::io::Cursor;

const MEM: u32 = 1 << 20;

fn write_to_string(w: &CnfWriter) -> String {
    let mut out = vec![];
    w.write(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn write_then_read_then_solve() {
    let clauses: Vec<Vec<i32>> = vec![vec![1, 2, 3], vec![-1, -2], vec![-2, -3], vec![-1, -3]];
    let mut w = CnfWriter::new(3);
    for c in &clauses {
        w.add_clause(c).unwrap();
    }
    let text = write_to_string(&w);

    let mut input = Cursor::new(text.into_bytes());
    let mut solver = dimacs::parse(
        &mut input,
        |h| BasicSolver::with_capacity(h.n_vars, MEM),
        true,
    )
    .unwrap();
    assert_eq!(solver.solve().unwrap(), true);
    assert!(clauses
        .iter()
        .all(|c| c.iter().any(|&l| solver.query(l.unsigned_abs()) == (l > 0))));
}

#[test]
fn roundtrip_preserves_clause_sets() {
    let mut rng = StdRng::seed_from_u64(0xd1fac5);
    for _ in 0..50 {
        let n_vars = rng.gen_range(1..=12u32);
        let n_clauses = rng.gen_range(1..=20);
        let clauses: Vec<Vec<i32>> = (0..n_clauses)
            .map(|_| {
                (0..rng.gen_range(1..=4))
                    .map(|_| {
                        let v = rng.gen_range(1..=n_vars) as i32;
                        if rng.gen_bool(0.5) {
                            v
                        } else {
                            -v
                        }
                    })
                    .collect()
            })
            .collect();

        let mut w = CnfWriter::new(n_vars);
        for c in &clauses {
            w.add_clause(c).unwrap();
        }
        let text = write_to_string(&w);

        let mut input = Cursor::new(text.into_bytes());
        let w2 = dimacs::parse(&mut input, |h| CnfWriter::new(h.n_vars), true).unwrap();
        assert_eq!(w2.num_vars(), n_vars);
        // the reader is an exact inverse of the writer
        assert_eq!(write_to_string(&w), write_to_string(&w2));
    }
}

#[test]
fn reader_rejects_out_of_range_literal() {
    let mut input = Cursor::new(b"p cnf 2 1\n3 -1 0\n" as &[u8]);
    let res = dimacs::parse(
        &mut input,
        |h| BasicSolver::with_capacity(h.n_vars, MEM),
        false,
    );
    assert!(matches!(res, Err(Error::InvalidInput(_))));
}

#[test]
fn reader_solves_a_simple_file() {
    let src = b"c a tiny instance\np cnf 4 4\n1 0\n-1 2 0\n-2 3 0\n-3 4 0\n";
    let mut input = Cursor::new(src as &[u8]);
    let mut solver = dimacs::parse(
        &mut input,
        |h| BasicSolver::with_capacity(h.n_vars, MEM),
        true,
    )
    .unwrap();
    assert_eq!(solver.solve().unwrap(), true);
    for v in 1..=4 {
        assert!(solver.query(v));
    }
}

#[test]
fn comments_between_clauses_are_tolerated() {
    let src = b"p cnf 2 2\n1 0\nc wedged in the middle\n-1 2 0\n";
    let mut input = Cursor::new(src as &[u8]);
    let mut solver = dimacs::parse(
        &mut input,
        |h| BasicSolver::with_capacity(h.n_vars, MEM),
        true,
    )
    .unwrap();
    assert_eq!(solver.solve().unwrap(), true);
    assert!(solver.query(1));
    assert!(solver.query(2));
}
