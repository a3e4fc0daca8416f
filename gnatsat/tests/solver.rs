use gnatsat::{lbool, BasicSolver, Callbacks, Error, Lit, Solver, SolverOpts};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;

const MEM: u32 = 1 << 20;

fn solver(n_vars: u32) -> BasicSolver {
    BasicSolver::with_capacity(n_vars, MEM)
}

fn add_all(s: &mut BasicSolver, clauses: &[Vec<i32>]) {
    for c in clauses {
        s.add_clause(c).unwrap();
    }
}

/// Evaluate `clauses` under the assignment encoded by bitmask `m`
/// (bit `v-1` set means variable `v` is true).
fn assignment_satisfies(m: u32, clauses: &[Vec<i32>]) -> bool {
    clauses.iter().all(|c| {
        c.iter().any(|&l| {
            let bit = (m >> (l.unsigned_abs() - 1)) & 1 == 1;
            if l > 0 {
                bit
            } else {
                !bit
            }
        })
    })
}

fn brute_force_count(n_vars: u32, clauses: &[Vec<i32>]) -> u64 {
    (0u32..1 << n_vars)
        .filter(|&m| assignment_satisfies(m, clauses))
        .count() as u64
}

fn model_satisfies(s: &BasicSolver, clauses: &[Vec<i32>]) -> bool {
    clauses
        .iter()
        .all(|c| c.iter().any(|&l| s.query(l.unsigned_abs()) == (l > 0)))
}

/// Pigeonhole principle: `pigeons` pigeons into `holes` holes, no sharing.
/// Unsatisfiable whenever `pigeons > holes`.
fn pigeonhole(pigeons: u32, holes: u32) -> (u32, Vec<Vec<i32>>) {
    let var = |p: u32, h: u32| (p * holes + h + 1) as i32;
    let mut clauses = vec![];
    for p in 0..pigeons {
        clauses.push((0..holes).map(|h| var(p, h)).collect());
    }
    for h in 0..holes {
        for p1 in 0..pigeons {
            for p2 in p1 + 1..pigeons {
                clauses.push(vec![-var(p1, h), -var(p2, h)]);
            }
        }
    }
    (pigeons * holes, clauses)
}

fn random_formula(rng: &mut StdRng, n_vars: u32) -> Vec<Vec<i32>> {
    let n_clauses = rng.gen_range(n_vars..=4 * n_vars);
    (0..n_clauses)
        .map(|_| {
            let len = rng.gen_range(1..=3);
            (0..len)
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
        .collect()
}

#[test]
fn trivial_sat() {
    let mut s = solver(1);
    s.add_clause(&[1]).unwrap();
    assert_eq!(s.solve().unwrap(), true);
    assert!(s.query(1));
}

#[test]
fn trivial_unsat() {
    let mut s = solver(1);
    s.add_clause(&[1]).unwrap();
    s.add_clause(&[-1]).unwrap();
    assert_eq!(s.solve().unwrap(), false);
    assert!(!s.is_ok());
    // the verdict is permanent
    assert_eq!(s.solve().unwrap(), false);
}

#[test]
fn three_sat_satisfiable() {
    let clauses: Vec<Vec<i32>> = vec![vec![1, 2, 3], vec![-1, -2], vec![-2, -3], vec![-1, -3]];
    let mut s = solver(3);
    add_all(&mut s, &clauses);
    assert_eq!(s.solve().unwrap(), true);
    assert!(model_satisfies(&s, &clauses));
    // at most one variable may be false... and at most one may be true
    let n_true = (1..=3).filter(|&v| s.query(v)).count();
    assert_eq!(n_true, 1);
}

#[test]
fn pigeonhole_unsat() {
    let (n, clauses) = pigeonhole(3, 2);
    let mut s = solver(n);
    add_all(&mut s, &clauses);
    assert_eq!(s.solve().unwrap(), false);
}

#[test]
fn unit_propagation_chain() {
    let mut s = solver(4);
    add_all(
        &mut s,
        &[vec![1], vec![-1, 2], vec![-2, 3], vec![-3, 4]],
    );
    assert_eq!(s.solve().unwrap(), true);
    for v in 1..=4 {
        assert!(s.query(v), "variable {} should be forced true", v);
    }
}

#[test]
fn duplicate_unit_is_idempotent() {
    let mut s = solver(2);
    s.add_clause(&[1]).unwrap();
    s.add_clause(&[1]).unwrap();
    s.add_clause(&[-1, 2]).unwrap();
    assert_eq!(s.solve().unwrap(), true);
    assert!(s.query(1));
    assert!(s.query(2));
}

#[test]
fn duplicate_literals_collapse_and_tautologies_vanish() {
    let mut s = solver(2);
    s.add_clause(&[1, 1, 1]).unwrap();
    s.add_clause(&[2, -2]).unwrap(); // tautology, dropped
    s.add_clause(&[-1, 2, 2]).unwrap();
    assert_eq!(s.solve().unwrap(), true);
    assert!(s.query(1));
    assert!(s.query(2));
}

#[test]
fn empty_clause_is_permanent_unsat() {
    let mut s = solver(2);
    s.add_clause(&[1]).unwrap();
    s.add_clause(&[]).unwrap();
    assert!(!s.is_ok());
    assert_eq!(s.solve().unwrap(), false);
}

#[test]
fn contradictory_units_are_permanent_unsat() {
    let mut s = solver(3);
    s.add_clause(&[2]).unwrap();
    s.add_clause(&[-2]).unwrap();
    assert!(!s.is_ok());
    assert_eq!(s.solve().unwrap(), false);
}

#[test]
fn trailing_zero_sentinel_tolerated() {
    let mut s = solver(2);
    s.add_clause(&[1, -2, 0]).unwrap();
    s.add_clause(&[2, 0]).unwrap();
    assert_eq!(s.solve().unwrap(), true);
    assert!(s.query(1));
    assert!(s.query(2));
}

#[test]
fn zero_inside_clause_rejected() {
    let mut s = solver(2);
    let res = s.add_clause(&[1, 0, 2]);
    assert!(matches!(res, Err(Error::InvalidInput(_))));
    // the failed add must not corrupt the instance
    s.add_clause(&[1]).unwrap();
    assert_eq!(s.solve().unwrap(), true);
}

#[test]
fn out_of_range_variable_rejected() {
    let mut s = solver(2);
    assert!(matches!(
        s.add_clause(&[1, 3]),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(s.add_clause(&[-4]), Err(Error::InvalidInput(_))));
}

#[test]
fn query_is_conservative_out_of_range() {
    let mut s = solver(2);
    s.add_clause(&[1]).unwrap();
    assert_eq!(s.solve().unwrap(), true);
    assert!(!s.query(0));
    assert!(!s.query(99));
}

#[test]
fn tiny_arena_reports_out_of_memory() {
    let mut s = BasicSolver::with_capacity(3, 4);
    let res = s.add_clause(&[1, 2, 3]);
    assert!(matches!(res, Err(Error::OutOfMemory)));
    // the instance is retired
    assert!(matches!(s.solve(), Err(Error::OutOfMemory)));
}

#[test]
fn conflict_budget_yields_indeterminate() {
    let (n, clauses) = pigeonhole(5, 4);
    let mut s = solver(n);
    add_all(&mut s, &clauses);
    s.set_conflict_budget(1);
    assert_eq!(s.solve_limited().unwrap(), lbool::UNDEF);
    // lifting the budget finishes the proof
    s.set_conflict_budget(-1);
    assert_eq!(s.solve_limited().unwrap(), lbool::FALSE);
}

#[test]
fn geometric_restarts_agree() {
    let (n, clauses) = pigeonhole(4, 3);
    let mut opts = SolverOpts::default();
    opts.luby_restart = false;
    opts.restart_inc = 1.5;
    opts.restart_first = 10;
    let mut s: BasicSolver = Solver::new(n, MEM, opts, Default::default());
    add_all(&mut s, &clauses);
    assert_eq!(s.solve().unwrap(), false);
}

#[test]
fn solver_agrees_with_brute_force() {
    let mut rng = StdRng::seed_from_u64(0xfeed);
    for round in 0..300 {
        let n_vars = rng.gen_range(3..=8);
        let clauses = random_formula(&mut rng, n_vars);
        let expected = brute_force_count(n_vars, &clauses) > 0;
        let mut s = solver(n_vars);
        add_all(&mut s, &clauses);
        let got = s.solve().unwrap();
        assert_eq!(
            got, expected,
            "round {}: solver disagrees with brute force on {:?}",
            round, clauses
        );
        if got {
            assert!(
                model_satisfies(&s, &clauses),
                "round {}: model does not satisfy {:?}",
                round,
                clauses
            );
        }
    }
}

#[test]
fn identical_inputs_give_identical_models() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..50 {
        let n_vars = rng.gen_range(4..=10);
        let clauses = random_formula(&mut rng, n_vars);
        let run = |clauses: &[Vec<i32>]| {
            let mut s = solver(n_vars);
            add_all(&mut s, clauses);
            let sat = s.solve().unwrap();
            (sat, (1..=n_vars).map(|v| s.query(v)).collect::<Vec<_>>())
        };
        assert_eq!(run(&clauses), run(&clauses));
    }
}

#[test]
fn blocking_clauses_enumerate_all_models() {
    let n_vars = 4;
    let clauses: Vec<Vec<i32>> = vec![vec![1, 2], vec![-1, 3], vec![-2, -4]];
    let expected = brute_force_count(n_vars, &clauses);

    let mut s = solver(n_vars);
    add_all(&mut s, &clauses);
    let mut found = 0u64;
    while s.solve().unwrap() {
        found += 1;
        assert!(model_satisfies(&s, &clauses));
        // forbid the model just found and ask for another one
        let blocking: Vec<i32> = (1..=n_vars)
            .map(|v| if s.query(v) { -(v as i32) } else { v as i32 })
            .collect();
        s.add_clause(&blocking).unwrap();
        assert!(found <= expected, "enumeration repeated a model");
    }
    assert_eq!(found, expected);
}

struct CollectLearnts {
    learnt: Rc<RefCell<Vec<Vec<i32>>>>,
}

impl Callbacks for CollectLearnts {
    fn on_new_clause(&mut self, c: &[Lit], learnt: bool) {
        if learnt {
            self.learnt
                .borrow_mut()
                .push(c.iter().map(|l| l.to_dimacs()).collect());
        }
    }
}

#[test]
fn learnt_clauses_are_implied_by_the_input() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..20 {
        let n_vars = rng.gen_range(6..=10);
        let clauses = random_formula(&mut rng, n_vars);
        let learnt = Rc::new(RefCell::new(vec![]));
        let mut s = Solver::new(
            n_vars,
            MEM,
            SolverOpts::default(),
            CollectLearnts {
                learnt: learnt.clone(),
            },
        );
        add_all_generic(&mut s, &clauses);
        let _ = s.solve().unwrap();

        // every model of the input must satisfy every learnt clause
        for m in 0u32..1 << n_vars {
            if !assignment_satisfies(m, &clauses) {
                continue;
            }
            for c in learnt.borrow().iter() {
                assert!(
                    assignment_satisfies(m, std::slice::from_ref(c)),
                    "learnt clause {:?} is not implied by {:?}",
                    c,
                    clauses
                );
            }
        }
    }
}

fn add_all_generic<Cb: Callbacks>(s: &mut Solver<Cb>, clauses: &[Vec<i32>]) {
    for c in clauses {
        s.add_clause(c).unwrap();
    }
}

#[test]
fn resolving_after_sat_reuses_the_instance() {
    // solve, then strengthen the instance and solve again
    let mut s = solver(3);
    add_all(&mut s, &[vec![1, 2, 3]]);
    assert_eq!(s.solve().unwrap(), true);
    s.add_clause(&[-1]).unwrap();
    s.add_clause(&[-2]).unwrap();
    assert_eq!(s.solve().unwrap(), true);
    assert!(!s.query(1));
    assert!(!s.query(2));
    assert!(s.query(3));
    s.add_clause(&[-3]).unwrap();
    assert_eq!(s.solve().unwrap(), false);
}
