/*****************************************************************************************[core.rs]
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

use {
    crate::callbacks::{Callbacks, ProgressStatus},
    crate::clause::{
        lbool, CRef, ClauseAllocator, ClauseRef, DeletePred, Lit, OccLists, OccListsData, VMap, Var,
    },
    crate::idx::{Comparator, Heap, HeapData},
    crate::interface::SolverInterface,
    crate::{Error, Result},
    std::{
        cmp, fmt,
        ops::IndexMut,
        sync::atomic::{AtomicBool, Ordering},
    },
};

/// The main solver structure.
///
/// A `Solver` owns the whole state of the search: the clause arena, the
/// per-variable tables, the trail and the learnt clause database. It is
/// created for a fixed number of variables and a fixed arena capacity
/// `mem_max` (in 32-bit slots); running out of arena space surfaces as
/// [`Error::OutOfMemory`] and retires the instance.
///
/// Clauses may be added between `solve()` calls: after a SAT answer the
/// caller can append blocking clauses and solve again, reusing the
/// accumulated activities and the level-0 trail.
pub struct Solver<Cb: Callbacks> {
    /// If the problem is satisfiable, this vector contains the model (if any).
    model: Vec<lbool>,

    cb: Cb, // the callbacks
    asynch_interrupt: AtomicBool,
    /// Set after an arena exhaustion; the instance only reports `OutOfMemory` from then on.
    dead: bool,

    /// List of problem clauses.
    clauses: Vec<CRef>,
    /// List of learnt clauses.
    learnts: Vec<CRef>,

    v: SolverV,
}

/// The current assignments.
struct VarState {
    /// A heuristic measurement of the activity of a variable.
    activity: VMap<f64>,
    /// Current assignment for each variable.
    ass: VMap<lbool>,
    /// Stores reason and level for each variable.
    vardata: VMap<VarData>,
    /// Amount to bump next variable with.
    var_inc: f64,
    var_decay: f64,

    /// Assignment stack; stores all assigments made in the order they were made.
    trail: Vec<Lit>,
    /// Separator indices for different decision levels in `trail`.
    trail_lim: Vec<i32>,
}

struct SolverV {
    vars: VarState,

    n_vars: u32,
    /// If `false`, the constraints are already unsatisfiable.
    ok: bool,

    max_learnts: f64,
    learntsize_adjust_start_confl: i32,
    learntsize_adjust_inc: f64,
    learntsize_adjust_confl: f64,
    learntsize_adjust_cnt: i32,
    learntsize_factor: f64,
    learntsize_inc: f64,

    // Mode of operation:
    clause_decay: f64,
    luby_restart: bool,
    /// Controls conflict clause minimization (0=none, 1=basic, 2=deep).
    ccmin_mode: i32,
    /// Controls the level of phase saving (0=none, 1=limited, 2=full).
    phase_saving: i32,
    /// The fraction of wasted arena slots that triggers a compaction.
    garbage_frac: f64,
    /// Minimum number to set the learnts limit to.
    min_learnts_lim: i32,
    /// The initial restart limit. (default 100)
    restart_first: i32,
    /// The factor with which the restart limit is multiplied in each restart. (default 2.0)
    restart_inc: f64,

    /// The saved polarity of each variable.
    polarity: VMap<bool>,
    /// `watches[lit]` is a list of clauses watching 'lit' (will go there if literal becomes true).
    watches_data: OccListsData<Lit, Watcher>,
    /// A priority queue of variables ordered with respect to the variable activity.
    order_heap_data: HeapData<Var>,
    /// Amount to bump next clause with.
    cla_inc: f64,
    /// Head of the propagation queue (as index into the trail).
    qhead: i32,

    ca: ClauseAllocator,

    // Temporaries (to reduce allocation overhead), `seen` is used in several places.
    seen: VMap<Seen>,
    minimize_stack: Vec<Lit>,
    analyze_toclear: Vec<Lit>,

    // Statistics: (read-only member variable)
    solves: u64,
    starts: u64,
    decisions: u64,
    propagations: u64,
    conflicts: u64,
    num_clauses: u64,
    num_learnts: u64,
    clauses_literals: u64,
    learnts_literals: u64,
    max_literals: u64,
    tot_literals: u64,

    // Resource contraints:
    conflict_budget: i64,
    conflict_limit: i64,
}

/// Print the model as DIMACS (`v ... 0`).
pub struct SolverPrintDimacs<'a, Cb: Callbacks + 'a> {
    s: &'a Solver<Cb>,
}

impl<'a, Cb: Callbacks> fmt::Display for SolverPrintDimacs<'a, Cb> {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        write!(out, "v ")?;
        for (i, &val) in self.s.model.iter().enumerate() {
            if val == lbool::TRUE {
                write!(out, "{} ", i + 1)?
            } else if val == lbool::FALSE {
                write!(out, "-{} ", i + 1)?
            }
        }
        writeln!(out, "0")
    }
}

impl<Cb: Callbacks> SolverInterface for Solver<Cb> {
    fn num_vars(&self) -> u32 {
        self.v.n_vars
    }
    fn is_ok(&self) -> bool {
        self.v.ok
    }
    fn add_clause(&mut self, lits: &[i32]) -> Result<()> {
        Solver::add_clause(self, lits)
    }
}

impl<Cb: Callbacks + Default> Solver<Cb> {
    /// Create a solver for variables `1..=n_vars` with an arena of
    /// `mem_max` slots, default options and default callbacks.
    pub fn with_capacity(n_vars: u32, mem_max: u32) -> Self {
        Solver::new(n_vars, mem_max, SolverOpts::default(), Cb::default())
    }
}

// public API
impl<Cb: Callbacks> Solver<Cb> {
    /// Create a new solver with the given options and callbacks.
    pub fn new(n_vars: u32, mem_max: u32, opts: SolverOpts, cb: Cb) -> Self {
        assert!(opts.check(), "invalid solver options");
        Self {
            model: vec![],
            cb,
            asynch_interrupt: AtomicBool::new(false),
            dead: false,
            clauses: vec![],
            learnts: vec![],
            v: SolverV::new(n_vars, mem_max, &opts),
        }
    }

    /// Append a clause given as signed DIMACS literals.
    ///
    /// Duplicates are collapsed and tautologies silently dropped. An empty
    /// clause (or one falsified at level 0) makes the instance permanently
    /// unsatisfiable; a unit clause is enqueued at level 0 right away.
    pub fn add_clause(&mut self, lits: &[i32]) -> Result<()> {
        if self.dead {
            return Err(Error::OutOfMemory);
        }
        let mut lits = lits;
        // a single trailing zero sentinel is tolerated
        if let Some((&0, rest)) = lits.split_last() {
            lits = rest;
        }
        let mut ps = Vec::with_capacity(lits.len());
        for &l in lits {
            if l == 0 {
                return Err(Error::InvalidInput("zero literal inside clause".into()));
            }
            let v = l.unsigned_abs();
            if v > self.v.n_vars {
                return Err(Error::InvalidInput(format!(
                    "variable {} beyond declared maximum {}",
                    v, self.v.n_vars
                )));
            }
            ps.push(Lit::from_dimacs(l));
        }
        debug!("add toplevel clause {:?}", ps);
        ps.sort_unstable();
        self.add_clause_(ps)
    }

    /// Run the search to completion.
    ///
    /// `Ok(true)` means SAT (the model is available through [`Solver::query`]),
    /// `Ok(false)` means UNSAT. An observed interrupt or `stop()` callback
    /// yields `Err(Error::Aborted)`; arena exhaustion `Err(Error::OutOfMemory)`.
    pub fn solve(&mut self) -> Result<bool> {
        match self.solve_limited()? {
            x if x == lbool::TRUE => Ok(true),
            x if x == lbool::FALSE => Ok(false),
            _ => Err(Error::Aborted),
        }
    }

    /// Like [`Solver::solve`], but the conflict budget and the `stop()`
    /// callback are allowed to end the search early with `lbool::UNDEF`.
    pub fn solve_limited(&mut self) -> Result<lbool> {
        if self.dead {
            return Err(Error::OutOfMemory);
        }
        self.asynch_interrupt.store(false, Ordering::SeqCst);
        self.solve_internal()
    }

    /// The model's value for variable `v` (1-based) after a SAT answer.
    ///
    /// Unassigned and out-of-range variables conservatively report `false`.
    pub fn query(&self, v: u32) -> bool {
        v >= 1
            && self
                .model
                .get((v - 1) as usize)
                .map_or(false, |&val| val == lbool::TRUE)
    }

    /// Model value of `v`, `UNDEF` if the last solve was not SAT.
    pub fn value_var(&self, v: Var) -> lbool {
        self.model
            .get(v.idx() as usize)
            .map_or(lbool::UNDEF, |&val| val)
    }

    pub fn value_lit(&self, l: Lit) -> lbool {
        self.value_var(l.var()) ^ !l.sign()
    }

    /// Whole model; empty unless the last solve returned SAT.
    pub fn get_model(&self) -> &[lbool] {
        &self.model
    }

    /// `false` once the instance is known to be permanently unsatisfiable.
    pub fn is_ok(&self) -> bool {
        self.v.ok
    }

    /// Limit the number of conflicts spent by the next `solve_limited`
    /// call; negative means unlimited.
    pub fn set_conflict_budget(&mut self, budget: i64) {
        self.v.conflict_budget = budget;
    }

    /// Interrupt the search asynchronously. The search polls the flag
    /// between conflicts.
    pub fn interrupt_async(&self) {
        self.asynch_interrupt.store(true, Ordering::Relaxed);
    }

    pub fn num_vars(&self) -> u32 {
        self.v.n_vars
    }
    pub fn num_clauses(&self) -> u64 {
        self.v.num_clauses
    }
    pub fn num_learnts(&self) -> u64 {
        self.v.num_learnts
    }
    pub fn num_conflicts(&self) -> u64 {
        self.v.conflicts
    }
    pub fn num_propagations(&self) -> u64 {
        self.v.propagations
    }
    pub fn num_decisions(&self) -> u64 {
        self.v.decisions
    }
    pub fn num_restarts(&self) -> u64 {
        self.v.starts
    }

    pub fn print_stats(&self) {
        println!("c restarts              : {}", self.v.starts);
        println!("c conflicts             : {:<12}", self.v.conflicts);
        println!("c decisions             : {:<12}", self.v.decisions);
        println!("c propagations          : {:<12}", self.v.propagations);
        println!(
            "c conflict literals     : {:<12}   ({:4.2} % deleted)",
            self.v.tot_literals,
            (self.v.max_literals - self.v.tot_literals) as f64 * 100.0
                / self.v.max_literals as f64
        );
    }

    /// Temporary access to the callbacks
    pub fn cb_mut(&mut self) -> &mut Cb {
        &mut self.cb
    }

    /// Temporary access to the callbacks
    pub fn cb(&self) -> &Cb {
        &self.cb
    }

    pub fn dimacs_model(&self) -> SolverPrintDimacs<Cb> {
        SolverPrintDimacs { s: self }
    }
}

// main algorithm
impl<Cb: Callbacks> Solver<Cb> {
    fn has_been_interrupted(&self) -> bool {
        self.asynch_interrupt.load(Ordering::Relaxed)
    }

    fn within_budget(&self) -> bool {
        !self.has_been_interrupted()
            && (self.v.conflict_limit < 0 || (self.v.conflicts as i64) < self.v.conflict_limit)
            && !self.cb.stop()
    }

    /// Add a sorted clause; the level-0 invariants of the trail hold.
    fn add_clause_(&mut self, mut clause: Vec<Lit>) -> Result<()> {
        debug_assert_eq!(self.v.decision_level(), 0);
        if !self.v.ok {
            return Ok(());
        }

        let mut last_lit = Lit::UNDEF;
        let mut j = 0;
        // remove duplicates, drop literals false at level 0, detect tautologies
        for i in 0..clause.len() {
            let lit_i = clause[i];
            let value = self.v.value_lit(lit_i);
            let lvl = self.v.level_lit(lit_i);
            if (value == lbool::TRUE && lvl == 0) || lit_i == !last_lit {
                return Ok(()); // tauto or satisfied already at level 0
            } else if !(value == lbool::FALSE && lvl == 0) && lit_i != last_lit {
                // not a duplicate
                last_lit = lit_i;
                clause[j] = lit_i;
                j += 1;
            }
        }
        clause.truncate(j);

        if clause.is_empty() {
            self.v.ok = false;
        } else if clause.len() == 1 {
            self.v.vars.unchecked_enqueue(clause[0], CRef::UNDEF);
        } else {
            for &l in &clause {
                self.v
                    .vars
                    .var_bump_activity(&mut self.v.order_heap_data, l.var());
            }
            let cr = self.alloc_clause_or_gc(&clause, false)?;
            self.clauses.push(cr);
            self.v.attach_clause(cr);
        }

        Ok(())
    }

    /// Allocate in the arena, compacting once if the first attempt fails.
    fn alloc_clause_or_gc(&mut self, lits: &[Lit], learnt: bool) -> Result<CRef> {
        match self.v.ca.alloc(lits, learnt) {
            Ok(cr) => Ok(cr),
            Err(_) if self.v.ca.wasted() > 0 => {
                self.garbage_collect();
                match self.v.ca.alloc(lits, learnt) {
                    Ok(cr) => Ok(cr),
                    Err(e) => {
                        self.dead = true;
                        Err(e)
                    }
                }
            }
            Err(e) => {
                self.dead = true;
                Err(e)
            }
        }
    }

    /// Main solve method.
    fn solve_internal(&mut self) -> Result<lbool> {
        debug_assert_eq!(self.v.decision_level(), 0);
        self.model.clear();
        if !self.v.ok {
            return Ok(lbool::FALSE);
        }

        self.v.solves += 1;
        let mut tmp_learnt: Vec<Lit> = vec![];

        self.v.max_learnts = self.num_clauses() as f64 * self.v.learntsize_factor;
        if self.v.max_learnts < self.v.min_learnts_lim as f64 {
            self.v.max_learnts = self.v.min_learnts_lim as f64;
        }
        self.v.learntsize_adjust_confl = self.v.learntsize_adjust_start_confl as f64;
        self.v.learntsize_adjust_cnt = self.v.learntsize_adjust_confl as i32;
        self.v.conflict_limit = if self.v.conflict_budget < 0 {
            -1
        } else {
            self.v.conflicts as i64 + self.v.conflict_budget
        };

        info!("search.start");
        self.cb.on_start();

        // Search:
        let mut status;
        let mut curr_restarts: i32 = 0;
        loop {
            let rest_base = if self.v.luby_restart {
                utils::luby(self.v.restart_inc, curr_restarts)
            } else {
                f64::powi(self.v.restart_inc, curr_restarts)
            };
            let nof_conflicts = (rest_base * self.v.restart_first as f64) as i32;
            status = self.search(nof_conflicts, &mut tmp_learnt)?;
            if !self.within_budget() {
                break;
            }

            if status != lbool::UNDEF {
                break;
            } else {
                info!("search.restart({})", curr_restarts);
                curr_restarts += 1;
                self.cb.on_restart();
            }
        }

        self.cb.on_result(status);

        if status == lbool::TRUE {
            // Extend & copy model:
            let num_vars = self.v.n_vars;
            self.model.resize(num_vars as usize, lbool::UNDEF);
            for i in 0..num_vars {
                self.model[i as usize] = self.v.value(Var::from_idx(i));
            }
        } else if status == lbool::FALSE {
            self.v.ok = false;
        }

        self.v.cancel_until(0);
        debug!("res: {:?}", status);
        Ok(status)
    }

    /// Search for a model within the given number of conflicts.
    ///
    /// Use a negative `nof_conflicts` to indicate infinity.
    ///
    /// # Output:
    ///
    /// - `lbool::TRUE` if the clause set is satisfiable (all variables assigned).
    /// - `lbool::FALSE` if the clause set is unsatisfiable.
    /// - `lbool::UNDEF` if the bound on the number of conflicts is reached.
    fn search(&mut self, nof_conflicts: i32, tmp_learnt: &mut Vec<Lit>) -> Result<lbool> {
        debug_assert!(self.v.ok);
        let mut conflict_c = 0;
        self.v.starts += 1;

        loop {
            if let Some(confl) = self.v.propagate() {
                // conflict analysis
                self.v.conflicts += 1;
                conflict_c += 1;
                if self.v.decision_level() == 0 {
                    return Ok(lbool::FALSE);
                }

                let btlevel = self.v.analyze(confl, &self.learnts, tmp_learnt);
                self.cb.on_new_clause(tmp_learnt, true);
                self.v.cancel_until(btlevel as u32);
                self.learn_and_enqueue(tmp_learnt)?;

                self.v.vars.var_decay_activity();
                self.v.cla_decay_activity();

                self.v.learntsize_adjust_cnt -= 1;
                if self.v.learntsize_adjust_cnt == 0 {
                    self.v.learntsize_adjust_confl *= self.v.learntsize_adjust_inc;
                    self.v.learntsize_adjust_cnt = self.v.learntsize_adjust_confl as i32;
                    self.v.max_learnts *= self.v.learntsize_inc;

                    let v = &self.v;
                    self.cb.on_progress(|| ProgressStatus {
                        conflicts: v.conflicts,
                        n_clauses: v.num_clauses,
                        n_clause_lits: v.clauses_literals,
                        max_learnt: v.max_learnts as u64,
                        n_learnt: v.num_learnts,
                        n_learnt_lits: v.learnts_literals as f64 / v.num_learnts as f64,
                    });
                }
            } else {
                // no conflict
                if (nof_conflicts >= 0 && conflict_c >= nof_conflicts) || !self.within_budget() {
                    // Reached bound on number of conflicts:
                    self.v.cancel_until(0);
                    return Ok(lbool::UNDEF);
                }

                if self.learnts.len() as f64 - self.v.num_assigns() as f64 >= self.v.max_learnts {
                    // Reduce the set of learnt clauses:
                    self.reduce_db();
                }

                match self.v.pick_branch_lit() {
                    None => {
                        // all variables are assigned, the model is complete
                        return Ok(lbool::TRUE);
                    }
                    Some(next) => {
                        self.v.decisions += 1;
                        trace!("pick-next {:?}", next);
                        self.v.vars.new_decision_level();
                        self.v.vars.unchecked_enqueue(next, CRef::UNDEF);
                    }
                }
            }
        }
    }

    /// Install a freshly learnt clause and enqueue its asserting literal.
    ///
    /// Precondition: the trail was backjumped to the clause's assertion level.
    fn learn_and_enqueue(&mut self, learnt: &[Lit]) -> Result<()> {
        debug_assert!(!learnt.is_empty());
        if learnt.len() == 1 {
            // directly propagate the unit clause at level 0
            self.v.vars.unchecked_enqueue(learnt[0], CRef::UNDEF);
        } else {
            // propagate the asserting lit, justified by `cr`
            let cr = self.alloc_clause_or_gc(learnt, true)?;
            self.learnts.push(cr);
            self.v.attach_clause(cr);
            self.v.cla_bump_activity(&self.learnts, cr);
            self.v.vars.unchecked_enqueue(learnt[0], cr);
        }
        Ok(())
    }

    /// Remove half of the learnt clauses, minus the clauses locked by the
    /// current assignment. Locked clauses are clauses that are reason to
    /// some assignment. Short clauses (length ≤ 3) are never removed.
    fn reduce_db(&mut self) {
        let extra_lim = self.v.cla_inc / self.learnts.len() as f64; // Remove any clause below this activity

        debug!("reduce_db.start");

        {
            let ca = &self.v.ca;
            self.learnts.sort_unstable_by(|&x, &y| {
                let x = ca.get_ref(x);
                let y = ca.get_ref(y);
                debug_assert!(x.learnt());
                debug_assert!(y.learnt());
                Ord::cmp(&(x.size() <= 3), &(y.size() <= 3)).then(
                    PartialOrd::partial_cmp(&x.activity(), &y.activity()).expect("NaN activity"),
                )
            });
        }
        // Don't delete short or locked clauses. From the rest, delete clauses
        // from the first half and clauses with activity smaller than `extra_lim`:
        let mut j = 0;
        for i in 0..self.learnts.len() {
            let cr = self.learnts[i];
            let cond = {
                let c = self.v.ca.get_ref(cr);
                c.size() > 3
                    && !self.v.locked(c)
                    && (i < self.learnts.len() / 2 || (c.activity() as f64) < extra_lim)
            };
            if cond {
                self.v.remove_clause(cr);
                self.cb.on_delete_clause(self.v.ca.get_ref(cr).lits());
            } else {
                self.learnts[j] = cr;
                j += 1;
            }
        }

        let _deleted = self.learnts.len() - j;
        self.learnts.truncate(j);

        debug!("reduce_db.done (deleted {})", _deleted);

        self.check_garbage();
    }

    /// Compact the arena by moving alive clauses into a fresh allocator
    /// of the same capacity.
    fn garbage_collect(&mut self) {
        let mut to = ClauseAllocator::new(self.v.ca.capacity() as u32);
        self.v
            .reloc_all(&mut self.learnts, &mut self.clauses, &mut to);
        self.cb.on_gc(self.v.ca.len(), to.len());
        self.v.ca = to;
    }

    /// Compact when the wasted fraction of the arena exceeds the threshold.
    fn check_garbage(&mut self) {
        if self.v.ca.wasted() as f64 > self.v.ca.len() as f64 * self.v.garbage_frac {
            self.garbage_collect();
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct VarData {
    reason: CRef,
    level: i32,
}

#[derive(Debug, Clone, Copy)]
struct Watcher {
    cref: CRef,
    blocker: Lit,
}

struct VarOrder<'a> {
    activity: &'a VMap<f64>,
}

/// Predicate to test whether a clause has been removed from some lit's watchlist
struct WatcherDeleted<'a> {
    ca: &'a ClauseAllocator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
enum Seen {
    UNDEF,
    SOURCE,
    REMOVABLE,
}

impl SolverV {
    fn new(n_vars: u32, mem_max: u32, opts: &SolverOpts) -> Self {
        let mut v = Self {
            vars: VarState::new(opts),
            n_vars,
            ok: true,

            max_learnts: 0.0,
            learntsize_adjust_start_confl: 100,
            learntsize_adjust_inc: 1.5,
            learntsize_adjust_confl: 0.0,
            learntsize_adjust_cnt: 0,
            learntsize_factor: 1.0 / 3.0,
            learntsize_inc: 1.1,

            clause_decay: opts.clause_decay,
            luby_restart: opts.luby_restart,
            ccmin_mode: opts.ccmin_mode,
            phase_saving: opts.phase_saving,
            garbage_frac: opts.garbage_frac,
            min_learnts_lim: opts.min_learnts_lim,
            restart_first: opts.restart_first,
            restart_inc: opts.restart_inc,

            polarity: VMap::new(),
            watches_data: OccListsData::new(),
            order_heap_data: HeapData::new(),
            cla_inc: 1.0,
            qhead: 0,

            ca: ClauseAllocator::new(mem_max),

            seen: VMap::new(),
            minimize_stack: vec![],
            analyze_toclear: vec![],

            solves: 0,
            starts: 0,
            decisions: 0,
            propagations: 0,
            conflicts: 0,
            num_clauses: 0,
            num_learnts: 0,
            clauses_literals: 0,
            learnts_literals: 0,
            max_literals: 0,
            tot_literals: 0,

            conflict_budget: -1,
            conflict_limit: -1,
        };
        for i in 0..n_vars {
            let x = Var::from_idx(i);
            v.watches_data.init(Lit::new(x, false));
            v.watches_data.init(Lit::new(x, true));
            v.vars.ass.insert_default(x, lbool::UNDEF);
            v.vars.vardata.insert_default(x, VarData::default());
            v.vars.activity.insert_default(x, 0.0);
            v.seen.insert_default(x, Seen::UNDEF);
            v.polarity.insert_default(x, false);
        }
        v.vars.trail.reserve(n_vars as usize);
        let all: Vec<Var> = (0..n_vars).map(Var::from_idx).collect();
        v.order_heap().build(&all);
        v
    }

    #[inline(always)]
    fn num_assigns(&self) -> u32 {
        self.vars.num_assigns()
    }

    #[inline(always)]
    fn level(&self, x: Var) -> i32 {
        self.vars.level(x)
    }

    #[inline(always)]
    fn level_lit(&self, x: Lit) -> i32 {
        self.level(x.var())
    }

    #[inline(always)]
    fn value(&self, x: Var) -> lbool {
        self.vars.value(x)
    }

    #[inline(always)]
    fn value_lit(&self, x: Lit) -> lbool {
        self.vars.value_lit(x)
    }

    #[inline(always)]
    fn decision_level(&self) -> u32 {
        self.vars.decision_level()
    }

    #[inline(always)]
    fn reason(&self, x: Var) -> CRef {
        self.vars.reason(x)
    }

    fn order_heap(&mut self) -> Heap<Var, VarOrder> {
        self.order_heap_data.promote(VarOrder {
            activity: &self.vars.activity,
        })
    }

    fn insert_var_order(&mut self, x: Var) {
        if !self.order_heap().in_heap(x) {
            self.order_heap().insert(x);
        }
    }

    fn watches(&mut self) -> OccLists<Lit, Watcher, WatcherDeleted> {
        self.watches_data.promote(WatcherDeleted { ca: &self.ca })
    }

    fn cla_decay_activity(&mut self) {
        self.cla_inc *= 1.0 / self.clause_decay;
    }

    fn cla_bump_activity(&mut self, learnts: &[CRef], cr: CRef) {
        let new_activity = {
            let mut c = self.ca.get_mut(cr);
            let r = c.activity() + self.cla_inc as f32;
            c.set_activity(r);
            r
        };
        if new_activity > 1e20 {
            // Rescale:
            for &learnt in learnts.iter() {
                let mut c = self.ca.get_mut(learnt);
                let r = c.activity() * 1e-20;
                c.set_activity(r);
            }
            self.cla_inc *= 1e-20;
        }
    }

    /// Pick the unassigned variable with the highest activity, with its
    /// saved polarity; `None` when every variable is assigned.
    fn pick_branch_lit(&mut self) -> Option<Lit> {
        loop {
            let next = {
                let mut order_heap = self.order_heap();
                if order_heap.is_empty() {
                    return None;
                }
                order_heap.remove_min()
            };
            if self.value(next) == lbool::UNDEF {
                return Some(Lit::new(next, self.polarity[next]));
            }
        }
    }

    /// Analyze conflict and produce a reason clause.
    ///
    /// # Pre-conditions:
    ///
    /// - current decision level must be greater than root level.
    /// - `confl` is falsified by the current trail.
    ///
    /// # Post-conditions:
    ///
    /// - the backtrack level is returned.
    /// - `out_learnt[0]` is the asserting literal at that level.
    /// - if `out_learnt.len() > 1` then `out_learnt[1]` has the greatest
    ///   decision level of the rest of the literals.
    fn analyze(&mut self, confl: CRef, learnts: &[CRef], out_learnt: &mut Vec<Lit>) -> i32 {
        out_learnt.clear();
        out_learnt.push(Lit::UNDEF); // leave room for the asserting literal

        debug!("analyze.start {:?}", confl);

        let conflict_level = self.decision_level() as i32;
        let mut cur_clause = confl;
        let mut path_c = 0i32;
        let mut p = Lit::UNDEF;
        let mut index = self.vars.trail.len();

        loop {
            debug_assert_ne!(cur_clause, CRef::UNDEF, "resolution reached a decision");

            if self.ca.get_ref(cur_clause).learnt() {
                self.cla_bump_activity(learnts, cur_clause);
            }

            let c = self.ca.get_ref(cur_clause);
            // for a reason clause the first literal is the propagated one
            // and cannot occur in the learnt clause
            let lits = if p == Lit::UNDEF {
                c.lits()
            } else {
                debug_assert_eq!(p.var(), c.lits()[0].var());
                &c.lits()[1..]
            };

            for &q in lits {
                let lvl = self.vars.level(q.var());
                debug_assert!(lvl <= conflict_level);
                if !self.seen[q.var()].is_seen() && lvl > 0 {
                    self.vars
                        .var_bump_activity(&mut self.order_heap_data, q.var());
                    self.seen[q.var()] = Seen::SOURCE;
                    if lvl == conflict_level {
                        // at conflict level: eliminate this lit by resolution
                        path_c += 1;
                    } else {
                        out_learnt.push(q); // part of the learnt clause
                    }
                }
            }

            // Select next literal in the trail to look at:
            while !self.seen[self.vars.trail[index - 1].var()].is_seen() {
                debug_assert_eq!(
                    self.vars.level(self.vars.trail[index - 1].var()),
                    conflict_level
                );
                index -= 1;
            }

            p = self.vars.trail[index - 1];
            index -= 1;
            cur_clause = self.vars.reason(p.var());
            self.seen[p.var()] = Seen::REMOVABLE;
            path_c -= 1;

            if path_c <= 0 {
                break;
            }
        }

        // cleanup literals flagged `REMOVABLE`
        let mut i = self.vars.trail.len() - 1;
        loop {
            let q = self.vars.trail[i];
            if self.seen[q.var()] == Seen::REMOVABLE {
                self.seen[q.var()] = Seen::UNDEF;
            }
            if q == p {
                break;
            }
            i -= 1;
        }

        debug_assert!(self.value_lit(p) == lbool::TRUE);
        out_learnt[0] = !p;

        trace!("analyze-learnt: {:?} (before minimization)", &out_learnt);
        self.max_literals += out_learnt.len() as u64;

        self.minimize_conflict(out_learnt);

        // Find correct backtrack level:
        let btlevel = if out_learnt.len() == 1 {
            0
        } else {
            let mut max_i = 1;
            let mut max_level = self.level(out_learnt[max_i].var());
            // Find the first literal assigned at the next-highest level:
            for i in 2..out_learnt.len() {
                let level = self.level(out_learnt[i].var());
                if level > max_level {
                    max_i = i;
                    max_level = level;
                }
            }
            // Swap-in this literal at index 1:
            out_learnt.swap(max_i, 1);
            self.level_lit(out_learnt[1])
        };
        debug_assert!(btlevel < conflict_level);

        for &lit in &self.analyze_toclear {
            self.seen[lit.var()] = Seen::UNDEF; // (`seen[]` is now cleared)
        }
        debug_assert!(out_learnt
            .iter()
            .all(|&l| self.value_lit(l) == lbool::FALSE));
        btlevel
    }

    /// An abstraction of the level of a variable
    #[inline]
    fn abstract_level(&self, v: Var) -> u32 {
        1 << (self.level(v) & 31)
    }

    fn minimize_conflict(&mut self, out_learnt: &mut Vec<Lit>) {
        // Simplify conflict clause:
        self.analyze_toclear.clear();
        self.analyze_toclear.extend_from_slice(&out_learnt);
        let new_size = if self.ccmin_mode == 2 {
            let mut abstract_levels = 0;
            for a in out_learnt[1..].iter() {
                abstract_levels |= self.abstract_level(a.var())
            }

            let mut j = 1;
            for i in 1..out_learnt.len() {
                let lit = out_learnt[i];
                // can eliminate `lit` only if it's redundant *and* not a decision
                if self.reason(lit.var()) == CRef::UNDEF
                    || !self.lit_redundant(lit, abstract_levels)
                {
                    out_learnt[j] = lit;
                    j += 1;
                }
            }
            j
        } else if self.ccmin_mode == 1 {
            let mut j = 1;
            for i in 1..out_learnt.len() {
                let lit = out_learnt[i];
                let x = lit.var();
                let reason = self.reason(x);

                let mut retain = reason == CRef::UNDEF;
                if !retain {
                    let c = self.ca.get_ref(reason);
                    for k in 1..c.size() {
                        let v = c[k].var();
                        if !self.seen[v].is_seen() && self.level(v) > 0 {
                            retain = true;
                            break;
                        }
                    }
                }
                if retain {
                    out_learnt[j] = lit;
                    j += 1;
                }
            }
            j
        } else {
            out_learnt.len()
        };

        self.tot_literals += new_size as u64;
        debug_assert!(new_size <= out_learnt.len());
        out_learnt.truncate(new_size);
    }

    /// Check if `p` can be removed from a conflict clause `C`.
    ///
    /// It can be removed from `C` if it is propagation-implied
    /// by literals of level 0 exclusively or if `C x p.reason` subsumes `C`.
    fn lit_redundant(&mut self, p: Lit, abstract_levels: u32) -> bool {
        self.minimize_stack.clear();
        self.minimize_stack.push(p);

        let top = self.analyze_toclear.len();

        while !self.minimize_stack.is_empty() {
            let q = *self.minimize_stack.last().unwrap();
            let cr = self.reason(q.var());
            debug_assert_ne!(cr, CRef::UNDEF);
            self.minimize_stack.pop();

            let c = self.ca.get_ref(cr);
            // `q` comes from some propagation with `c`, check if these lits can
            // also be eliminated or are already in the learnt clause
            for &l in c.lits()[1..].iter() {
                // Variable at level 0 or previously marked: just skip
                if self.vars.level(l.var()) == 0 || self.seen[l.var()] == Seen::SOURCE {
                    continue;
                }

                if self.vars.reason(l.var()) != CRef::UNDEF
                    && (self.abstract_level(l.var()) & abstract_levels) != 0
                {
                    self.seen[l.var()] = Seen::SOURCE;
                    self.minimize_stack.push(l);
                    self.analyze_toclear.push(l);
                } else {
                    // cannot remove `l`, cancel
                    for a in self.analyze_toclear[top..].iter() {
                        self.seen[a.var()] = Seen::UNDEF;
                    }
                    self.analyze_toclear.truncate(top);
                    return false;
                }
            }
        }

        true
    }

    /// Propagates all enqueued facts.
    ///
    /// If a conflict arises, the conflicting clause is returned,
    /// otherwise `None`.
    ///
    /// # Post-conditions:
    ///
    /// - the propagation queue is empty, even if there was a conflict.
    fn propagate(&mut self) -> Option<CRef> {
        let mut confl = None;
        let mut num_props: u32 = 0;

        while (self.qhead as usize) < self.vars.trail.len() {
            // `p` is the next enqueued fact to propagate.
            let p = self.vars.trail[self.qhead as usize];
            self.qhead += 1;
            let watches_data_ptr: *mut OccListsData<Lit, Watcher> = &mut self.watches_data;
            let ws = self
                .watches_data
                .lookup_mut_pred(p, &WatcherDeleted { ca: &self.ca });
            let mut i: usize = 0;
            let mut j: usize = 0;
            let end: usize = ws.len();
            num_props += 1;
            'clauses: while i < end {
                // Try to avoid inspecting the clause:
                let blocker = ws[i].blocker;
                if self.vars.value_lit(blocker) == lbool::TRUE {
                    ws[j] = ws[i];
                    j += 1;
                    i += 1;
                    continue;
                }

                // Make sure the false literal is data[1]:
                let cr = ws[i].cref;
                let mut c = self.ca.get_mut(cr);
                let false_lit = !p;
                if c[0] == false_lit {
                    c[0] = c[1];
                    c[1] = false_lit;
                }
                debug_assert_eq!(c[1], false_lit);
                i += 1;

                // If 0th watch is true, then clause is already satisfied.
                let first = c[0];
                let w = Watcher::new(cr, first);
                if first != blocker && self.vars.value_lit(first) == lbool::TRUE {
                    ws[j] = w;
                    j += 1;
                    continue;
                }

                // Look for new watch:
                for k in 2..c.size() {
                    if self.vars.value_lit(c[k]) != lbool::FALSE {
                        c[1] = c[k];
                        c[k] = false_lit;

                        // safe because `!c[1] != p`, so the two watch lists are not aliased
                        debug_assert_ne!(!c[1], p);
                        let watches_data_ref: &mut OccListsData<Lit, Watcher> =
                            unsafe { &mut *watches_data_ptr };
                        watches_data_ref.index_mut(!c[1]).push(w);
                        continue 'clauses;
                    }
                }

                // Did not find watch -- clause is unit under assignment:
                ws[j] = w;
                j += 1;
                if self.vars.value_lit(first) == lbool::FALSE {
                    confl = Some(cr);
                    self.qhead = self.vars.trail.len() as i32;
                    // Copy the remaining watches:
                    while i < end {
                        ws[j] = ws[i];
                        j += 1;
                        i += 1;
                    }
                } else {
                    self.vars.unchecked_enqueue(first, cr);
                }
            }
            ws.truncate(j);
        }
        self.propagations += num_props as u64;

        confl
    }

    /// Move to the given clause allocator, where clause indices might differ
    fn reloc_all(
        &mut self,
        learnts: &mut Vec<CRef>,
        clauses: &mut Vec<CRef>,
        to: &mut ClauseAllocator,
    ) {
        macro_rules! is_removed {
            ($ca:expr, $cr:expr) => {
                $ca.get_ref($cr).mark() == 1
            };
        }
        // All watchers:
        self.watches().clean_all();
        for v in (0..self.n_vars).map(Var::from_idx) {
            for s in 0..2 {
                let p = Lit::new(v, s != 0);
                for watch in &mut self.watches_data[p] {
                    self.ca.reloc(&mut watch.cref, to);
                }
            }
        }

        // All reasons:
        for i in 0..self.vars.trail.len() {
            let v = self.vars.trail[i].var();

            // it is not safe to call `locked()` on a relocated clause, so
            // dangling reasons of unlocked clauses are left in place
            let reason = self.vars.reason(v);
            if reason != CRef::UNDEF {
                let keep = {
                    let c = self.ca.get_ref(reason);
                    c.reloced() || self.locked(c)
                };
                if keep {
                    debug_assert!(!is_removed!(self.ca, reason));
                    self.ca.reloc(&mut self.vars.vardata[v].reason, to);
                }
            }
        }

        // All learnt:
        {
            let mut j = 0;
            for i in 0..learnts.len() {
                let mut cr = learnts[i];
                if !is_removed!(self.ca, cr) {
                    self.ca.reloc(&mut cr, to);
                    learnts[j] = cr;
                    j += 1;
                }
            }
            learnts.truncate(j);
        }

        // All original:
        {
            let mut j = 0;
            for i in 0..clauses.len() {
                let mut cr = clauses[i];
                if !is_removed!(self.ca, cr) {
                    self.ca.reloc(&mut cr, to);
                    clauses[j] = cr;
                    j += 1;
                }
            }
            clauses.truncate(j);
        }
    }

    /// Attach a clause to watcher lists
    fn attach_clause(&mut self, cr: CRef) {
        let (c0, c1, learnt, size) = {
            let c = self.ca.get_ref(cr);
            debug_assert!(c.size() > 1);
            (c[0], c[1], c.learnt(), c.size())
        };
        self.watches_data[!c0].push(Watcher::new(cr, c1));
        self.watches_data[!c1].push(Watcher::new(cr, c0));
        if learnt {
            self.num_learnts += 1;
            self.learnts_literals += size as u64;
        } else {
            self.num_clauses += 1;
            self.clauses_literals += size as u64;
        }
    }

    /// Revert to the state at given level (keeping all assignment at `level` but not beyond).
    fn cancel_until(&mut self, level: u32) {
        if self.decision_level() <= level {
            return;
        }
        let trail_lim_last = *self.vars.trail_lim.last().expect("trail_lim is empty") as usize;
        let trail_lim_level = self.vars.trail_lim[level as usize] as usize;
        for c in (trail_lim_level..self.vars.trail.len()).rev() {
            let x = self.vars.trail[c].var();
            self.vars.ass[x] = lbool::UNDEF;
            if self.phase_saving > 1 || (self.phase_saving == 1 && c > trail_lim_last) {
                self.polarity[x] = self.vars.trail[c].sign();
            }
            self.insert_var_order(x);
        }
        self.qhead = trail_lim_level as i32;
        self.vars.trail.truncate(trail_lim_level);
        self.vars.trail_lim.truncate(level as usize);
    }

    /// Detach a clause from watcher lists (lazily, via the dirty-set).
    fn detach_clause(&mut self, cr: CRef) {
        let (c0, c1, csize, clearnt) = {
            let c = self.ca.get_ref(cr);
            (c[0], c[1], c.size(), c.learnt())
        };
        debug_assert!(csize > 1);

        let mut watches = self.watches_data.promote(WatcherDeleted { ca: &self.ca });
        watches.smudge(!c0);
        watches.smudge(!c1);

        if clearnt {
            self.num_learnts -= 1;
            self.learnts_literals -= csize as u64;
        } else {
            self.num_clauses -= 1;
            self.clauses_literals -= csize as u64;
        }
    }

    /// Detach and free a clause.
    fn remove_clause(&mut self, cr: CRef) {
        self.detach_clause(cr);
        {
            let c = self.ca.get_ref(cr);
            // Don't leave pointers to free'd memory!
            if self.locked(c) {
                self.vars.vardata[c[0].var()].reason = CRef::UNDEF;
            }
        }
        self.ca.get_mut(cr).set_mark(1); // used in reloc
        self.ca.free(cr);
    }

    /// Returns `true` if a clause is a reason for some implication in the current state.
    fn locked(&self, c: ClauseRef) -> bool {
        let reason = self.reason(c[0].var());
        self.value_lit(c[0]) == lbool::TRUE
            && reason != CRef::UNDEF
            && self.ca.get_ref(reason) == c
    }
}

impl VarState {
    fn new(opts: &SolverOpts) -> Self {
        Self {
            ass: VMap::new(),
            vardata: VMap::new(),
            activity: VMap::new(),
            var_inc: 1.0,
            var_decay: opts.var_decay,
            trail: vec![],
            trail_lim: vec![],
        }
    }

    #[inline(always)]
    fn num_assigns(&self) -> u32 {
        self.trail.len() as u32
    }

    /// Begins a new decision level.
    fn new_decision_level(&mut self) {
        let lvl = self.trail.len() as i32;
        self.trail_lim.push(lvl);
    }

    #[inline(always)]
    fn value(&self, x: Var) -> lbool {
        self.ass[x]
    }

    #[inline(always)]
    fn value_lit(&self, x: Lit) -> lbool {
        self.ass[x.var()] ^ !x.sign()
    }

    #[inline(always)]
    fn level(&self, x: Var) -> i32 {
        self.vardata[x].level
    }

    #[inline(always)]
    fn reason(&self, x: Var) -> CRef {
        self.vardata[x].reason
    }

    fn var_decay_activity(&mut self) {
        self.var_inc *= 1.0 / self.var_decay;
    }

    #[inline(always)]
    fn decision_level(&self) -> u32 {
        self.trail_lim.len() as u32
    }

    fn unchecked_enqueue(&mut self, p: Lit, from: CRef) {
        debug_assert_eq!(
            self.value_lit(p),
            lbool::UNDEF,
            "lit {:?} should be undef",
            p
        );
        self.ass[p.var()] = lbool::new(p.sign());
        self.vardata[p.var()] = VarData::new(from, self.decision_level() as i32);
        self.trail.push(p);
    }

    /// Increase a variable with the current 'bump' value.
    fn var_bump_activity(&mut self, order_heap_data: &mut HeapData<Var>, v: Var) {
        self.activity[v] += self.var_inc;
        if self.activity[v] > 1e100 {
            // Rescale:
            for (_, x) in self.activity.iter_mut() {
                *x *= 1e-100;
            }
            self.var_inc *= 1e-100;
        }

        // Update order_heap with respect to new activity:
        let mut order_heap = order_heap_data.promote(VarOrder {
            activity: &self.activity,
        });
        if order_heap.in_heap(v) {
            order_heap.decrease(v);
        }
    }
}

mod utils {
    /// Finite subsequences of the Luby-sequence:
    ///
    /// > 0: 1
    /// > 1: 1 1 2
    /// > 2: 1 1 2 1 1 2 4
    /// > 3: 1 1 2 1 1 2 4 1 1 2 1 1 2 4 8
    /// ...
    pub(super) fn luby(y: f64, mut x: i32) -> f64 {
        // Find the finite subsequence that contains index 'x', and the
        // size of that subsequence:
        let mut size = 1;
        let mut seq = 0;
        while size < x + 1 {
            seq += 1;
            size = 2 * size + 1;
        }

        while size - 1 != x {
            size = (size - 1) >> 1;
            seq -= 1;
            x = x % size;
        }

        f64::powi(y, seq)
    }

    #[cfg(test)]
    mod test {
        #[test]
        fn luby_prefix() {
            let s: Vec<f64> = (0..15).map(|i| super::luby(2.0, i)).collect();
            assert_eq!(
                s,
                vec![1., 1., 2., 1., 1., 2., 4., 1., 1., 2., 1., 1., 2., 4., 8.]
            );
        }
    }
}

impl Default for VarData {
    fn default() -> Self {
        Self {
            reason: CRef::UNDEF,
            level: 0,
        }
    }
}

impl VarData {
    #[inline(always)]
    fn new(reason: CRef, level: i32) -> Self {
        Self { reason, level }
    }
}

impl PartialEq for Watcher {
    #[inline(always)]
    fn eq(&self, rhs: &Self) -> bool {
        self.cref == rhs.cref
    }
}
impl Eq for Watcher {}

impl Watcher {
    fn new(cref: CRef, blocker: Lit) -> Self {
        Self { cref, blocker }
    }
}

impl<'a> Comparator<Var> for VarOrder<'a> {
    fn cmp(&self, lhs: &Var, rhs: &Var) -> cmp::Ordering {
        // higher activity first; ties go to the lower variable id
        PartialOrd::partial_cmp(&self.activity[*rhs], &self.activity[*lhs])
            .expect("NaN activity")
            .then_with(|| lhs.idx().cmp(&rhs.idx()))
    }
}

impl<'a> DeletePred<Watcher> for WatcherDeleted<'a> {
    #[inline]
    fn deleted(&self, w: &Watcher) -> bool {
        self.ca.get_ref(w.cref).mark() == 1
    }
}

impl Default for Seen {
    #[inline]
    fn default() -> Self {
        Seen::UNDEF
    }
}

impl Seen {
    #[inline(always)]
    fn is_seen(&self) -> bool {
        *self != Seen::UNDEF
    }
}

/// Tunable search parameters, validated by [`SolverOpts::check`].
#[derive(Debug, Clone)]
pub struct SolverOpts {
    pub var_decay: f64,
    pub clause_decay: f64,
    pub ccmin_mode: i32,
    pub phase_saving: i32,
    pub luby_restart: bool,
    pub restart_first: i32,
    pub restart_inc: f64,
    pub garbage_frac: f64,
    pub min_learnts_lim: i32,
}

impl Default for SolverOpts {
    fn default() -> SolverOpts {
        Self {
            var_decay: 0.95,
            clause_decay: 0.999,
            ccmin_mode: 2,
            phase_saving: 2,
            luby_restart: true,
            restart_first: 100,
            restart_inc: 2.0,
            garbage_frac: 0.20,
            min_learnts_lim: 0,
        }
    }
}

impl SolverOpts {
    /// Check that options are valid.
    pub fn check(&self) -> bool {
        (0.0 < self.var_decay && self.var_decay < 1.0)
            && (0.0 < self.clause_decay && self.clause_decay < 1.0)
            && (0 <= self.ccmin_mode && self.ccmin_mode <= 2)
            && (0 <= self.phase_saving && self.phase_saving <= 2)
            && 1 <= self.restart_first
            && (1.0 < self.restart_inc && self.restart_inc < f64::INFINITY)
            && (0.0 < self.garbage_frac && self.garbage_frac < f64::INFINITY)
            && 0 <= self.min_learnts_lim
    }
}
