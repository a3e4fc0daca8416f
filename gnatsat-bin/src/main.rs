/*****************************************************************************************[main.rs]
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

extern crate clap;
extern crate cpu_time;
extern crate flate2;
extern crate gnatsat;

#[cfg(not(feature = "logging"))]
#[macro_use]
pub(crate) mod log {
    macro_rules! debug {
        ($( $x:expr ),*) => {};
    }
}

#[cfg(not(feature = "logging"))]
mod env_logger {
    pub fn init() {}
}

#[cfg(feature = "logging")]
extern crate env_logger;

#[cfg(feature = "logging")]
#[macro_use]
extern crate log;

use clap::{App, Arg};
use flate2::bufread::GzDecoder;
use gnatsat::{
    dimacs, lbool, Callbacks, Error, ProgressStatus, Solver, SolverOpts,
};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::process::exit;
use std::time::Instant;

mod system;

/// Initial arena capacity when none is given on the command line.
const DEFAULT_MEM_MAX: u32 = 1 << 20;

fn main() {
    env_logger::init();
    let exitcode = main2().unwrap_or_else(|err| {
        eprintln!("c ERROR: {}", err);
        2
    });
    exit(exitcode);
}

/// Printing callbacks
struct CB {
    pub verbosity: i32,
    pub lim: Option<(system::ResourceMeasure, f64)>,
}

impl CB {
    fn new() -> Self {
        CB {
            verbosity: 0,
            lim: None,
        }
    }
}

impl Callbacks for CB {
    fn on_start(&mut self) {
        if self.verbosity >= 1 {
            println!("c ============================[ Search Statistics ]==============================");
            println!("c | Conflicts |          ORIGINAL         |          LEARNT          |");
            println!("c |           |    Clauses      Literals  |    Limit  Clauses Lit/Cl |");
            println!("c ===============================================================================");
        }
    }

    fn on_result(&mut self, _: lbool) {
        if self.verbosity >= 1 {
            println!(
                "c ==============================================================================="
            );
        }
    }

    fn on_progress<F>(&mut self, p: F)
    where
        F: FnOnce() -> ProgressStatus,
    {
        if self.verbosity >= 1 {
            let p = p();
            println!(
                "c | {:9} | {:10} {:12} | {:8} {:8} {:6.0} |",
                p.conflicts, p.n_clauses, p.n_clause_lits, p.max_learnt, p.n_learnt, p.n_learnt_lits
            );
        }
    }

    fn on_gc(&mut self, old: usize, new: usize) {
        if self.verbosity >= 2 {
            println!(
                "c |  Garbage collection:   {:12} slots => {:12} slots             |",
                old, new
            );
        }
    }

    fn stop(&self) -> bool {
        match self.lim {
            None => false,
            Some((ref r, max_cpu)) => r.cpu_time() > max_cpu,
        }
    }
}

type MSolver = Solver<CB>; // specialized solver

struct Config {
    input_file: String,
    mem_max: u32,
    opts: SolverOpts,
    verbosity: i32,
    is_strict: bool,
    cpu_lim: Option<f64>,
}

fn main2() -> gnatsat::Result<i32> {
    let resource = system::ResourceMeasure::new();

    let matches = App::new("gnatsat")
        .version("0.2.0")
        .about("A small CDCL SAT solver in the MicroSAT/MiniSat lineage")
        .arg(Arg::with_name("input-file").required(true))
        .arg(
            Arg::with_name("mem-max")
                .help("Initial clause arena capacity, in integer slots (doubled on exhaustion)")
                .index(2),
        )
        .arg(
            Arg::with_name("verbosity")
                .long("verb")
                .default_value("1")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("cpu-lim")
                .long("cpu-lim")
                .help("Stop the search after this many CPU seconds")
                .default_value("-1.0")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("is-strict")
                .long("strict")
                .help("Verify the clause count declared in the DIMACS header"),
        )
        .arg(
            Arg::with_name("var-decay")
                .long("var-decay")
                .help("The variable activity decay factor")
                .default_value("0.95")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("clause-decay")
                .long("cla-decay")
                .help("The clause activity decay factor")
                .default_value("0.999")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("ccmin-mode")
                .long("ccmin-mode")
                .help("Controls conflict clause minimization (0=none, 1=basic, 2=deep)")
                .default_value("2")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("phase-saving")
                .long("phase-saving")
                .help("Controls the level of phase saving (0=none, 1=limited, 2=full)")
                .default_value("2")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("luby-restart")
                .long("luby")
                .conflicts_with("no-luby-restart")
                .help("Use the Luby restart sequence [default]"),
        )
        .arg(
            Arg::with_name("no-luby-restart")
                .long("no-luby")
                .help("Use geometrically growing restart intervals instead of Luby"),
        )
        .arg(
            Arg::with_name("restart-first")
                .long("rfirst")
                .help("The base restart interval")
                .default_value("100")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("restart-inc")
                .long("rinc")
                .help("Restart interval increase factor")
                .default_value("2.0")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("garbage-frac")
                .long("gc-frac")
                .help("The fraction of wasted arena slots allowed before a compaction is triggered")
                .default_value("0.20")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("min-learnts-lim")
                .long("min-learnts")
                .help("Minimum learnt clause limit")
                .default_value("0")
                .takes_value(true),
        )
        .get_matches();

    let mut opts = SolverOpts::default();
    opts.var_decay = matches
        .value_of("var-decay")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.var_decay);
    opts.clause_decay = matches
        .value_of("clause-decay")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.clause_decay);
    opts.ccmin_mode = matches
        .value_of("ccmin-mode")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.ccmin_mode);
    opts.phase_saving = matches
        .value_of("phase-saving")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.phase_saving);
    opts.luby_restart = !matches.is_present("no-luby-restart");
    opts.restart_first = matches
        .value_of("restart-first")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.restart_first);
    opts.restart_inc = matches
        .value_of("restart-inc")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.restart_inc);
    opts.garbage_frac = matches
        .value_of("garbage-frac")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.garbage_frac);
    opts.min_learnts_lim = matches
        .value_of("min-learnts-lim")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.min_learnts_lim);

    if !opts.check() {
        eprintln!("c ERROR: invalid option value");
        return Ok(2);
    }

    let verbosity = matches
        .value_of("verbosity")
        .unwrap()
        .parse::<i32>()
        .unwrap_or(0);
    if verbosity < 0 || verbosity > 2 {
        eprintln!("c ERROR: value <{}> is out of range for \"verb\"", verbosity);
        return Ok(2);
    }

    let mut cfg = Config {
        input_file: matches.value_of("input-file").unwrap().to_string(),
        mem_max: matches
            .value_of("mem-max")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MEM_MAX),
        opts,
        verbosity,
        is_strict: matches.is_present("is-strict"),
        cpu_lim: matches
            .value_of("cpu-lim")
            .and_then(|s| s.parse().ok())
            .filter(|x: &f64| *x > 0.),
    };

    // repeat with a doubled arena whenever the solver runs out of memory
    loop {
        match run_solver(&cfg, &resource) {
            Err(Error::OutOfMemory) => {
                let doubled = match cfg.mem_max.checked_mul(2) {
                    Some(m) => m,
                    None => return Err(Error::OutOfMemory),
                };
                if cfg.verbosity > 0 {
                    println!("c arena of {} slots exhausted, retrying with {}", cfg.mem_max, doubled);
                }
                cfg.mem_max = doubled;
            }
            other => return other,
        }
    }
}

fn run_solver(cfg: &Config, resource: &system::ResourceMeasure) -> gnatsat::Result<i32> {
    debug!("solve file {}", &cfg.input_file);
    let file = BufReader::new(File::open(&cfg.input_file)?);

    let mut cb = CB::new();
    cb.verbosity = cfg.verbosity;
    if let Some(max_cpu) = cfg.cpu_lim {
        cb.lim = Some((system::ResourceMeasure::new(), max_cpu));
    }

    let initial_time = Instant::now();
    let mut solver = read_input_autogz(file, cfg, cb)?;

    if solver.cb().verbosity > 0 {
        println!(
            "c |  Number of variables:  {:12}                                         |",
            solver.num_vars()
        );
        println!(
            "c |  Number of clauses:    {:12}                                         |",
            solver.num_clauses()
        );
        let duration = Instant::now() - initial_time;
        println!(
            "c |  Parse time:           {:9}.{:02} s                                       |",
            duration.as_secs(),
            duration.subsec_nanos() / 10_000_000
        );
    }

    let ret = solver.solve_limited()?;
    if solver.cb().verbosity > 0 {
        solver.print_stats();
        println!("c CPU time              : {:.3}s", resource.cpu_time());
    }

    let exitcode = if ret == lbool::TRUE {
        println!("s SATISFIABLE");
        print!("{}", solver.dimacs_model());
        0
    } else if ret == lbool::FALSE {
        println!("s UNSATISFIABLE");
        1
    } else {
        println!("s INDETERMINATE");
        3
    };
    Ok(exitcode)
}

fn read_input_autogz<R: BufRead>(mut input: R, cfg: &Config, cb: CB) -> gnatsat::Result<MSolver> {
    let is_gz = input.fill_buf()?.starts_with(b"\x1F\x8B");
    if is_gz {
        read_input(BufReader::new(GzDecoder::new(input)), cfg, cb)
    } else {
        read_input(input, cfg, cb)
    }
}

fn read_input<R: BufRead>(mut input: R, cfg: &Config, cb: CB) -> gnatsat::Result<MSolver> {
    if cb.verbosity > 0 {
        println!("c ============================[ Problem Statistics ]=============================");
        println!("c |                                                                             |");
    }
    dimacs::parse(
        &mut input,
        |h| Solver::new(h.n_vars, cfg.mem_max, cfg.opts.clone(), cb),
        cfg.is_strict,
    )
}
