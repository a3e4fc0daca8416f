/*****************************************************************************************[lib.rs]
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

//======== LOG ============

// stubs when logging is not enabled
#[cfg(not(feature = "logging"))]
#[macro_use]
pub(crate) mod log {
    macro_rules! trace {
        ($( $x:expr ),*) => {};
    }
    macro_rules! debug {
        ($( $x:expr ),*) => {};
    }
    macro_rules! info {
        ($( $x:expr ),*) => {};
    }
}

#[cfg(feature = "logging")]
#[macro_use]
pub extern crate log;

//======== ERRORS ============

use std::{fmt, io};

/// Everything that can go wrong while building or running a solver.
///
/// `SAT`/`UNSAT` are ordinary results and never reported through this type;
/// a permanently unsatisfiable instance simply answers `Ok(false)`.
#[derive(Debug)]
pub enum Error {
    /// A clause contained a zero literal or referenced a variable beyond
    /// the declared range. The solver state is unchanged.
    InvalidInput(String),
    /// The clause arena is full. The instance is unusable afterwards;
    /// discard it and retry with a larger `mem_max`.
    OutOfMemory,
    /// The cancellation flag (or a callback `stop()`) ended the search
    /// before a verdict was reached.
    Aborted,
    /// Malformed DIMACS input.
    Parse(String),
    /// Underlying I/O failure while reading or writing DIMACS.
    Io(io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(out, "invalid input: {}", msg),
            Error::OutOfMemory => write!(out, "out of memory: clause arena exhausted"),
            Error::Aborted => write!(out, "search aborted"),
            Error::Parse(msg) => write!(out, "parse error: {}", msg),
            Error::Io(e) => write!(out, "i/o error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

//======== PUBLIC INTERFACE ============

pub mod callbacks;
pub mod clause;
pub mod core;
pub mod dimacs;
pub mod idx;
pub mod interface;

pub use crate::{
    callbacks::{Basic as BasicCallbacks, Callbacks, ProgressStatus, Stats as StatsCallbacks},
    clause::{display::Print, lbool, LMap, Lit, VMap, Var},
    core::{Solver, SolverOpts},
    dimacs::CnfWriter,
    interface::SolverInterface,
};

/// Basic solver with no-op callbacks.
pub type BasicSolver = Solver<BasicCallbacks>;
