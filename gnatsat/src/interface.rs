/* Main Interface */

use crate::Result;

/// The clause-accepting surface shared by the solver and the CNF writer.
///
/// The DIMACS reader is generic over this trait, so the same parsing code
/// can feed a [`crate::Solver`] or re-emit a file through
/// [`crate::CnfWriter`].
pub trait SolverInterface {
    /// Number of declared variables. Valid DIMACS ids are `1..=num_vars()`.
    fn num_vars(&self) -> u32;

    /// `false` once the instance is known to be permanently unsatisfiable.
    fn is_ok(&self) -> bool;

    /// Append a clause given as signed DIMACS literals.
    ///
    /// A single trailing `0` sentinel is tolerated. Fails with
    /// `Error::InvalidInput` on an interior zero or a variable beyond
    /// `num_vars()`, and with `Error::OutOfMemory` if clause storage is
    /// exhausted.
    fn add_clause(&mut self, lits: &[i32]) -> Result<()>;
}
