//! The solver seam.
//!
//! The fitting engine never solves anything itself; it assembles a
//! [`Problem`] and hands it to an [`NlpSolver`]. Anything that can perform a
//! local gradient-based solve from the declared guesses and report converged
//! variable values can sit behind this trait — the shipped
//! [`crate::nlp::AugLagSolver`], a wrapper around an external NLP engine, or
//! a mock in unit tests.

use crate::error::SolveError;
use crate::nlp::{Problem, Solution};

/// A blocking local solver for an assembled [`Problem`].
pub trait NlpSolver {
    /// Solve the problem starting from its declared initial guesses.
    ///
    /// Non-convergence is an error; there is no automatic retry and no
    /// alternate starting point.
    fn solve(&self, problem: &Problem) -> Result<Solution, SolveError>;
}
