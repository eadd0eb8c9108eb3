//! Nonlinear-programming problem assembly and solving.
//!
//! Responsibilities:
//!
//! - collect decision variables (guess + optional bounds), inequality and
//!   equality constraints, and a scalar objective into a [`Problem`]
//! - define the narrow solver seam ([`NlpSolver`]) the fitting engine
//!   delegates to
//! - provide the default backend ([`AugLagSolver`]): an augmented-Lagrangian
//!   outer loop around a BFGS inner solver

pub mod auglag;
pub mod problem;
pub mod solver;

pub use auglag::*;
pub use problem::*;
pub use solver::*;
