//! Error types for fitting and solving.
//!
//! Two layers:
//!
//! - [`FitError`]: everything the fitting pipeline can report — validation
//!   errors (raised before any optimization work), model contract errors, and
//!   solver failures (wrapped transparently).
//! - [`SolveError`]: failures inside a solver backend, plus per-variable
//!   value extraction errors on a [`crate::nlp::Solution`].

use thiserror::Error;

/// Errors reported by the fitting pipeline.
///
/// Validation variants are raised before any solve attempt and name the
/// offending field so callers can correct their inputs.
#[derive(Debug, Error)]
pub enum FitError {
    #[error("dataset is empty; at least one observation is required")]
    EmptyDataset,

    #[error("data series `{name}` has length {len}, but y data has length {expected}")]
    LengthMismatch {
        name: String,
        len: usize,
        expected: usize,
    },

    #[error("data series `{name}` contains a non-finite value at index {index}")]
    NonFiniteData { name: String, index: usize },

    #[error("named x data must contain at least one series")]
    EmptyNamedInput,

    #[error("weights[{index}] = {value} is negative; weights must be nonnegative")]
    NegativeWeight { index: usize, value: f64 },

    #[error("weights must have a positive sum")]
    DegenerateWeights,

    #[error("bound refers to unknown parameter `{name}`")]
    UnknownBoundParameter { name: String },

    #[error("bound for parameter `{name}` is malformed: lower {lower:?}, upper {upper:?}")]
    MalformedBound {
        name: String,
        lower: Option<f64>,
        upper: Option<f64>,
    },

    #[error("initial guess for parameter `{name}` is not finite")]
    NonFiniteGuess { name: String },

    #[error("logspace residuals require strictly positive y data, but y[{index}] = {value}")]
    NonPositiveLogY { index: usize, value: f64 },

    #[error("unknown residual norm `{0}`; expected one of \"L1\", \"L2\", \"Linf\"")]
    UnknownResidualNorm(String),

    #[error("unknown fit kind `{0}`; expected one of \"best\", \"upper bound\", \"lower bound\"")]
    UnknownFitKind(String),

    #[error("model returned {got} predictions for {expected} observations")]
    ModelOutputLength { got: usize, expected: usize },

    #[error("model was fitted on scalar x data but was evaluated with named input")]
    ExpectedScalarInput,

    #[error("model was fitted on named x data but was evaluated with a scalar sequence")]
    ExpectedNamedInput,

    #[error("evaluation input is missing series `{name}`")]
    MissingInputSeries { name: String },

    #[error("evaluation input has unexpected series `{name}`")]
    UnexpectedInputSeries { name: String },

    #[error(transparent)]
    Solve(#[from] SolveError),
}

/// Errors reported by a solver backend.
#[derive(Debug, Error)]
pub enum SolveError {
    #[error("no objective was set on the problem")]
    MissingObjective,

    #[error(
        "solve did not converge after {iterations} iterations \
         (gradient norm {gradient_norm:.3e}, constraint violation {violation:.3e})"
    )]
    DidNotConverge {
        iterations: usize,
        gradient_norm: f64,
        violation: f64,
    },

    #[error("objective or gradient became non-finite at iteration {0}")]
    NonFinite(usize),

    #[error("variable index {index} is not part of this solution")]
    UnknownVariable { index: usize },
}
