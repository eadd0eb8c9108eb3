//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they
//! can be:
//!
//! - used in-memory during fitting
//! - embedded in caller-side configuration files
//! - inspected after a fit (solved parameters, training data)

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// Which norm of the residual vector the fit minimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidualNorm {
    /// Sum of absolute residuals. Less sensitive to outliers.
    L1,
    /// Weighted sum of squared residuals. The default.
    #[default]
    L2,
    /// Worst-case absolute residual. More sensitive to outliers.
    Linf,
}

impl FromStr for ResidualNorm {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "l1" => Ok(ResidualNorm::L1),
            "l2" => Ok(ResidualNorm::L2),
            "linf" => Ok(ResidualNorm::Linf),
            _ => Err(FitError::UnknownResidualNorm(s.to_string())),
        }
    }
}

impl fmt::Display for ResidualNorm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResidualNorm::L1 => "L1",
            ResidualNorm::L2 => "L2",
            ResidualNorm::Linf => "Linf",
        };
        write!(f, "{name}")
    }
}

/// Whether the fit is a free best fit or a one-sided envelope of the data.
///
/// Envelope fits still minimize the chosen residual norm; they additionally
/// constrain the model to stay on one side of every observation. This is
/// useful for conservative surrogate models where undershooting (or
/// overshooting) the data is unacceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitKind {
    /// Unconstrained minimization of the chosen norm.
    #[default]
    Best,
    /// Require `prediction_i >= y_i` for every observation.
    UpperBound,
    /// Require `prediction_i <= y_i` for every observation.
    LowerBound,
}

impl FromStr for FitKind {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept "upper bound", "upper-bound", and "upper_bound" alike.
        let normalized: String = s
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '-' || c == '_' { ' ' } else { c })
            .collect();
        match normalized.trim() {
            "best" => Ok(FitKind::Best),
            "upper bound" => Ok(FitKind::UpperBound),
            "lower bound" => Ok(FitKind::LowerBound),
            _ => Err(FitError::UnknownFitKind(s.to_string())),
        }
    }
}

impl fmt::Display for FitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FitKind::Best => "best",
            FitKind::UpperBound => "upper bound",
            FitKind::LowerBound => "lower bound",
        };
        write!(f, "{name}")
    }
}

/// Box bound on a single parameter. Absent sides are unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ParamBound {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl ParamBound {
    pub fn new(lower: Option<f64>, upper: Option<f64>) -> Self {
        Self { lower, upper }
    }

    /// Bound with both sides present.
    pub fn between(lower: f64, upper: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    pub fn at_least(lower: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
        }
    }

    pub fn at_most(upper: f64) -> Self {
        Self {
            lower: None,
            upper: Some(upper),
        }
    }

    /// A bound is malformed if a present side is non-finite or the sides
    /// are inverted.
    pub(crate) fn is_malformed(&self) -> bool {
        if self.lower.is_some_and(|v| !v.is_finite()) {
            return true;
        }
        if self.upper.is_some_and(|v| !v.is_finite()) {
            return true;
        }
        matches!((self.lower, self.upper), (Some(lo), Some(hi)) if lo > hi)
    }
}

/// The x-data of a dataset: either a single unnamed sequence or a set of
/// named series.
///
/// The variant is decided once, during input validation, and carried through
/// every downstream stage — the shape is never re-detected by structural
/// probing. A fitted model only accepts evaluation inputs of the same
/// variant (and, for `Named`, the same series names).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FitInput {
    /// One-dimensional input: the model sees a bare sequence.
    Scalar(Vec<f64>),
    /// Multi-dimensional input: the model looks series up by name.
    Named(BTreeMap<String, Vec<f64>>),
}

impl FitInput {
    /// Build a named input from `(name, series)` pairs.
    pub fn named<I, S>(series: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        FitInput::Named(
            series
                .into_iter()
                .map(|(name, values)| (name.into(), values))
                .collect(),
        )
    }

    /// Number of distinct input series (1 for scalar input).
    pub fn dimensionality(&self) -> usize {
        match self {
            FitInput::Scalar(_) => 1,
            FitInput::Named(series) => series.len(),
        }
    }

    /// Series names, or `None` for scalar input.
    pub fn names(&self) -> Option<Vec<&str>> {
        match self {
            FitInput::Scalar(_) => None,
            FitInput::Named(series) => Some(series.keys().map(String::as_str).collect()),
        }
    }

    /// Number of observations.
    ///
    /// For named input this is the length of the first series; the
    /// normalizer guarantees all series agree.
    pub fn len(&self) -> usize {
        match self {
            FitInput::Scalar(values) => values.len(),
            FitInput::Named(series) => series.values().next().map_or(0, Vec::len),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The bare sequence of a scalar input.
    ///
    /// # Panics
    /// Panics if the input is named. Models written for scalar input should
    /// only ever be fitted/evaluated with scalar data; the fitting pipeline
    /// validates the shape before the model runs.
    pub fn scalar(&self) -> &[f64] {
        match self {
            FitInput::Scalar(values) => values,
            FitInput::Named(_) => panic!("expected scalar x input, found named series"),
        }
    }

    /// A named series.
    ///
    /// # Panics
    /// Panics if the input is scalar or the series does not exist.
    pub fn series(&self, name: &str) -> &[f64] {
        match self {
            FitInput::Scalar(_) => panic!("expected named x input, found a scalar sequence"),
            FitInput::Named(series) => series
                .get(name)
                .unwrap_or_else(|| panic!("x input has no series named `{name}`")),
        }
    }
}

impl From<Vec<f64>> for FitInput {
    fn from(values: Vec<f64>) -> Self {
        FitInput::Scalar(values)
    }
}

impl From<&[f64]> for FitInput {
    fn from(values: &[f64]) -> Self {
        FitInput::Scalar(values.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for FitInput {
    fn from(values: [f64; N]) -> Self {
        FitInput::Scalar(values.to_vec())
    }
}

impl From<BTreeMap<String, Vec<f64>>> for FitInput {
    fn from(series: BTreeMap<String, Vec<f64>>) -> Self {
        FitInput::Named(series)
    }
}

/// Fitting options that affect how the optimization problem is assembled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Residual norm to minimize.
    pub residual_norm: ResidualNorm,

    /// Best fit or one-sided envelope.
    pub fit_kind: FitKind,

    /// Optional box bounds on a subset of the parameters. Every key must
    /// name a parameter present in the guesses.
    pub bounds: BTreeMap<String, ParamBound>,

    /// Optional per-observation weights (length n, nonnegative). Normalized
    /// to sum to 1 before use; uniform if absent.
    pub weights: Option<Vec<f64>>,

    /// Fit `log(prediction) - log(y)` instead of `prediction - y`.
    ///
    /// Minimizes relative rather than absolute error; requires strictly
    /// positive y data.
    pub logspace_residuals: bool,
}

/// One named parameter of the optimization problem: its initial guess and
/// optional bound, in the order decision variables are created.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub guess: f64,
    pub bound: Option<ParamBound>,
}

/// Outcome of extracting one parameter's value from a solver solution.
///
/// A solve can succeed as a whole while an individual variable's value
/// cannot be retrieved; that parameter is marked `ExtractionFailed` instead
/// of silently becoming an ordinary-looking number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolvedValue {
    Converged(f64),
    ExtractionFailed,
}

impl SolvedValue {
    /// The numeric value; NaN if extraction failed.
    pub fn as_f64(&self) -> f64 {
        match self {
            SolvedValue::Converged(value) => *value,
            SolvedValue::ExtractionFailed => f64::NAN,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SolvedValue::ExtractionFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residual_norm_parses_case_insensitively() {
        assert_eq!("L1".parse::<ResidualNorm>().unwrap(), ResidualNorm::L1);
        assert_eq!("l2".parse::<ResidualNorm>().unwrap(), ResidualNorm::L2);
        assert_eq!("LINF".parse::<ResidualNorm>().unwrap(), ResidualNorm::Linf);
        assert!("l3".parse::<ResidualNorm>().is_err());
    }

    #[test]
    fn fit_kind_parses_separator_variants() {
        assert_eq!("best".parse::<FitKind>().unwrap(), FitKind::Best);
        assert_eq!("upper bound".parse::<FitKind>().unwrap(), FitKind::UpperBound);
        assert_eq!("Upper-Bound".parse::<FitKind>().unwrap(), FitKind::UpperBound);
        assert_eq!("lower_bound".parse::<FitKind>().unwrap(), FitKind::LowerBound);
        assert!("tight".parse::<FitKind>().is_err());
    }

    #[test]
    fn bound_malformedness() {
        assert!(!ParamBound::between(0.0, 1.0).is_malformed());
        assert!(!ParamBound::at_least(0.0).is_malformed());
        assert!(ParamBound::between(2.0, 1.0).is_malformed());
        assert!(ParamBound::at_most(f64::NAN).is_malformed());
    }

    #[test]
    fn fit_input_shape_helpers() {
        let scalar = FitInput::from(vec![1.0, 2.0, 3.0]);
        assert_eq!(scalar.dimensionality(), 1);
        assert_eq!(scalar.len(), 3);
        assert!(scalar.names().is_none());

        let named = FitInput::named([("alpha", vec![0.0, 1.0]), ("mach", vec![0.3, 0.5])]);
        assert_eq!(named.dimensionality(), 2);
        assert_eq!(named.len(), 2);
        assert_eq!(named.names().unwrap(), vec!["alpha", "mach"]);
        assert_eq!(named.series("mach"), &[0.3, 0.5]);
    }
}
