//! Input validation and normalization.
//!
//! Everything that can be rejected before optimization work begins is
//! rejected here, with an error naming the offending field. The output is a
//! [`NormalizedFit`]: flattened numeric series, a weight vector that sums to
//! 1, and an ordered list of parameter specifications.

use std::collections::BTreeMap;

use crate::domain::{FitInput, FitOptions, ParamSpec};
use crate::error::FitError;

/// Validated, normalized fit inputs.
#[derive(Debug, Clone)]
pub struct NormalizedFit {
    /// The x data; the scalar-vs-named discriminator is decided here and
    /// never re-detected downstream.
    pub x: FitInput,
    pub y: Vec<f64>,
    /// Normalized weights: nonnegative, sum exactly rescaled to 1.
    pub weights: Vec<f64>,
    /// Parameters in decision-variable order.
    pub params: Vec<ParamSpec>,
    pub logspace: bool,
}

/// Validate raw inputs and produce a [`NormalizedFit`].
pub fn normalize_inputs(
    x_data: FitInput,
    y_data: Vec<f64>,
    parameter_guesses: &BTreeMap<String, f64>,
    options: &FitOptions,
) -> Result<NormalizedFit, FitError> {
    let n = y_data.len();
    if n == 0 {
        return Err(FitError::EmptyDataset);
    }
    check_series("y_data", &y_data, n)?;

    match &x_data {
        FitInput::Scalar(values) => check_series("x_data", values, n)?,
        FitInput::Named(series) => {
            if series.is_empty() {
                return Err(FitError::EmptyNamedInput);
            }
            for (name, values) in series {
                check_series(name, values, n)?;
            }
        }
    }

    let weights = match &options.weights {
        None => vec![1.0 / n as f64; n],
        Some(raw) => {
            check_series("weights", raw, n)?;
            for (index, &value) in raw.iter().enumerate() {
                if value < 0.0 {
                    return Err(FitError::NegativeWeight { index, value });
                }
            }
            let total: f64 = raw.iter().sum();
            if total <= 0.0 {
                return Err(FitError::DegenerateWeights);
            }
            raw.iter().map(|value| value / total).collect()
        }
    };

    for (name, bound) in &options.bounds {
        if !parameter_guesses.contains_key(name) {
            return Err(FitError::UnknownBoundParameter { name: name.clone() });
        }
        if bound.is_malformed() {
            return Err(FitError::MalformedBound {
                name: name.clone(),
                lower: bound.lower,
                upper: bound.upper,
            });
        }
    }

    if options.logspace_residuals {
        for (index, &value) in y_data.iter().enumerate() {
            if value <= 0.0 {
                return Err(FitError::NonPositiveLogY { index, value });
            }
        }
    }

    let mut params = Vec::with_capacity(parameter_guesses.len());
    for (name, &guess) in parameter_guesses {
        if !guess.is_finite() {
            return Err(FitError::NonFiniteGuess { name: name.clone() });
        }
        params.push(ParamSpec {
            name: name.clone(),
            guess,
            bound: options.bounds.get(name).copied(),
        });
    }

    Ok(NormalizedFit {
        x: x_data,
        y: y_data,
        weights,
        params,
        logspace: options.logspace_residuals,
    })
}

fn check_series(name: &str, values: &[f64], expected: usize) -> Result<(), FitError> {
    if values.len() != expected {
        return Err(FitError::LengthMismatch {
            name: name.to_string(),
            len: values.len(),
            expected,
        });
    }
    if let Some(index) = values.iter().position(|value| !value.is_finite()) {
        return Err(FitError::NonFiniteData {
            name: name.to_string(),
            index,
        });
    }
    Ok(())
}
