//! Optimization-problem assembly: decision variables and the residual.

use crate::error::FitError;
use crate::math::Expr;
use crate::models::{Model, Params};
use crate::nlp::{Problem, Var};

use super::NormalizedFit;

/// Floor applied to predictions before taking logs, so a transiently
/// non-positive prediction during the solve cannot produce a non-finite
/// residual. The y data itself is already validated strictly positive.
const LOG_FLOOR: f64 = 1e-300;

/// The assembled problem, before an objective or envelope constraints are
/// attached.
#[derive(Debug)]
pub struct FitProblem {
    pub problem: Problem,
    /// Parameter name and its decision variable, in [`NormalizedFit::params`]
    /// order.
    pub param_vars: Vec<(String, Var)>,
    /// Symbolic model output, one expression per observation.
    pub predictions: Vec<Expr>,
    /// Symbolic residual, one expression per observation.
    pub residuals: Vec<Expr>,
}

/// Create one decision variable per parameter and evaluate the model
/// symbolically at the training data.
pub fn build_problem<M: Model>(
    model: &M,
    inputs: &NormalizedFit,
) -> Result<FitProblem, FitError> {
    let mut problem = Problem::new();
    let mut param_vars = Vec::with_capacity(inputs.params.len());
    let mut entries = Vec::with_capacity(inputs.params.len());

    for spec in &inputs.params {
        let (lower, upper) = spec
            .bound
            .map_or((None, None), |bound| (bound.lower, bound.upper));
        let var = problem.bounded_variable(spec.guess, lower, upper);
        param_vars.push((spec.name.clone(), var));
        entries.push((spec.name.clone(), var.expr()));
    }

    let params = Params::new(entries);
    let predictions = model.eval(&inputs.x, &params);
    if predictions.len() != inputs.y.len() {
        return Err(FitError::ModelOutputLength {
            got: predictions.len(),
            expected: inputs.y.len(),
        });
    }

    let residuals = predictions
        .iter()
        .zip(&inputs.y)
        .map(|(prediction, &y)| {
            if inputs.logspace {
                prediction.clone().max(LOG_FLOOR).ln() - y.ln()
            } else {
                prediction.clone() - y
            }
        })
        .collect();

    Ok(FitProblem {
        problem,
        param_vars,
        predictions,
        residuals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitInput, FitOptions};
    use crate::fit::normalize_inputs;
    use std::collections::BTreeMap;

    fn normalized(logspace: bool) -> NormalizedFit {
        let options = FitOptions {
            logspace_residuals: logspace,
            ..FitOptions::default()
        };
        normalize_inputs(
            FitInput::from(vec![0.0, 1.0, 2.0]),
            vec![1.0, 3.0, 5.0],
            &BTreeMap::from([("b".to_string(), 0.5), ("m".to_string(), 2.0)]),
            &options,
        )
        .unwrap()
    }

    fn line(x: &FitInput, p: &Params) -> Vec<Expr> {
        x.scalar()
            .iter()
            .map(|&xi| p.get("m") * xi + p.get("b"))
            .collect()
    }

    #[test]
    fn variables_start_at_their_guesses() {
        let fit = build_problem(&line, &normalized(false)).unwrap();
        assert_eq!(fit.problem.num_variables(), 2);
        assert_eq!(fit.problem.guesses(), &[0.5, 2.0]);
        assert_eq!(fit.param_vars[0].0, "b");
        assert_eq!(fit.param_vars[1].0, "m");
    }

    #[test]
    fn residuals_evaluate_at_the_guess() {
        let fit = build_problem(&line, &normalized(false)).unwrap();
        // At (b, m) = (0.5, 2.0): predictions [0.5, 2.5, 4.5], y [1, 3, 5].
        let at_guess: Vec<f64> = fit
            .residuals
            .iter()
            .map(|r| r.eval(&[0.5, 2.0]))
            .collect();
        for residual in at_guess {
            assert!((residual + 0.5).abs() < 1e-12, "got {residual}");
        }
    }

    #[test]
    fn logspace_residuals_are_log_ratios() {
        let fit = build_problem(&line, &normalized(true)).unwrap();
        let r0 = fit.residuals[0].eval(&[0.5, 2.0]);
        // log(0.5) - log(1.0)
        assert!((r0 - 0.5_f64.ln()).abs() < 1e-12, "got {r0}");
    }

    #[test]
    fn wrong_model_output_length_is_a_contract_error() {
        let broken = |_x: &FitInput, p: &Params| -> Vec<Expr> { vec![p.get("m")] };
        let err = build_problem(&broken, &normalized(false)).unwrap_err();
        assert!(matches!(
            err,
            FitError::ModelOutputLength { got: 1, expected: 3 }
        ));
    }
}
