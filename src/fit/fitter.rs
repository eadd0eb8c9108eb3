//! The fitting entry point.
//!
//! `fit_model` runs the whole pipeline:
//! normalize → build problem → objective → envelope → solve → extract.
//!
//! The solve is a single blocking call into the solver backend; there is no
//! retry and no alternate starting point. A failed solve is a failed fit.

use std::collections::BTreeMap;

use crate::domain::{FitInput, FitOptions, SolvedValue};
use crate::error::FitError;
use crate::models::{FittedModel, Model, SolvedParameters};
use crate::nlp::{AugLagSolver, NlpSolver};

use super::{apply_envelope, apply_objective, build_problem, normalize_inputs};

/// Fit `model` to `(x_data, y_data)` with the default solver backend.
///
/// Parameters are initialized at `parameter_guesses` and optimized to
/// minimize the configured residual norm, subject to any bounds and envelope
/// constraints in `options`.
pub fn fit_model<M: Model>(
    model: M,
    x_data: impl Into<FitInput>,
    y_data: Vec<f64>,
    parameter_guesses: BTreeMap<String, f64>,
    options: &FitOptions,
) -> Result<FittedModel<M>, FitError> {
    fit_model_with(
        model,
        x_data,
        y_data,
        parameter_guesses,
        options,
        &AugLagSolver::default(),
    )
}

/// Fit `model` using a caller-supplied solver backend.
pub fn fit_model_with<M, S>(
    model: M,
    x_data: impl Into<FitInput>,
    y_data: Vec<f64>,
    parameter_guesses: BTreeMap<String, f64>,
    options: &FitOptions,
    solver: &S,
) -> Result<FittedModel<M>, FitError>
where
    M: Model,
    S: NlpSolver,
{
    // 1) Validate and normalize inputs.
    let inputs = normalize_inputs(x_data.into(), y_data, &parameter_guesses, options)?;
    log::debug!(
        "fitting {} parameter(s) to {} observation(s): norm {}, kind {}, logspace {}",
        inputs.params.len(),
        inputs.y.len(),
        options.residual_norm,
        options.fit_kind,
        inputs.logspace
    );

    // 2) Declare decision variables and form the symbolic residual.
    let mut fit = build_problem(&model, &inputs)?;

    // 3) Attach the norm objective (plus any auxiliary variables).
    apply_objective(
        &mut fit.problem,
        &fit.residuals,
        &inputs.weights,
        options.residual_norm,
    );

    // 4) Attach envelope constraints.
    apply_envelope(&mut fit.problem, &fit.predictions, &inputs.y, options.fit_kind);

    // 5) Solve (blocking). Non-convergence propagates unrecovered.
    let solution = solver.solve(&fit.problem)?;

    // 6) Extract parameter values. A per-parameter extraction failure
    //    degrades that parameter to a marker; the fit still succeeds.
    let mut entries = Vec::with_capacity(fit.param_vars.len());
    for (name, var) in &fit.param_vars {
        let value = match solution.value(*var) {
            Ok(value) => SolvedValue::Converged(value),
            Err(err) => {
                log::warn!("could not extract parameter `{name}` from the solution: {err}");
                SolvedValue::ExtractionFailed
            }
        };
        entries.push((name.clone(), value));
    }
    let parameters = SolvedParameters::new(entries);

    log::info!(
        "fit complete: {} {} fit of {} parameter(s), objective {:.6e}",
        options.residual_norm,
        options.fit_kind,
        parameters.len(),
        solution.objective()
    );

    Ok(FittedModel::new(model, parameters, inputs.x, inputs.y))
}
