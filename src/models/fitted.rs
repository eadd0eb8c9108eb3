//! The immutable result of a successful fit.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{FitInput, SolvedValue};
use crate::error::FitError;
use crate::math::Expr;
use crate::models::{Model, Params};

/// Solved parameter values, in decision-variable order.
///
/// Each parameter carries its own outcome: a converged value, or an
/// extraction-failure marker when the solver's solution could not report
/// that variable (the fit as a whole still succeeded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolvedParameters {
    entries: Vec<(String, SolvedValue)>,
}

impl SolvedParameters {
    pub(crate) fn new(entries: Vec<(String, SolvedValue)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<SolvedValue> {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, value)| *value)
    }

    /// The numeric value of one parameter; NaN if its extraction failed.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).map(|v| v.as_f64())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SolvedValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any parameter's value could not be extracted from the solve.
    pub fn any_failed(&self) -> bool {
        self.entries.iter().any(|(_, value)| value.is_failed())
    }
}

/// A model fitted to data: the original model plus solved parameters and a
/// copy of the training dataset.
///
/// Immutable once constructed, and safe to evaluate from multiple threads.
/// Evaluation substitutes the solved parameters into the model — nothing is
/// ever re-optimized.
#[derive(Debug, Clone)]
pub struct FittedModel<M> {
    model: M,
    parameters: SolvedParameters,
    x_data: FitInput,
    y_data: Vec<f64>,
}

impl<M: Model> FittedModel<M> {
    pub(crate) fn new(
        model: M,
        parameters: SolvedParameters,
        x_data: FitInput,
        y_data: Vec<f64>,
    ) -> Self {
        Self {
            model,
            parameters,
            x_data,
            y_data,
        }
    }

    /// Evaluate the fitted model at new input.
    ///
    /// The input must have the same shape as the training x data: a scalar
    /// sequence for a scalar-trained model, or named series with exactly the
    /// training series names otherwise. Series may have any common length.
    pub fn predict(&self, x: &FitInput) -> Result<Vec<f64>, FitError> {
        self.check_shape(x)?;

        let params = Params::new(
            self.parameters
                .iter()
                .map(|(name, value)| (name.to_string(), Expr::constant(value.as_f64())))
                .collect(),
        );
        let predictions = self.model.eval(x, &params);
        if predictions.len() != x.len() {
            return Err(FitError::ModelOutputLength {
                got: predictions.len(),
                expected: x.len(),
            });
        }
        Ok(predictions.iter().map(|expr| expr.eval(&[])).collect())
    }

    fn check_shape(&self, x: &FitInput) -> Result<(), FitError> {
        match (&self.x_data, x) {
            (FitInput::Scalar(_), FitInput::Scalar(_)) => Ok(()),
            (FitInput::Scalar(_), FitInput::Named(_)) => Err(FitError::ExpectedScalarInput),
            (FitInput::Named(_), FitInput::Scalar(_)) => Err(FitError::ExpectedNamedInput),
            (FitInput::Named(trained), FitInput::Named(given)) => {
                for name in trained.keys() {
                    if !given.contains_key(name) {
                        return Err(FitError::MissingInputSeries { name: name.clone() });
                    }
                }
                for (name, series) in given {
                    if !trained.contains_key(name) {
                        return Err(FitError::UnexpectedInputSeries { name: name.clone() });
                    }
                    if series.len() != x.len() {
                        return Err(FitError::LengthMismatch {
                            name: name.clone(),
                            len: series.len(),
                            expected: x.len(),
                        });
                    }
                }
                Ok(())
            }
        }
    }

    /// Number of distinct input series the model expects (1 for scalar).
    pub fn input_dimensionality(&self) -> usize {
        self.x_data.dimensionality()
    }

    /// Expected input series names, or `None` for scalar input.
    pub fn input_names(&self) -> Option<Vec<&str>> {
        self.x_data.names()
    }

    pub fn parameters(&self) -> &SolvedParameters {
        &self.parameters
    }

    /// The x data the model was fitted on.
    pub fn x_data(&self) -> &FitInput {
        &self.x_data
    }

    /// The y data the model was fitted on.
    pub fn y_data(&self) -> &[f64] {
        &self.y_data
    }

    /// Linear-space residuals `prediction - y` over the training data.
    pub fn residuals(&self) -> Result<Vec<f64>, FitError> {
        let predictions = self.predict(&self.x_data)?;
        Ok(predictions
            .iter()
            .zip(&self.y_data)
            .map(|(pred, y)| pred - y)
            .collect())
    }

    /// Unweighted root-mean-square error over the training data.
    pub fn rmse(&self) -> Result<f64, FitError> {
        let residuals = self.residuals()?;
        let sse: f64 = residuals.iter().map(|r| r * r).sum();
        Ok((sse / residuals.len() as f64).sqrt())
    }
}

impl<M> fmt::Display for FittedModel<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "FittedModel [R^{} -> R^1]",
            self.x_data.dimensionality()
        )?;
        match self.x_data.names() {
            Some(names) => write!(f, "  input: named series {{{}}}", names.join(", ")),
            None => write!(f, "  input: a scalar sequence"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SolvedValue;

    fn line_model() -> impl Model {
        |x: &FitInput, p: &Params| -> Vec<Expr> {
            x.scalar()
                .iter()
                .map(|&xi| p.get("m") * xi + p.get("b"))
                .collect()
        }
    }

    fn fitted_line() -> FittedModel<impl Model> {
        FittedModel::new(
            line_model(),
            SolvedParameters::new(vec![
                ("b".to_string(), SolvedValue::Converged(1.0)),
                ("m".to_string(), SolvedValue::Converged(2.0)),
            ]),
            FitInput::from(vec![0.0, 1.0, 2.0]),
            vec![1.0, 3.0, 5.0],
        )
    }

    #[test]
    fn predict_substitutes_solved_parameters() {
        let fitted = fitted_line();
        let y = fitted.predict(&FitInput::from(vec![10.0])).unwrap();
        assert_eq!(y, vec![21.0]);
    }

    #[test]
    fn predict_rejects_named_input_for_scalar_model() {
        let fitted = fitted_line();
        let named = FitInput::named([("x", vec![1.0])]);
        assert!(matches!(
            fitted.predict(&named),
            Err(FitError::ExpectedScalarInput)
        ));
    }

    #[test]
    fn residuals_and_rmse_on_exact_fit_are_zero() {
        let fitted = fitted_line();
        let residuals = fitted.residuals().unwrap();
        assert!(residuals.iter().all(|r| r.abs() < 1e-12));
        assert!(fitted.rmse().unwrap() < 1e-12);
    }

    #[test]
    fn failed_extraction_is_visible_and_nan() {
        let fitted = FittedModel::new(
            line_model(),
            SolvedParameters::new(vec![
                ("b".to_string(), SolvedValue::ExtractionFailed),
                ("m".to_string(), SolvedValue::Converged(2.0)),
            ]),
            FitInput::from(vec![0.0]),
            vec![0.0],
        );
        assert!(fitted.parameters().any_failed());
        assert!(fitted.parameters().value("b").unwrap().is_nan());
        let y = fitted.predict(&FitInput::from(vec![1.0])).unwrap();
        assert!(y[0].is_nan());
    }

    #[test]
    fn display_shows_input_signature() {
        let fitted = fitted_line();
        let text = fitted.to_string();
        assert!(text.contains("R^1 -> R^1"), "got: {text}");
        assert!(text.contains("scalar sequence"), "got: {text}");
    }
}
