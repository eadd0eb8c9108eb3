//! Envelope constraints: force the model above or below the data.

use crate::domain::FitKind;
use crate::math::Expr;
use crate::nlp::{Constraint, Problem};

/// Attach the envelope constraints for the chosen fit kind. The objective is
/// untouched: an envelope fit still minimizes the selected residual norm, it
/// just does so over the feasible side of the data.
pub fn apply_envelope(problem: &mut Problem, predictions: &[Expr], y: &[f64], kind: FitKind) {
    match kind {
        FitKind::Best => {}
        FitKind::UpperBound => {
            for (prediction, &observed) in predictions.iter().zip(y) {
                problem.subject_to(Constraint::ge(prediction.clone(), observed));
            }
        }
        FitKind::LowerBound => {
            for (prediction, &observed) in predictions.iter().zip(y) {
                problem.subject_to(Constraint::le(prediction.clone(), observed));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_predictions() -> (Problem, Vec<Expr>, Vec<f64>) {
        let mut problem = Problem::new();
        let c = problem.variable(0.0);
        let predictions = vec![c.expr(), c.expr()];
        (problem, predictions, vec![1.0, 3.0])
    }

    #[test]
    fn best_fit_adds_nothing() {
        let (mut problem, predictions, y) = constant_predictions();
        apply_envelope(&mut problem, &predictions, &y, FitKind::Best);
        assert!(problem.constraints().is_empty());
    }

    #[test]
    fn upper_bound_constrains_every_observation() {
        let (mut problem, predictions, y) = constant_predictions();
        apply_envelope(&mut problem, &predictions, &y, FitKind::UpperBound);
        assert_eq!(problem.constraints().len(), 2);
        // c = 2 satisfies c >= 1 but violates c >= 3.
        let values: Vec<f64> = problem
            .constraints()
            .iter()
            .map(|c| c.expr().eval(&[2.0]))
            .collect();
        assert!(values[0] > 0.0);
        assert!(values[1] < 0.0);
    }
}
