//! Objective strategies: one smooth formulation per residual norm.
//!
//! The solver expects differentiable objectives and constraints, so the
//! non-smooth norms are rewritten as epigraph formulations:
//!
//! - L2 needs nothing — the weighted sum of squares is smooth as-is
//! - L1 introduces one auxiliary per datapoint with `a_i >= ±r_i` and
//!   minimizes their sum
//! - Linf introduces a single auxiliary `t >= ±r_i` for every i and
//!   minimizes it

use crate::domain::ResidualNorm;
use crate::math::Expr;
use crate::nlp::{Constraint, Problem};

/// Attach the objective for the chosen norm, adding auxiliary variables and
/// constraints as needed. The weights are already normalized to sum to 1.
pub fn apply_objective(
    problem: &mut Problem,
    residuals: &[Expr],
    weights: &[f64],
    norm: ResidualNorm,
) {
    match norm {
        ResidualNorm::L2 => {
            let objective = Expr::sum(
                residuals
                    .iter()
                    .zip(weights)
                    .map(|(residual, &weight)| weight * residual.clone().powi(2)),
            );
            problem.minimize(objective);
        }
        ResidualNorm::L1 => {
            let absolute_errors = problem.variable_vec(residuals.len(), 0.0);
            for (aux, residual) in absolute_errors.iter().zip(residuals) {
                problem.subject_to(Constraint::ge(aux.expr(), residual.clone()));
                problem.subject_to(Constraint::ge(aux.expr(), -residual.clone()));
            }
            problem.minimize(Expr::sum(absolute_errors.iter().map(|aux| aux.expr())));
        }
        ResidualNorm::Linf => {
            let worst = problem.variable(0.0);
            for residual in residuals {
                problem.subject_to(Constraint::ge(worst.expr(), residual.clone()));
                problem.subject_to(Constraint::ge(worst.expr(), -residual.clone()));
            }
            problem.minimize(worst.expr());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn residuals_of_two_vars() -> (Problem, Vec<Expr>) {
        let mut problem = Problem::new();
        let a = problem.variable(0.0);
        let b = problem.variable(0.0);
        // Residuals r_0 = a - 1, r_1 = b + 2.
        let residuals = vec![a.expr() - 1.0, b.expr() + 2.0];
        (problem, residuals)
    }

    #[test]
    fn l2_adds_no_variables_or_constraints() {
        let (mut problem, residuals) = residuals_of_two_vars();
        apply_objective(&mut problem, &residuals, &[0.5, 0.5], ResidualNorm::L2);
        assert_eq!(problem.num_variables(), 2);
        assert!(problem.constraints().is_empty());
        // At (a, b) = (0, 0): 0.5·1 + 0.5·4 = 2.5
        let objective = problem.objective().unwrap().eval(&[0.0, 0.0]);
        assert!((objective - 2.5).abs() < 1e-12);
    }

    #[test]
    fn l1_adds_one_auxiliary_per_datapoint() {
        let (mut problem, residuals) = residuals_of_two_vars();
        apply_objective(&mut problem, &residuals, &[0.5, 0.5], ResidualNorm::L1);
        assert_eq!(problem.num_variables(), 4);
        assert_eq!(problem.constraints().len(), 4);
    }

    #[test]
    fn linf_adds_a_single_auxiliary() {
        let (mut problem, residuals) = residuals_of_two_vars();
        apply_objective(&mut problem, &residuals, &[0.5, 0.5], ResidualNorm::Linf);
        assert_eq!(problem.num_variables(), 3);
        assert_eq!(problem.constraints().len(), 4);
        // The objective is the auxiliary itself.
        let objective = problem.objective().unwrap().eval(&[0.0, 0.0, 7.0]);
        assert!((objective - 7.0).abs() < 1e-12);
    }
}
