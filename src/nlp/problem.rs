//! Declarative optimization-problem container.
//!
//! A [`Problem`] is write-once: the fitting pipeline declares variables,
//! registers constraints, and sets the objective; a solver backend then reads
//! the assembled problem and produces a [`Solution`]. Variables exist only
//! for the duration of one solve — nothing here outlives the fit invocation.

use crate::error::SolveError;
use crate::math::Expr;

/// Handle to one scalar decision variable of a [`Problem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Var {
    index: usize,
}

impl Var {
    pub fn index(&self) -> usize {
        self.index
    }

    /// The variable as an expression, for use in models and constraints.
    pub fn expr(&self) -> Expr {
        Expr::var(self.index)
    }
}

impl From<Var> for Expr {
    fn from(var: Var) -> Expr {
        var.expr()
    }
}

/// Constraint sense. The expression is canonical: `expr >= 0` or `expr = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Inequality,
    Equality,
}

/// A single scalar constraint.
#[derive(Debug, Clone)]
pub struct Constraint {
    expr: Expr,
    kind: ConstraintKind,
}

impl Constraint {
    /// `lhs >= rhs`
    pub fn ge(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Constraint {
            expr: lhs.into() - rhs.into(),
            kind: ConstraintKind::Inequality,
        }
    }

    /// `lhs <= rhs`
    pub fn le(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Constraint {
            expr: rhs.into() - lhs.into(),
            kind: ConstraintKind::Inequality,
        }
    }

    /// `lhs = rhs`
    pub fn eq(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Constraint {
            expr: lhs.into() - rhs.into(),
            kind: ConstraintKind::Equality,
        }
    }

    /// The canonical residual expression (`>= 0` or `= 0` per [`kind`]).
    ///
    /// [`kind`]: Constraint::kind
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }
}

/// An assembled nonlinear program.
#[derive(Debug, Default)]
pub struct Problem {
    guesses: Vec<f64>,
    lower: Vec<Option<f64>>,
    upper: Vec<Option<f64>>,
    constraints: Vec<Constraint>,
    objective: Option<Expr>,
}

impl Problem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an unbounded scalar variable initialized at `guess`.
    pub fn variable(&mut self, guess: f64) -> Var {
        self.bounded_variable(guess, None, None)
    }

    /// Declare a scalar variable with optional box bounds.
    pub fn bounded_variable(
        &mut self,
        guess: f64,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Var {
        let index = self.guesses.len();
        self.guesses.push(guess);
        self.lower.push(lower);
        self.upper.push(upper);
        Var { index }
    }

    /// Declare `n` unbounded variables sharing one initial guess.
    pub fn variable_vec(&mut self, n: usize, guess: f64) -> Vec<Var> {
        (0..n).map(|_| self.variable(guess)).collect()
    }

    /// Register a constraint.
    pub fn subject_to(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Set the scalar objective to minimize. Last call wins.
    pub fn minimize(&mut self, objective: Expr) {
        self.objective = Some(objective);
    }

    pub fn num_variables(&self) -> usize {
        self.guesses.len()
    }

    pub fn guesses(&self) -> &[f64] {
        &self.guesses
    }

    /// Lower bounds, indexed by variable; `None` is unbounded.
    pub fn lower_bounds(&self) -> &[Option<f64>] {
        &self.lower
    }

    /// Upper bounds, indexed by variable; `None` is unbounded.
    pub fn upper_bounds(&self) -> &[Option<f64>] {
        &self.upper
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> Option<&Expr> {
        self.objective.as_ref()
    }
}

/// A converged solve: the value of every declared variable plus the achieved
/// objective.
#[derive(Debug, Clone)]
pub struct Solution {
    values: Vec<f64>,
    objective: f64,
}

impl Solution {
    pub fn new(values: Vec<f64>, objective: f64) -> Self {
        Self { values, objective }
    }

    /// Converged value of one variable.
    ///
    /// Fails if the solution does not carry a value for the variable; the
    /// fitting pipeline downgrades that parameter to an extraction failure
    /// rather than aborting the fit.
    pub fn value(&self, var: Var) -> Result<f64, SolveError> {
        self.values
            .get(var.index)
            .copied()
            .ok_or(SolveError::UnknownVariable { index: var.index })
    }

    pub fn objective(&self) -> f64 {
        self.objective
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_are_created_in_order() {
        let mut problem = Problem::new();
        let a = problem.variable(1.0);
        let b = problem.bounded_variable(2.0, Some(0.0), None);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(problem.guesses(), &[1.0, 2.0]);
        assert_eq!(problem.lower_bounds()[1], Some(0.0));
        assert_eq!(problem.upper_bounds()[1], None);
    }

    #[test]
    fn constraint_canonical_forms() {
        let mut problem = Problem::new();
        let x = problem.variable(0.0);

        // x >= 3  =>  x - 3 >= 0
        let ge = Constraint::ge(x.expr(), 3.0);
        assert_eq!(ge.kind(), ConstraintKind::Inequality);
        assert!((ge.expr().eval(&[5.0]) - 2.0).abs() < 1e-12);

        // x <= 3  =>  3 - x >= 0
        let le = Constraint::le(x.expr(), 3.0);
        assert!((le.expr().eval(&[5.0]) + 2.0).abs() < 1e-12);

        let eq = Constraint::eq(x.expr(), 3.0);
        assert_eq!(eq.kind(), ConstraintKind::Equality);
    }

    #[test]
    fn solution_reports_missing_variable() {
        let mut problem = Problem::new();
        let _a = problem.variable(0.0);
        let b = problem.variable(0.0);

        let partial = Solution::new(vec![1.5], 0.0);
        assert!(partial.value(b).is_err());
    }
}
