//! A small arithmetic expression graph.
//!
//! Models are written against [`Expr`] so that one definition serves two
//! purposes:
//!
//! - during fitting, parameters are variable-backed expressions and the model
//!   produces the symbolic predictions the optimization problem is built from
//! - after fitting, parameters are constants and the same code evaluates
//!   numerically
//!
//! Solver backends need derivatives; [`Expr::eval_dual`] computes a
//! forward-mode directional derivative in one pass, and [`Expr::gradient`]
//! evaluates the columns in parallel.
//!
//! Nodes are shared (`Arc`), so cloning an expression is cheap and subtrees
//! reused by several predictions are stored once.

use std::sync::Arc;

use rayon::prelude::*;

/// A scalar arithmetic expression over decision variables and constants.
#[derive(Debug, Clone)]
pub struct Expr(Arc<Node>);

#[derive(Debug)]
enum Node {
    Const(f64),
    Var(usize),
    Add(Expr, Expr),
    Sub(Expr, Expr),
    Mul(Expr, Expr),
    Div(Expr, Expr),
    Neg(Expr),
    Ln(Expr),
    Exp(Expr),
    Sqrt(Expr),
    Powi(Expr, i32),
    Max(Expr, Expr),
    Min(Expr, Expr),
}

impl Expr {
    pub fn constant(value: f64) -> Self {
        Expr(Arc::new(Node::Const(value)))
    }

    /// A decision-variable reference. Only problems hand these out.
    pub(crate) fn var(index: usize) -> Self {
        Expr(Arc::new(Node::Var(index)))
    }

    pub fn ln(self) -> Self {
        Expr(Arc::new(Node::Ln(self)))
    }

    pub fn exp(self) -> Self {
        Expr(Arc::new(Node::Exp(self)))
    }

    pub fn sqrt(self) -> Self {
        Expr(Arc::new(Node::Sqrt(self)))
    }

    pub fn powi(self, exponent: i32) -> Self {
        Expr(Arc::new(Node::Powi(self, exponent)))
    }

    pub fn max(self, other: impl Into<Expr>) -> Self {
        Expr(Arc::new(Node::Max(self, other.into())))
    }

    pub fn min(self, other: impl Into<Expr>) -> Self {
        Expr(Arc::new(Node::Min(self, other.into())))
    }

    /// Sum of expressions with logarithmic tree depth.
    ///
    /// A left-deep fold would make evaluation recurse once per term, which
    /// overflows the stack for large datasets; pairwise reduction keeps the
    /// depth at `O(log n)`.
    pub fn sum<I>(terms: I) -> Expr
    where
        I: IntoIterator<Item = Expr>,
    {
        let mut terms: Vec<Expr> = terms.into_iter().collect();
        if terms.is_empty() {
            return Expr::constant(0.0);
        }
        while terms.len() > 1 {
            terms = terms
                .chunks(2)
                .map(|pair| match pair {
                    [a, b] => a.clone() + b.clone(),
                    [a] => a.clone(),
                    _ => unreachable!("chunks(2) yields one- or two-element slices"),
                })
                .collect();
        }
        terms.swap_remove(0)
    }

    /// Evaluate at the given variable values.
    ///
    /// # Panics
    /// Panics if the expression references a variable index outside `vars`.
    /// Solvers always pass their full variable vector; constant expressions
    /// (e.g. a fitted model's predictions) evaluate with an empty slice.
    pub fn eval(&self, vars: &[f64]) -> f64 {
        match &*self.0 {
            Node::Const(v) => *v,
            Node::Var(i) => vars[*i],
            Node::Add(a, b) => a.eval(vars) + b.eval(vars),
            Node::Sub(a, b) => a.eval(vars) - b.eval(vars),
            Node::Mul(a, b) => a.eval(vars) * b.eval(vars),
            Node::Div(a, b) => a.eval(vars) / b.eval(vars),
            Node::Neg(a) => -a.eval(vars),
            Node::Ln(a) => a.eval(vars).ln(),
            Node::Exp(a) => a.eval(vars).exp(),
            Node::Sqrt(a) => a.eval(vars).sqrt(),
            Node::Powi(a, n) => a.eval(vars).powi(*n),
            Node::Max(a, b) => a.eval(vars).max(b.eval(vars)),
            Node::Min(a, b) => a.eval(vars).min(b.eval(vars)),
        }
    }

    /// Forward-mode evaluation: value and derivative with respect to the
    /// variable at index `seed`.
    ///
    /// `max`/`min` use the derivative of the active branch (first argument
    /// on ties), which is the usual subgradient choice.
    pub fn eval_dual(&self, vars: &[f64], seed: usize) -> (f64, f64) {
        match &*self.0 {
            Node::Const(v) => (*v, 0.0),
            Node::Var(i) => (vars[*i], if *i == seed { 1.0 } else { 0.0 }),
            Node::Add(a, b) => {
                let (av, ad) = a.eval_dual(vars, seed);
                let (bv, bd) = b.eval_dual(vars, seed);
                (av + bv, ad + bd)
            }
            Node::Sub(a, b) => {
                let (av, ad) = a.eval_dual(vars, seed);
                let (bv, bd) = b.eval_dual(vars, seed);
                (av - bv, ad - bd)
            }
            Node::Mul(a, b) => {
                let (av, ad) = a.eval_dual(vars, seed);
                let (bv, bd) = b.eval_dual(vars, seed);
                (av * bv, ad * bv + av * bd)
            }
            Node::Div(a, b) => {
                let (av, ad) = a.eval_dual(vars, seed);
                let (bv, bd) = b.eval_dual(vars, seed);
                (av / bv, (ad * bv - av * bd) / (bv * bv))
            }
            Node::Neg(a) => {
                let (av, ad) = a.eval_dual(vars, seed);
                (-av, -ad)
            }
            Node::Ln(a) => {
                let (av, ad) = a.eval_dual(vars, seed);
                (av.ln(), ad / av)
            }
            Node::Exp(a) => {
                let (av, ad) = a.eval_dual(vars, seed);
                let ev = av.exp();
                (ev, ev * ad)
            }
            Node::Sqrt(a) => {
                let (av, ad) = a.eval_dual(vars, seed);
                let sv = av.sqrt();
                (sv, ad / (2.0 * sv))
            }
            Node::Powi(a, n) => {
                let (av, ad) = a.eval_dual(vars, seed);
                (av.powi(*n), f64::from(*n) * av.powi(*n - 1) * ad)
            }
            Node::Max(a, b) => {
                let (av, ad) = a.eval_dual(vars, seed);
                let (bv, bd) = b.eval_dual(vars, seed);
                if av >= bv { (av, ad) } else { (bv, bd) }
            }
            Node::Min(a, b) => {
                let (av, ad) = a.eval_dual(vars, seed);
                let (bv, bd) = b.eval_dual(vars, seed);
                if av <= bv { (av, ad) } else { (bv, bd) }
            }
        }
    }

    /// Full gradient at the given point, one forward pass per variable,
    /// evaluated in parallel.
    pub fn gradient(&self, vars: &[f64]) -> Vec<f64> {
        (0..vars.len())
            .into_par_iter()
            .map(|seed| self.eval_dual(vars, seed).1)
            .collect()
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::constant(value)
    }
}

macro_rules! impl_binary_op {
    ($op_trait:ident, $method:ident, $node:ident) => {
        impl std::ops::$op_trait for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr(Arc::new(Node::$node(self, rhs)))
            }
        }

        impl std::ops::$op_trait<f64> for Expr {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                Expr(Arc::new(Node::$node(self, Expr::constant(rhs))))
            }
        }

        impl std::ops::$op_trait<Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr(Arc::new(Node::$node(Expr::constant(self), rhs)))
            }
        }
    };
}

impl_binary_op!(Add, add, Add);
impl_binary_op!(Sub, sub, Sub);
impl_binary_op!(Mul, mul, Mul);
impl_binary_op!(Div, div, Div);

impl std::ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr(Arc::new(Node::Neg(self)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_composite_expression() {
        // f(x0, x1) = x0^2 * 3 + ln(x1) - 1 at (2, e)
        let f = Expr::var(0).powi(2) * 3.0 + Expr::var(1).ln() - 1.0;
        let value = f.eval(&[2.0, std::f64::consts::E]);
        assert!((value - 12.0).abs() < 1e-12, "got {value}");
    }

    #[test]
    fn dual_matches_finite_differences() {
        // f = x0 * exp(x1) / sqrt(x0) + max(x0 - 1, 0) + 2^... keep it varied
        let f = Expr::var(0) * Expr::var(1).exp() / Expr::var(0).sqrt()
            + (Expr::var(0) - 1.0).max(0.0)
            + (Expr::var(1) / Expr::var(0)).powi(3);

        let x = [1.7, 0.4];
        let h = 1e-7;
        for seed in 0..2 {
            let (_, analytic) = f.eval_dual(&x, seed);
            let mut plus = x;
            let mut minus = x;
            plus[seed] += h;
            minus[seed] -= h;
            let numeric = (f.eval(&plus) - f.eval(&minus)) / (2.0 * h);
            assert!(
                (analytic - numeric).abs() < 1e-5,
                "seed {seed}: analytic {analytic}, numeric {numeric}"
            );
        }
    }

    #[test]
    fn max_takes_active_branch_derivative() {
        let f = Expr::var(0).max(2.0);
        assert_eq!(f.eval_dual(&[3.0], 0), (3.0, 1.0));
        assert_eq!(f.eval_dual(&[1.0], 0), (2.0, 0.0));
    }

    #[test]
    fn gradient_of_quadratic() {
        // f = (x0 - 1)^2 + (x1 + 2)^2, grad = (2(x0-1), 2(x1+2))
        let f = (Expr::var(0) - 1.0).powi(2) + (Expr::var(1) + 2.0).powi(2);
        let g = f.gradient(&[3.0, 0.0]);
        assert!((g[0] - 4.0).abs() < 1e-12);
        assert!((g[1] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn sum_matches_naive_total_on_large_input() {
        let n = 20_000;
        let total = Expr::sum((0..n).map(|i| Expr::constant(i as f64)));
        let expected = (n * (n - 1)) as f64 / 2.0;
        // Also exercises stack depth: a left-deep fold of 20k terms would
        // overflow here.
        assert!((total.eval(&[]) - expected).abs() < 1e-6);
    }

    #[test]
    fn sum_of_nothing_is_zero() {
        assert_eq!(Expr::sum(std::iter::empty()).eval(&[]), 0.0);
    }
}
