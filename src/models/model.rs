//! The `Model` trait and the parameter view models evaluate against.

use crate::domain::FitInput;
use crate::math::Expr;

/// Name-keyed access to the model parameters for one evaluation.
///
/// During fitting the entries are variable-backed expressions; when a fitted
/// model is evaluated they are constants. Model code cannot tell the
/// difference, which is the point.
#[derive(Debug, Clone)]
pub struct Params {
    entries: Vec<(String, Expr)>,
}

impl Params {
    pub(crate) fn new(entries: Vec<(String, Expr)>) -> Self {
        Self { entries }
    }

    /// The parameter named `name`, as an expression.
    ///
    /// # Panics
    /// Panics if no parameter with that name exists. Parameter names are
    /// fixed by the guesses passed to the fit, so a miss here is a typo in
    /// the model definition.
    pub fn get(&self, name: &str) -> Expr {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, expr)| expr.clone())
            .unwrap_or_else(|| panic!("model requested unknown parameter `{name}`"))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A parametric model: maps x data and parameters to one prediction per
/// observation.
///
/// Implementations must be pure and must stick to [`Expr`]-representable
/// operations so the optimization environment can differentiate through
/// them. Any closure with the right signature is a model:
///
/// ```
/// use parafit::domain::FitInput;
/// use parafit::math::Expr;
/// use parafit::models::Params;
///
/// let line = |x: &FitInput, p: &Params| -> Vec<Expr> {
///     x.scalar()
///         .iter()
///         .map(|&xi| p.get("m") * xi + p.get("b"))
///         .collect()
/// };
/// # let _ = line;
/// ```
pub trait Model {
    fn eval(&self, x: &FitInput, params: &Params) -> Vec<Expr>;
}

impl<F> Model for F
where
    F: Fn(&FitInput, &Params) -> Vec<Expr>,
{
    fn eval(&self, x: &FitInput, params: &Params) -> Vec<Expr> {
        self(x, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_lookup_and_names() {
        let params = Params::new(vec![
            ("m".to_string(), Expr::constant(2.0)),
            ("b".to_string(), Expr::constant(1.0)),
        ]);
        assert_eq!(params.len(), 2);
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["m", "b"]);
        assert_eq!(params.get("b").eval(&[]), 1.0);
    }

    #[test]
    #[should_panic(expected = "unknown parameter")]
    fn params_panic_on_unknown_name() {
        let params = Params::new(vec![("m".to_string(), Expr::constant(2.0))]);
        let _ = params.get("q");
    }

    #[test]
    fn closures_are_models() {
        let line = |x: &FitInput, p: &Params| -> Vec<Expr> {
            x.scalar()
                .iter()
                .map(|&xi| p.get("m") * xi + p.get("b"))
                .collect()
        };
        let params = Params::new(vec![
            ("m".to_string(), Expr::constant(2.0)),
            ("b".to_string(), Expr::constant(1.0)),
        ]);
        let x = FitInput::from(vec![0.0, 1.0, 2.0]);
        let predictions = line.eval(&x, &params);
        let values: Vec<f64> = predictions.iter().map(|e| e.eval(&[])).collect();
        assert_eq!(values, vec![1.0, 3.0, 5.0]);
    }
}
