//! Mathematical utilities: the expression graph models are evaluated over.

pub mod expr;

pub use expr::*;
