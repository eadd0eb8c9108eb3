//! `parafit` — fit parametric models to measured data.
//!
//! Given a model `f(x, p)`, observations `(x_i, y_i)`, and an initial guess
//! for each parameter, the crate assembles a constrained nonlinear program
//! and solves it with a gradient-based solver:
//!
//! - choose the error norm to minimize (L1 / L2 / Linf)
//! - weight observations (weights are normalized to sum to 1)
//! - optionally fit in logspace (minimizes relative rather than absolute error)
//! - optionally force the model to be an upper or lower envelope of the data
//!
//! The result is an immutable [`models::FittedModel`] that evaluates the
//! model at new inputs with the solved parameters — no re-optimization.
//!
//! The solver sits behind the [`nlp::NlpSolver`] trait so callers can swap in
//! their own optimization environment; [`nlp::AugLagSolver`] is the default
//! backend.

pub mod domain;
pub mod error;
pub mod fit;
pub mod math;
pub mod models;
pub mod nlp;
