//! Domain types used throughout the fitting pipeline.
//!
//! This module defines:
//!
//! - fit configuration (`FitOptions`, `ResidualNorm`, `FitKind`, `ParamBound`)
//! - the x-data discriminator (`FitInput`)
//! - normalized parameter specifications (`ParamSpec`)
//! - per-parameter solve outcomes (`SolvedValue`)

pub mod types;

pub use types::*;
