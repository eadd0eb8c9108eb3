//! Fitting orchestration.
//!
//! Responsibilities:
//!
//! - validate and flatten raw inputs (`normalize`)
//! - assemble the optimization problem: decision variables and the residual
//!   (`problem`), the norm objective (`objective`), and envelope constraints
//!   (`envelope`)
//! - invoke the solver and wrap the result (`fitter`)

pub mod envelope;
pub mod fitter;
pub mod normalize;
pub mod objective;
pub mod problem;

pub use envelope::*;
pub use fitter::*;
pub use normalize::*;
pub use objective::*;
pub use problem::*;
