//! optimization — quasi-Newton stack, numerical helpers, and unified error surface.
//!
//! Purpose
//! -------
//! Provide a cohesive optimization layer for model fitting, combining a
//! limited-memory BFGS minimizer (with an argmin-backed reference solver),
//! numerically stable link functions, and a single error/result surface.
//! Callers implement an objective, choose tolerances, and obtain fitted
//! parameters and diagnostics without touching solver internals.
//!
//! Key behaviors
//! -------------
//! - Expose a high-level API for **minimizing** smooth objectives
//!   (`quasi_newton`), including configuration of the line search, memory
//!   depth, stopping criteria, and solver backend.
//! - Supply shared numerical primitives (`numerical_stability`) such as
//!   overflow-safe softplus and logistic functions.
//! - Normalize configuration issues, numerical failures, and backend solver
//!   errors into a single enum (`errors::OptError`) with a common result
//!   alias (`OptResult<T>`).
//!
//! Invariants & assumptions
//! ------------------------
//! - Optimizers operate in an unconstrained parameter space `θ` and assume
//!   that inputs are finite once validation has passed; invalid states are
//!   reported as `OptError`, not panics.
//! - This layer knows nothing about event logs or features; model-specific
//!   errors are converted at the model boundary.
//!
//! Conventions
//! -----------
//! - Parameters and gradients are `ndarray`-based aliases (`Theta`, `Grad`).
//! - Public optimization entrypoints that can fail return `OptResult<T>`;
//!   callers never see raw argmin errors.
//! - The only side effect is structured logging through a caller-supplied
//!   `slog::Logger`.
//!
//! Downstream usage
//! ----------------
//! - The pulse model implements `quasi_newton::Objective` for its evaluator
//!   and calls `quasi_newton::minimize`.
//! - Front-ends typically import the curated surface via
//!   `optimization::prelude::*`.
//!
//! Testing notes
//! -------------
//! - Unit tests in the submodules focus on local concerns: line search,
//!   curvature history, engine terminal states, argmin wiring, finite
//!   differences, stable transforms, and error conversions.

pub mod errors;
pub mod numerical_stability;
pub mod quasi_newton;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_pulse::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::numerical_stability::prelude::*;
    pub use super::quasi_newton::prelude::*;
}
