//! quasi_newton — limited-memory BFGS minimization of smooth objectives.
//!
//! Purpose
//! -------
//! Provide the fitting engine behind the pulse model: callers implement a
//! single trait, [`Objective`], and invoke [`minimize`] to run L-BFGS with a
//! strong-Wolfe line search, deterministic retries and a three-way terminal
//! state.
//!
//! Key behaviors
//! -------------
//! - [`engine`]: the native loop (bounded [`history`], [`line_search`],
//!   convergence / stall / divergence handling, loss trace, slog records).
//! - [`adapter`], [`builders`], [`run`]: an argmin-backed reference solver
//!   over the same [`Objective`], selected with [`Solver::Argmin`].
//! - [`finite_diff`]: numerical gradients and analytic-vs-numeric checks.
//! - [`observer`]: discarding and terminal slog loggers.
//! - Configuration ([`QuasiNewtonOptions`], [`Tolerances`],
//!   [`LineSearchOptions`]) and validation ([`validation`]) are centralized so
//!   downstream code can assume sane, finite inputs.
//!
//! Invariants & assumptions
//! ------------------------
//! - The optimizer **minimizes** `f(θ)`; there is no sign convention to flip.
//! - Objectives report invalid inputs as [`OptError`] values, never panics.
//! - The outer loop is strictly sequential; parallelism, if any, lives inside
//!   the objective.
//!
//! Conventions
//! -----------
//! - Divergence is an outcome ([`TerminalState::Diverged`]), not an error;
//!   errors are reserved for invalid configuration or hard objective failures.
//! - Errors bubble up as [`OptResult<T>`](crate::optimization::errors::OptResult).
//!
//! Downstream usage
//! ----------------
//! - `pulse::objective::ObjectiveEvaluator` implements [`Objective`] and
//!   `pulse::models::PulseModel::fit` calls [`minimize`].
//!
//! Testing notes
//! -------------
//! - Unit tests in each submodule; the engine is exercised on quadratics,
//!   Rosenbrock and deliberately broken objectives.
//!
//! [`OptError`]: crate::optimization::errors::OptError

pub mod adapter;
pub mod api;
pub mod builders;
pub mod engine;
pub mod finite_diff;
pub mod history;
pub mod line_search;
pub mod observer;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::minimize;
pub use self::finite_diff::{GradientCheck, check_gradient, fd_gradient};
pub use self::traits::{
    LineSearchOptions, LineSearcher, Objective, OptimOutcome, QuasiNewtonOptions, Solver,
    TerminalState, Tolerances,
};
pub use self::types::{Cost, DEFAULT_MEMORY_DEPTH, FnEvalMap, Grad, Theta};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_pulse::optimization::quasi_newton::prelude::*;
//
// to import the main optimizer surface in a single line.

pub mod prelude {
    pub use super::api::minimize;
    pub use super::traits::{Objective, OptimOutcome, QuasiNewtonOptions, TerminalState};
    pub use super::types::{Cost, Grad, Theta};
}
