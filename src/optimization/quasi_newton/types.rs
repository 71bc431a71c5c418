//! quasi_newton::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the core numeric types and solver aliases used by the
//! quasi-Newton layer, so that the engine, the argmin bridge, and the
//! model code agree on one vocabulary for parameters, gradients, and costs.
//!
//! Key behaviors
//! -------------
//! - Define canonical aliases for parameter vectors, gradients and scalar
//!   costs (`Theta`, `Grad`, `Cost`).
//! - Provide a standard map type for function-evaluation counters
//!   (`FnEvalMap`), keyed like argmin's counters.
//! - Expose pre-wired argmin L-BFGS aliases for the reference solver.
//!
//! Invariants & assumptions
//! ------------------------
//! - All optimizer vectors are `ndarray` containers over `f64`.
//! - `Cost` is the scalar being *minimized*; there is no sign flip anywhere
//!   in this layer.
//!
//! Testing notes
//! -------------
//! - Type aliases and constants only; exercised by the surrounding modules.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::Array1;
use std::collections::HashMap;

/// Parameter vector `θ`.
pub type Theta = Array1<f64>;

/// Gradient vector `∇f(θ)`, same shape as [`Theta`].
pub type Grad = Array1<f64>;

/// Scalar objective value being minimized.
pub type Cost = f64;

/// Function-evaluation counters (`"cost_count"`, `"gradient_count"`).
pub type FnEvalMap = HashMap<String, u64>;

/// Counter key for objective evaluations.
pub const COST_COUNT: &str = "cost_count";

/// Counter key for gradient evaluations.
pub const GRADIENT_COUNT: &str = "gradient_count";

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_MEMORY_DEPTH: usize = 7;

/// Hager–Zhang line search specialized to this crate's numeric types.
pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

/// More–Thuente line search specialized to this crate's numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// argmin L-BFGS wired to the Hager–Zhang line search.
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

/// argmin L-BFGS wired to the More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
