//! rust_pulse — append-only event log with a limited-memory quasi-Newton
//! reward-model fitter.
//!
//! Purpose
//! -------
//! Serve as the crate root. An application streams interaction records
//! `(action, observation, reward)` into a [`pulse::models::PulseModel`],
//! calls `fit` to estimate a linear reward model over the episode, and
//! optionally `clear`s the log to start the next episode.
//!
//! Key behaviors
//! -------------
//! - [`pulse`]: event log, vocabulary, feature mapping, the parallel
//!   loss/gradient evaluator, and the model types.
//! - [`optimization`]: the generic L-BFGS engine with strong-Wolfe line
//!   search (plus an argmin-backed reference solver), numerically stable
//!   link functions, and the optimizer error surface.
//!
//! Invariants & assumptions
//! ------------------------
//! - No global state: every model owns its log, parameters, worker pool and
//!   logger.
//! - Fallible operations return `Result`s with per-layer error enums
//!   (`PulseError`, `OptError`); library code does not panic on bad input.
//!
//! Conventions
//! -----------
//! - Vectors and matrices are `ndarray` types; the optimizer works on
//!   `Array1<f64>` parameter vectors.
//! - Logging goes through `slog`; quiet by default.
//!
//! Downstream usage
//! ----------------
//! - Most callers only need `use rust_pulse::pulse::prelude::*;`.
//! - Custom objectives can reuse the optimizer through
//!   `rust_pulse::optimization::quasi_newton::{Objective, minimize}`.
//!
//! Testing notes
//! -------------
//! - Unit tests live in each module's `#[cfg(test)]` block; the end-to-end
//!   pipeline on a simulated grid world is in `tests/`.

pub mod optimization;
pub mod pulse;
