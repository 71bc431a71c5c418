//! pulse — append-only interaction log with a quasi-Newton reward model.
//!
//! Purpose
//! -------
//! Record `(action, observation, reward)` steps of an episode and fit a
//! linear reward model over one-hot (optionally interaction and lagged)
//! features with limited-memory BFGS.
//!
//! Key behaviors
//! -------------
//! - [`core`]: events, the event log, vocabulary, feature layout, reward
//!   families, options.
//! - [`objective`]: design matrix and the parallel, deterministic
//!   loss/gradient evaluator.
//! - [`models`]: [`PulseModel`](models::PulseModel) and the thread-safe
//!   [`SharedPulseModel`](models::SharedPulseModel).
//! - [`errors`]: [`PulseError`](errors::PulseError) and its bridge to the
//!   optimizer's error type.
//!
//! Invariants & assumptions
//! ------------------------
//! - Each model owns its log, vocabulary, parameters and worker pool; there
//!   is no process-wide state.
//! - Every failure is a [`PulseError`](errors::PulseError); the model is
//!   never left partially updated.
//!
//! Conventions
//! -----------
//! - Action and observation ids are arbitrary `i64` values; they are indexed
//!   densely in first-seen order.
//! - The optimizer minimizes the summed per-event loss plus an optional
//!   `½ λ ‖θ‖²` penalty.
//!
//! Downstream usage
//! ----------------
//! ```
//! use rust_pulse::pulse::prelude::*;
//!
//! let mut model = PulseModel::new(PulseOptions::default().with_worker_count(1)?)?;
//! model.append(0, 1, 1.0)?;
//! model.append(1, 0, 0.0)?;
//! let report = model.fit()?;
//! assert!(report.loss_trace.windows(2).all(|w| w[1] <= w[0]));
//! let reward = model.predict(0, 1)?;
//! assert!(reward.is_finite());
//! model.clear();
//! # Ok::<(), rust_pulse::pulse::errors::PulseError>(())
//! ```
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; the simulated grid-world pipeline
//!   is exercised in `tests/integration_pulse_pipeline.rs`.
pub mod core;
pub mod errors;
pub mod models;
pub mod objective;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_pulse::pulse::prelude::*;
//
// to import the main model surface in a single line.

pub mod prelude {
    pub use super::core::{
        Event, EventLog, FeatureConfig, PulseOptions, RewardModel, Vocabulary, VocabularyPolicy,
    };
    pub use super::errors::{PulseError, PulseResult};
    pub use super::models::{FitReport, PulseModel, SharedPulseModel};
    pub use super::objective::ObjectiveEvaluator;
    pub use crate::optimization::quasi_newton::{LineSearcher, Solver, TerminalState};
}
