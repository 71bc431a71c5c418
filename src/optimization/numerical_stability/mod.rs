//! numerical_stability — numerically robust scalar link functions.
//!
//! Purpose
//! -------
//! Collect numerically stable scalar transforms used by the reward models so
//! that loss and gradient evaluations stay finite at line-search trial points
//! far away from the current iterate.
//!
//! Key behaviors
//! -------------
//! - Provide stable scalar transforms (`safe_softplus`, `safe_logistic`)
//!   without overflow/underflow.
//! - Centralize the softplus cutoff (`SOFTPLUS_CUTOFF`) so downstream modules
//!   share a consistent guard.
//!
//! Invariants & assumptions
//! ------------------------
//! - All public transforms assume finite `f64` inputs; finiteness of rewards
//!   and parameters is enforced in the event log and optimizer layers.
//!
//! Conventions
//! -----------
//! - This module never logs, performs I/O, or touches global state; it is
//!   pure numerical helpers suitable for use inside tight inner loops.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`transformations`] cover agreement with naïve formulas on
//!   safe grids and tail behavior.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{SOFTPLUS_CUTOFF, safe_logistic, safe_softplus};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::transformations::{safe_logistic, safe_softplus};
}
