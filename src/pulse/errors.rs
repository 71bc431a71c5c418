//! Errors for the pulse model (event validation, vocabulary, parameter
//! shape, options, and optimizer outcomes).
//!
//! This module defines the model error type, [`PulseError`], used across the
//! event log, feature mapper, objective evaluator and model layers, plus the
//! conversions that bridge it with the optimizer's [`OptError`].
//!
//! ## Conventions
//! - **Indices are 0-based.**
//! - Action and observation ids are `i64` values chosen by the caller.
//! - Optimizer/backend errors that have no model-level meaning are normalized
//!   to [`PulseError::OptimizationFailed`] with a human-readable status.
use crate::optimization::errors::OptError;
use std::fmt;

/// Crate-wide result alias for pulse operations that may produce [`PulseError`].
pub type PulseResult<T> = Result<T, PulseError>;

/// Which half of an `(action, observation)` pair an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryKind {
    Action,
    Observation,
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryKind::Action => write!(f, "action"),
            CategoryKind::Observation => write!(f, "observation"),
        }
    }
}

/// Unified error type for pulse modeling.
#[derive(Debug, Clone, PartialEq)]
pub enum PulseError {
    // ---- Input/event validation ----
    /// Id is not part of a closed vocabulary (or unknown at mapping time).
    InvalidCategory { kind: CategoryKind, id: i64 },

    /// Reward is non-finite, or outside `[0, 1]` under the Bernoulli model.
    InvalidReward { value: f64, reason: &'static str },

    /// The log has no events.
    EmptyLog,

    /// Event index past the end of the log.
    EventOutOfRange { index: usize, len: usize },

    // ---- Parameters ----
    /// Parameter vector length disagrees with the feature dimension.
    DimensionMismatch { expected: usize, found: usize },

    /// Parameter vector contains a non-finite entry.
    InvalidParameters { index: usize, value: f64 },

    /// No parameters available for prediction.
    NotFitted,

    // ---- Options ----
    /// A configuration value is out of range.
    InvalidOption { name: &'static str, reason: String },

    /// The worker pool could not be built.
    WorkerPool { text: String },

    // ---- Estimation / optimizer ----
    /// The optimizer left the finite domain or exhausted its line-search retries.
    OptimizationDiverged { iterations: usize, loss: f64, reason: String },

    /// Optimizer failed for a reason other than divergence.
    OptimizationFailed { status: String },

    // ---- Concurrency ----
    /// Mutation attempted while a fit is in flight.
    ConcurrentMutation,
}

impl std::error::Error for PulseError {}

impl fmt::Display for PulseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // ---- Input/event validation ----
            PulseError::InvalidCategory { kind, id } => {
                write!(f, "Unknown {kind} id {id} for this vocabulary.")
            }
            PulseError::InvalidReward { value, reason } => {
                write!(f, "Invalid reward {value}: {reason}")
            }
            PulseError::EmptyLog => {
                write!(f, "Event log is empty.")
            }
            PulseError::EventOutOfRange { index, len } => {
                write!(f, "Event index {index} out of range for a log of {len} events")
            }
            // ---- Parameters ----
            PulseError::DimensionMismatch { expected, found } => {
                write!(f, "Parameter dimension mismatch: expected {expected}, found {found}")
            }
            PulseError::InvalidParameters { index, value } => {
                write!(f, "Parameter at index {index} must be finite, got {value}")
            }
            PulseError::NotFitted => {
                write!(f, "Model hasn't been fitted yet.")
            }
            // ---- Options ----
            PulseError::InvalidOption { name, reason } => {
                write!(f, "Invalid option '{name}': {reason}")
            }
            PulseError::WorkerPool { text } => {
                write!(f, "Failed to build worker pool: {text}")
            }
            // ---- Estimation / optimizer ----
            PulseError::OptimizationDiverged { iterations, loss, reason } => {
                write!(
                    f,
                    "Optimization diverged after {iterations} iterations (loss {loss}): {reason}"
                )
            }
            PulseError::OptimizationFailed { status } => {
                write!(f, "Optimizer failed with status: {status}")
            }
            // ---- Concurrency ----
            PulseError::ConcurrentMutation => {
                write!(f, "Model is being fitted; mutation rejected.")
            }
        }
    }
}

/// Model errors surfacing inside an `Objective` evaluation.
impl From<PulseError> for OptError {
    fn from(err: PulseError) -> OptError {
        match err {
            PulseError::DimensionMismatch { expected, found } => {
                OptError::ThetaLengthMismatch { expected, actual: found }
            }
            PulseError::InvalidParameters { index, value } => {
                OptError::InvalidThetaInput { index, value }
            }
            PulseError::EmptyLog => OptError::EmptyObjective,
            other => OptError::ObjectiveFailed { text: other.to_string() },
        }
    }
}

/// Optimizer errors surfacing at the model boundary.
impl From<OptError> for PulseError {
    fn from(err: OptError) -> PulseError {
        match err {
            OptError::ThetaLengthMismatch { expected, actual } => {
                PulseError::DimensionMismatch { expected, found: actual }
            }
            OptError::InvalidThetaInput { index, value } => {
                PulseError::InvalidParameters { index, value }
            }
            OptError::EmptyObjective => PulseError::EmptyLog,
            OptError::InvalidTolGrad { .. } | OptError::InvalidTolCost { .. } => {
                PulseError::InvalidOption { name: "convergence_tolerance", reason: err.to_string() }
            }
            OptError::InvalidMaxIter { .. } => {
                PulseError::InvalidOption { name: "max_iterations", reason: err.to_string() }
            }
            OptError::InvalidMemoryDepth { .. } => {
                PulseError::InvalidOption { name: "memory_depth", reason: err.to_string() }
            }
            OptError::InvalidStallIterations { .. } => {
                PulseError::InvalidOption { name: "stall_iterations", reason: err.to_string() }
            }
            OptError::InvalidLineSearch { .. } | OptError::InvalidLineSearchParam { .. } => {
                PulseError::InvalidOption { name: "line_search", reason: err.to_string() }
            }
            other => PulseError::OptimizationFailed { status: other.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover the `PulseError` ↔ `OptError` bridge: shape errors
    // survive a round trip, configuration errors land on `InvalidOption`,
    // and everything else degrades to a textual status.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Dimension and finiteness errors keep their payload across the bridge.
    //
    // Given
    // -----
    // - `DimensionMismatch { 5, 3 }` and `InvalidParameters { 2, NaN }`.
    //
    // Expect
    // ------
    // - Converting to `OptError` and back restores the original variants.
    fn shape_errors_survive_round_trip() {
        // Arrange
        let dim = PulseError::DimensionMismatch { expected: 5, found: 3 };

        // Act
        let back = PulseError::from(OptError::from(dim.clone()));
        let nan = PulseError::from(OptError::from(PulseError::InvalidParameters {
            index: 2,
            value: f64::NAN,
        }));

        // Assert
        assert_eq!(back, dim);
        assert!(matches!(nan, PulseError::InvalidParameters { index: 2, .. }));
        assert_eq!(PulseError::from(OptError::from(PulseError::EmptyLog)), PulseError::EmptyLog);
    }

    #[test]
    // Purpose
    // -------
    // Optimizer configuration errors are reported as invalid options, other
    // failures as `OptimizationFailed`.
    //
    // Given
    // -----
    // - `OptError::InvalidMemoryDepth` and `OptError::PotentialBug`.
    //
    // Expect
    // ------
    // - `InvalidOption { name: "memory_depth" }` and `OptimizationFailed`.
    fn optimizer_errors_map_to_model_variants() {
        // Act
        let mem = PulseError::from(OptError::InvalidMemoryDepth { mem: 0, reason: "zero" });
        let bug = PulseError::from(OptError::PotentialBug { text: "oops".to_string() });

        // Assert
        assert!(matches!(mem, PulseError::InvalidOption { name: "memory_depth", .. }));
        assert!(
            matches!(bug, PulseError::OptimizationFailed { status } if status.contains("oops"))
        );
    }
}
