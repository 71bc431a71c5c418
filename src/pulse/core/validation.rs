//! Validation helpers for pulse options and parameter vectors.
//!
//! Each helper returns `Ok(())` on valid input and a precise [`PulseError`]
//! otherwise; none of them panic.
use crate::pulse::errors::{PulseError, PulseResult};
use ndarray::ArrayView1;

/// Ensure the worker pool has at least one thread.
///
/// # Errors
/// - [`PulseError::InvalidOption`] with `name = "worker_count"` if `n == 0`.
pub fn validate_worker_count(n: usize) -> PulseResult<()> {
    if n == 0 {
        return Err(PulseError::InvalidOption {
            name: "worker_count",
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

/// Ensure the L2 penalty weight is finite and non-negative.
///
/// # Errors
/// - [`PulseError::InvalidOption`] with `name = "regularization"`.
pub fn validate_regularization(lambda: f64) -> PulseResult<()> {
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(PulseError::InvalidOption {
            name: "regularization",
            reason: format!("must be finite and non-negative, got {lambda}"),
        });
    }
    Ok(())
}

/// Ensure every parameter is finite.
///
/// # Errors
/// - [`PulseError::InvalidParameters`] at the first non-finite entry.
pub fn validate_parameters(theta: ArrayView1<'_, f64>) -> PulseResult<()> {
    match theta.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(PulseError::InvalidParameters { index, value: theta[index] }),
        None => Ok(()),
    }
}

/// Ensure a parameter vector matches the feature dimension.
///
/// # Errors
/// - [`PulseError::DimensionMismatch`] if `found != expected`.
pub fn validate_dimension(expected: usize, found: usize) -> PulseResult<()> {
    if found != expected {
        return Err(PulseError::DimensionMismatch { expected, found });
    }
    Ok(())
}
