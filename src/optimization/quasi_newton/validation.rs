//! Validation helpers for quasi-Newton optimization.
//!
//! This module centralizes common consistency checks used across the
//! optimizer interface:
//!
//! - **Option checks**: [`verify_tol_grad`], [`verify_tol_cost`],
//!   [`verify_max_iter`], [`verify_memory_depth`],
//!   [`verify_stall_iterations`], [`verify_line_search`].
//! - **Gradient validation**: [`validate_grad`] enforces correct dimension
//!   and finite entries.
//! - **Parameter estimates**: [`validate_theta_hat`] ensures a candidate
//!   `theta_hat` exists and contains only finite values.
//! - **Objective values**: [`validate_value`] checks losses for finiteness.
use crate::optimization::{
    errors::{OptError, OptResult},
    quasi_newton::types::{Grad, Theta},
};

/// Validate the gradient-norm tolerance: finite and strictly positive.
///
/// # Errors
/// Returns [`OptError::InvalidTolGrad`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_grad(tol: f64) -> OptResult<()> {
    if !tol.is_finite() {
        return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be finite." });
    }
    if tol <= 0.0 {
        return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be positive." });
    }
    Ok(())
}

/// Validate the relative cost-change tolerance: finite and strictly positive.
///
/// # Errors
/// Returns [`OptError::InvalidTolCost`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_cost(tol: f64) -> OptResult<()> {
    if !tol.is_finite() {
        return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be finite." });
    }
    if tol <= 0.0 {
        return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be positive." });
    }
    Ok(())
}

/// # Errors
/// Returns [`OptError::InvalidMaxIter`] if `max_iter == 0`.
pub fn verify_max_iter(max_iter: usize) -> OptResult<()> {
    if max_iter == 0 {
        return Err(OptError::InvalidMaxIter {
            max_iter,
            reason: "Maximum iterations must be greater than zero.",
        });
    }
    Ok(())
}

/// # Errors
/// Returns [`OptError::InvalidMemoryDepth`] if `mem == 0`.
pub fn verify_memory_depth(mem: usize) -> OptResult<()> {
    if mem == 0 {
        return Err(OptError::InvalidMemoryDepth {
            mem,
            reason: "L-BFGS memory must be greater than zero.",
        });
    }
    Ok(())
}

/// # Errors
/// Returns [`OptError::InvalidStallIterations`] if `stall == 0`.
pub fn verify_stall_iterations(stall: usize) -> OptResult<()> {
    if stall == 0 {
        return Err(OptError::InvalidStallIterations {
            stall,
            reason: "Stall window must be at least one iteration.",
        });
    }
    Ok(())
}

/// Validate strong-Wolfe constants: `0 < c1 < c2 < 1` and `max_trials ≥ 1`.
///
/// # Errors
/// Returns [`OptError::InvalidLineSearchParam`] naming the first offending value.
pub fn verify_line_search(c1: f64, c2: f64, max_trials: usize) -> OptResult<()> {
    if !(c1.is_finite() && c1 > 0.0 && c1 < 1.0) {
        return Err(OptError::InvalidLineSearchParam {
            name: "c1",
            value: c1,
            reason: "Sufficient-decrease constant must lie in (0, 1).",
        });
    }
    if !(c2.is_finite() && c2 > c1 && c2 < 1.0) {
        return Err(OptError::InvalidLineSearchParam {
            name: "c2",
            value: c2,
            reason: "Curvature constant must lie in (c1, 1).",
        });
    }
    if max_trials == 0 {
        return Err(OptError::InvalidLineSearchParam {
            name: "max_trials",
            value: 0.0,
            reason: "At least one trial evaluation is required.",
        });
    }
    Ok(())
}

/// Validate a gradient vector against dimension and finiteness.
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if length does not match `dim`.
/// - [`OptError::InvalidGradient`] with the index/value/reason of the first
///   offending element.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate and unwrap an estimated parameter vector (`theta_hat`).
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if no vector was provided.
/// - [`OptError::InvalidThetaHat`] if any element is non-finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    match theta_hat {
        Some(t) => {
            for (index, &value) in t.iter().enumerate() {
                if !value.is_finite() {
                    return Err(OptError::InvalidThetaHat {
                        index,
                        value,
                        reason: "Parameter estimates must be finite.",
                    });
                }
            }
            Ok(t)
        }
        None => Err(OptError::MissingThetaHat),
    }
}

/// # Errors
/// Returns [`OptError::NonFiniteCost`] if the value is `NaN` or infinite.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}
