//! quasi_newton::finite_diff — finite-difference gradients and derivative checks.
//!
//! Purpose
//! -------
//! Approximate `∇f(θ)` numerically with `finitediff` and compare it with an
//! objective's analytic gradient, so that hand-written gradients can be
//! verified before they are trusted by the optimizer.
//!
//! Key behaviors
//! -------------
//! - [`fd_gradient`] tries central differences first and falls back to
//!   forward differences when an evaluation fails or the result is not
//!   finite.
//! - [`check_gradient`] evaluates both gradients at `θ` and reports the
//!   largest absolute and relative component-wise discrepancies.
//!
//! Invariants & assumptions
//! ------------------------
//! - The `finitediff` closures must return `f64`, so the first objective
//!   error raised inside them is parked in a `RefCell` and `NaN` is
//!   returned; the parked error is surfaced after the sweep.
//! - Returned gradients always pass [`validate_grad`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover an exact match on a smooth function, detection of a
//!   deliberately wrong gradient, and error propagation.
use crate::optimization::{
    errors::{OptError, OptResult},
    quasi_newton::{
        traits::Objective,
        types::{Grad, Theta},
        validation::validate_grad,
    },
};
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Analytic vs. numerical gradient comparison at one point.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientCheck {
    pub analytic: Grad,
    pub numeric: Grad,
    /// `max_i |analytic_i − numeric_i|`.
    pub max_abs_error: f64,
    /// `max_i |analytic_i − numeric_i| / max(1, |numeric_i|)`.
    pub max_rel_error: f64,
}

/// fd_gradient — finite-difference gradient of `f` at `theta`.
///
/// Parameters
/// ----------
/// - `f`: objective whose `loss` is differenced.
/// - `theta`: evaluation point; its length fixes the gradient dimension.
///
/// Returns
/// -------
/// `OptResult<Grad>` with a validated gradient.
///
/// Errors
/// ------
/// - The first error raised by `f.loss` during the forward sweep.
/// - `OptError::InvalidGradient` when even the forward sweep is non-finite.
pub fn fd_gradient<F: Objective + ?Sized>(f: &F, theta: &Theta) -> OptResult<Grad> {
    let closure_err: RefCell<Option<OptError>> = RefCell::new(None);
    let cost = |x: &Theta| -> f64 {
        match f.loss(x) {
            Ok(v) => v,
            Err(e) => {
                let mut slot = closure_err.borrow_mut();
                if slot.is_none() {
                    *slot = Some(e);
                }
                f64::NAN
            }
        }
    };
    let central = theta.central_diff(&cost);
    if closure_err.borrow().is_none() && validate_grad(&central, theta.len()).is_ok() {
        return Ok(central);
    }
    run_fd_diff(theta, &cost, &closure_err)
}

/// Forward-difference gradient with error capture and validation.
fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<OptError>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

/// Compare `f.gradient(θ)` with [`fd_gradient`].
///
/// # Errors
/// - Propagates errors from `f.gradient` and from [`fd_gradient`].
/// - `OptError::GradientDimMismatch` if the analytic gradient has the wrong
///   length.
pub fn check_gradient<F: Objective + ?Sized>(f: &F, theta: &Theta) -> OptResult<GradientCheck> {
    let analytic = f.gradient(theta)?;
    validate_grad(&analytic, theta.len())?;
    let numeric = fd_gradient(f, theta)?;
    let (max_abs_error, max_rel_error) = analytic.iter().zip(numeric.iter()).fold(
        (0.0_f64, 0.0_f64),
        |(abs_acc, rel_acc), (a, n)| {
            let diff = (a - n).abs();
            (abs_acc.max(diff), rel_acc.max(diff / n.abs().max(1.0)))
        },
    );
    Ok(GradientCheck { analytic, numeric, max_abs_error, max_rel_error })
}
