//! Adapter that exposes an [`Objective`] as an `argmin` problem.
//!
//! Both sides minimize, so cost and gradient pass straight through; the
//! adapter only adds the finiteness checks argmin does not perform itself.
use crate::optimization::{
    errors::OptError,
    quasi_newton::{
        traits::Objective,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};

/// Bridges an [`Objective`] to `argmin`'s `CostFunction` and `Gradient`.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: Objective + ?Sized> {
    pub f: &'a F,
}

impl<'a, F: Objective + ?Sized> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F) -> Self {
        Self { f }
    }
}

impl<F: Objective + ?Sized> CostFunction for ArgMinAdapter<'_, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate `f(θ)`.
    ///
    /// # Errors
    /// - Propagates any `OptError` from the objective via `?`.
    /// - `OptError::NonFiniteCost` if the value is not finite.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.loss(theta)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(output)
    }
}

impl<F: Objective + ?Sized> Gradient for ArgMinAdapter<'_, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate `∇f(θ)` and validate its length and finiteness.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let grad = self.f.gradient(theta)?;
        validate_grad(&grad, theta.len())?;
        Ok(grad)
    }
}
