//! High-level entry point for minimizing an [`Objective`].
//!
//! Dispatches on [`QuasiNewtonOptions::solver`]: the native L-BFGS engine,
//! or argmin's `LBFGS` with a More–Thuente / Hager–Zhang line search wrapped
//! in an [`ArgMinAdapter`].
use crate::optimization::{
    errors::OptResult,
    quasi_newton::{
        adapter::ArgMinAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        engine::run_native,
        run::run_lbfgs,
        traits::{LineSearcher, Objective, OptimOutcome, QuasiNewtonOptions, Solver},
        types::Theta,
    },
};
use slog::Logger;

/// Minimize `f(θ)` from `theta0`.
///
/// # Behavior
/// - Validates the initial guess via `f.check(&theta0)`.
/// - Runs the solver selected by `opts.solver`.
///
/// # Errors
/// - Propagates any error from `f.check`.
/// - Propagates builder errors from `build_optimizer_*`.
/// - Propagates hard objective errors raised during the run.
///
/// Divergence is not an error: it is reported as
/// [`TerminalState::Diverged`](super::TerminalState::Diverged) in the outcome.
///
/// # Example
/// ```
/// use ndarray::array;
/// use rust_pulse::optimization::{
///     errors::OptResult,
///     quasi_newton::{Cost, Grad, Objective, QuasiNewtonOptions, Theta, minimize},
///     quasi_newton::observer::discard_logger,
/// };
///
/// struct Bowl;
/// impl Objective for Bowl {
///     fn dimension(&self) -> usize { 2 }
///     fn loss(&self, t: &Theta) -> OptResult<Cost> { Ok(0.5 * t.dot(t)) }
///     fn gradient(&self, t: &Theta) -> OptResult<Grad> { Ok(t.clone()) }
/// }
///
/// let opts = QuasiNewtonOptions::default();
/// let out = minimize(&Bowl, array![1.0, -2.0], &opts, &discard_logger())?;
/// assert!(out.converged());
/// # Ok::<(), rust_pulse::optimization::errors::OptError>(())
/// ```
pub fn minimize<F: Objective + ?Sized>(
    f: &F, theta0: Theta, opts: &QuasiNewtonOptions, logger: &Logger,
) -> OptResult<OptimOutcome> {
    f.check(&theta0)?;
    match opts.solver {
        Solver::Native => run_native(f, theta0, opts, logger),
        Solver::Argmin(LineSearcher::MoreThuente) => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, ArgMinAdapter::new(f), solver, logger)
        }
        Solver::Argmin(LineSearcher::HagerZhang) => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, ArgMinAdapter::new(f), solver, logger)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{
        errors::OptError,
        quasi_newton::{
            observer::discard_logger,
            traits::TerminalState,
            types::{Cost, Grad},
        },
    };
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover solver dispatch and the up-front `check` call.
    // -------------------------------------------------------------------------

    struct Shifted;

    impl Objective for Shifted {
        fn dimension(&self) -> usize {
            2
        }
        fn loss(&self, t: &Theta) -> OptResult<Cost> {
            Ok((t[0] - 0.5).powi(2) + (t[1] - 1.5).powi(2))
        }
        fn gradient(&self, t: &Theta) -> OptResult<Grad> {
            Ok(array![2.0 * (t[0] - 0.5), 2.0 * (t[1] - 1.5)])
        }
    }

    #[test]
    // Purpose
    // -------
    // Native and argmin solvers agree on a simple minimizer.
    //
    // Given
    // -----
    // - Minimizer `(0.5, 1.5)`, each `Solver` variant.
    //
    // Expect
    // ------
    // - Every run is non-diverged and within 1e-5 of the minimizer.
    fn every_solver_reaches_the_minimizer() {
        for solver in [
            Solver::Native,
            Solver::Argmin(LineSearcher::MoreThuente),
            Solver::Argmin(LineSearcher::HagerZhang),
        ] {
            // Arrange
            let opts = QuasiNewtonOptions { solver, ..QuasiNewtonOptions::default() };

            // Act
            let out = minimize(&Shifted, array![0.0, 0.0], &opts, &discard_logger()).unwrap();

            // Assert
            assert_ne!(out.terminal, TerminalState::Diverged, "{solver:?}");
            assert!((out.theta_hat[0] - 0.5).abs() < 1e-5, "{solver:?}");
            assert!((out.theta_hat[1] - 1.5).abs() < 1e-5, "{solver:?}");
        }
    }

    #[test]
    // Purpose
    // -------
    // A wrongly sized start is rejected before any solver runs.
    //
    // Given
    // -----
    // - A 3-element `θ₀` for a 2-dimensional objective.
    //
    // Expect
    // ------
    // - `OptError::ThetaLengthMismatch`.
    fn minimize_checks_theta_before_running() {
        let err = minimize(
            &Shifted,
            array![0.0, 0.0, 0.0],
            &QuasiNewtonOptions::default(),
            &discard_logger(),
        )
        .unwrap_err();
        assert_eq!(err, OptError::ThetaLengthMismatch { expected: 2, actual: 3 });
    }
}
