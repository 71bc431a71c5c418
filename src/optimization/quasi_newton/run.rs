//! Execution helper that runs an `argmin` solver on an [`Objective`] and
//! returns a crate-friendly [`OptimOutcome`].
use crate::optimization::{
    errors::{OptError, OptResult},
    quasi_newton::{
        adapter::ArgMinAdapter,
        traits::{Objective, OptimOutcome, QuasiNewtonOptions, TerminalState},
        types::{FnEvalMap, Grad, Theta},
    },
};
use argmin::core::{CostFunction, Executor, State, TerminationReason, TerminationStatus};
use slog::{Logger, debug, info};

/// Run an `argmin` optimization for an [`Objective`].
///
/// This is the shared runner used by both line-search variants. It wires up
/// the problem via [`ArgMinAdapter`], the chosen solver, the initial
/// parameter `theta0` and `max_iters`, then executes the solver and converts
/// the result into [`OptimOutcome`].
///
/// # Feature flags
/// If the `obs_slog` feature is enabled and `opts.verbose == true`, a
/// terminal slog observer is attached with `ObserverMode::Always`.
///
/// # Returns
/// An [`OptimOutcome`] whose terminal state is mapped from argmin's
/// termination reason:
/// - `SolverConverged` / `TargetCostReached` → `Converged`
/// - `MaxItersReached`, `Timeout`, `Interrupt`, or no termination → `MaxIterationsReached`
/// - any other exit → `Diverged`
///
/// A run aborted by a non-finite cost or gradient is reported as `Diverged`
/// at `theta0`. The argmin path does not record a loss trace.
///
/// # Errors
/// - Propagates any other `argmin` runtime error through
///   `From<argmin::core::Error> for OptError`.
/// - Propagates validation errors from [`OptimOutcome::new`].
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &QuasiNewtonOptions, problem: ArgMinAdapter<'a, F>, solver: S,
    logger: &Logger,
) -> OptResult<OptimOutcome>
where
    F: Objective + ?Sized,
    S: argmin::core::Solver<
            ArgMinAdapter<'a, F>,
            argmin::core::IterState<Theta, Grad, (), (), (), f64>,
        > + Send
        + 'static,
{
    if let Ok(cost0) = problem.cost(&theta0) {
        debug!(logger, "argmin lbfgs start"; "loss" => cost0);
    }
    let max_iter = opts.tols.max_iter as u64;
    let start = theta0.clone();
    #[allow(unused_mut)]
    let mut optimizer =
        Executor::new(problem, solver).configure(|state| state.param(start).max_iters(max_iter));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }

    let mut result = match optimizer.run() {
        Ok(res) => res.state().clone(),
        Err(e) => {
            let err = OptError::from(e);
            if !err.is_non_finite() {
                return Err(err);
            }
            info!(logger, "argmin lbfgs finished";
                "terminal" => %TerminalState::Diverged,
                "reason" => %err
            );
            return OptimOutcome::new(
                Some(theta0),
                f64::NAN,
                TerminalState::Diverged,
                err.to_string(),
                0,
                FnEvalMap::new(),
                None,
                Vec::new(),
            );
        }
    };

    let iterations = result.get_iter() as usize;
    let fn_evals = result.get_func_counts().clone();
    let status = result.get_termination_status().clone();
    let terminal = terminal_state(&status);
    let grad = result.take_gradient();
    let value = result.get_best_cost();
    info!(logger, "argmin lbfgs finished";
        "terminal" => %terminal,
        "iterations" => iterations,
        "loss" => value
    );
    OptimOutcome::new(
        result.take_best_param(),
        value,
        terminal,
        format!("{status:?}"),
        iterations,
        fn_evals,
        grad.as_ref(),
        Vec::new(),
    )
}

/// Map argmin's termination status onto [`TerminalState`].
pub fn terminal_state(status: &TerminationStatus) -> TerminalState {
    match status {
        TerminationStatus::Terminated(reason) => match reason {
            TerminationReason::SolverConverged | TerminationReason::TargetCostReached => {
                TerminalState::Converged
            }
            TerminationReason::MaxItersReached
            | TerminationReason::Timeout
            | TerminationReason::Interrupt => TerminalState::MaxIterationsReached,
            _ => TerminalState::Diverged,
        },
        TerminationStatus::NotTerminated => TerminalState::MaxIterationsReached,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::quasi_newton::{
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        observer::discard_logger,
        traits::Tolerances,
        types::{COST_COUNT, Cost},
    };
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Termination-status mapping.
    // - End-to-end argmin runs with both line searches on a quadratic.
    // - `Diverged` reporting for an objective that is NaN at the start.
    // -------------------------------------------------------------------------

    struct Quadratic;

    impl Objective for Quadratic {
        fn dimension(&self) -> usize {
            2
        }
        fn loss(&self, theta: &Theta) -> OptResult<Cost> {
            Ok((theta[0] - 1.0).powi(2) + 4.0 * (theta[1] + 2.0).powi(2))
        }
        fn gradient(&self, theta: &Theta) -> OptResult<Grad> {
            Ok(array![2.0 * (theta[0] - 1.0), 8.0 * (theta[1] + 2.0)])
        }
    }

    struct Poisoned;

    impl Objective for Poisoned {
        fn dimension(&self) -> usize {
            1
        }
        fn loss(&self, _: &Theta) -> OptResult<Cost> {
            Ok(f64::NAN)
        }
        fn gradient(&self, _: &Theta) -> OptResult<Grad> {
            Ok(array![f64::NAN])
        }
    }

    fn opts() -> QuasiNewtonOptions {
        QuasiNewtonOptions {
            tols: Tolerances::new(1e-8, 1e-14, 200).unwrap(),
            ..QuasiNewtonOptions::default()
        }
    }

    #[test]
    // Purpose
    // -------
    // argmin termination reasons map onto the three terminal states.
    //
    // Given
    // -----
    // - `SolverConverged`, `MaxItersReached`, `SolverExit(..)`.
    //
    // Expect
    // ------
    // - `Converged`, `MaxIterationsReached`, `Diverged`.
    fn terminal_state_maps_termination_reasons() {
        assert_eq!(
            terminal_state(&TerminationStatus::Terminated(TerminationReason::SolverConverged)),
            TerminalState::Converged
        );
        assert_eq!(
            terminal_state(&TerminationStatus::Terminated(TerminationReason::MaxItersReached)),
            TerminalState::MaxIterationsReached
        );
        assert_eq!(
            terminal_state(&TerminationStatus::Terminated(TerminationReason::SolverExit(
                "line search".to_string()
            ))),
            TerminalState::Diverged
        );
    }

    #[test]
    // Purpose
    // -------
    // Both argmin line searches solve a separable quadratic.
    //
    // Given
    // -----
    // - Minimizer `(1, -2)`, start at the origin.
    //
    // Expect
    // ------
    // - Non-diverged outcome within 1e-5 of the minimizer, with argmin's
    //   counters reported.
    fn argmin_runs_reach_minimizer() {
        let logger = discard_logger();
        let opts = opts();

        let mt = run_lbfgs(
            array![0.0, 0.0],
            &opts,
            ArgMinAdapter::new(&Quadratic),
            build_optimizer_more_thuente(&opts).unwrap(),
            &logger,
        )
        .unwrap();
        let hz = run_lbfgs(
            array![0.0, 0.0],
            &opts,
            ArgMinAdapter::new(&Quadratic),
            build_optimizer_hager_zhang(&opts).unwrap(),
            &logger,
        )
        .unwrap();

        for out in [mt, hz] {
            assert_ne!(out.terminal, TerminalState::Diverged);
            assert!((out.theta_hat[0] - 1.0).abs() < 1e-5);
            assert!((out.theta_hat[1] + 2.0).abs() < 1e-5);
            assert!(out.fn_evals.get(COST_COUNT).copied().unwrap_or(0) > 0);
        }
    }

    #[test]
    // Purpose
    // -------
    // A NaN objective aborts the argmin run and is reported as `Diverged`.
    //
    // Given
    // -----
    // - `Poisoned` started at `[0.25]`.
    //
    // Expect
    // ------
    // - `Ok(outcome)` with `Diverged` and `θ̂ = θ₀`.
    fn nan_objective_reports_diverged() {
        // Arrange
        let opts = opts();

        // Act
        let out = run_lbfgs(
            array![0.25],
            &opts,
            ArgMinAdapter::new(&Poisoned),
            build_optimizer_more_thuente(&opts).unwrap(),
            &discard_logger(),
        )
        .unwrap();

        // Assert
        assert_eq!(out.terminal, TerminalState::Diverged);
        assert_eq!(out.theta_hat, array![0.25]);
    }
}
