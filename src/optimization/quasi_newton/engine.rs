//! quasi_newton::engine — the native limited-memory BFGS loop.
//!
//! Purpose
//! -------
//! Minimize an [`Objective`] with L-BFGS and a strong-Wolfe line search,
//! returning an [`OptimOutcome`] whose terminal state is always one of
//! `Converged`, `MaxIterationsReached` or `Diverged`.
//!
//! Key behaviors
//! -------------
//! - Before every iteration the gradient test `‖g‖ ≤ tol_grad · max(1, ‖θ‖)`
//!   is applied, so an already-optimal start terminates after 0 iterations.
//! - Directions come from [`LbfgsHistory`]; a non-descent direction drops the
//!   history and falls back to steepest descent.
//! - A failed line search is retried up to `line_search_retries` times, each
//!   retry dropping the history and shrinking the initial step 10×. When all
//!   retries fail the run ends `Diverged`.
//! - Relative loss improvement below `tol_cost` for `stall_iterations`
//!   consecutive quasi-Newton iterations ends the run `Converged`.
//!   Steepest-descent steps (empty history, or a retry) never count toward
//!   the stall window, so a badly scaled start cannot pass for convergence.
//!   A line search whose loss changes are below `f64` resolution
//!   ([`SearchOutcome::RoundOff`]) also ends the run `Converged`.
//! - Steepest-descent searches start at `1 / ‖g‖`, raised when needed so
//!   the predicted decrease is resolvable against `|f|`.
//! - A non-finite loss or gradient at the start ends the run `Diverged`
//!   before any step is taken.
//!
//! Invariants & assumptions
//! ------------------------
//! - `theta_hat` is always the last accepted (finite) iterate.
//! - Accepted steps satisfy sufficient decrease, so `loss_trace` is strictly
//!   decreasing after its first entry.
//! - Only one objective evaluation per line-search trial (`loss_and_gradient`).
//!
//! Conventions
//! -----------
//! - Per-iteration records are logged at `debug`, the terminal state at
//!   `info`, both to the caller's `slog::Logger`.
use crate::optimization::{
    errors::OptResult,
    quasi_newton::{
        history::LbfgsHistory,
        line_search::{EvalCounter, SearchOutcome, StrongWolfe},
        traits::{Objective, OptimOutcome, QuasiNewtonOptions, TerminalState},
        types::{Cost, Grad, Theta},
    },
};
use argmin_math::ArgminL2Norm;
use slog::{Logger, debug, info};

/// Run the native L-BFGS engine from `theta0`.
///
/// Parameters
/// ----------
/// - `f`: objective to minimize; `f.check(&theta0)` is expected to have
///   passed already.
/// - `theta0`: starting point (consumed).
/// - `opts`: validated optimizer options.
/// - `logger`: destination for iteration and terminal records.
///
/// Returns
/// -------
/// `OptResult<OptimOutcome>` with the terminal state, the last accepted
/// iterate and the full loss trace. Divergence is reported through
/// `TerminalState::Diverged`, not as an error.
///
/// Errors
/// ------
/// - Objective errors that are not non-finite failures (e.g. a dimension
///   mismatch inside the objective) are propagated unchanged.
pub fn run_native<F: Objective + ?Sized>(
    f: &F, theta0: Theta, opts: &QuasiNewtonOptions, logger: &Logger,
) -> OptResult<OptimOutcome> {
    let mut counter = EvalCounter::default();
    counter.record_joint();
    let (mut loss, mut grad) = match f.loss_and_gradient(&theta0) {
        Ok(pair) => pair,
        Err(e) if e.is_non_finite() => {
            return diverged(theta0, f64::NAN, None, 0, counter, Vec::new(), e.to_string(), logger);
        }
        Err(e) => return Err(e),
    };
    if !loss.is_finite() || grad.iter().any(|g| !g.is_finite()) {
        let reason = format!("non-finite initial loss or gradient (loss = {loss})");
        return diverged(theta0, loss, None, 0, counter, Vec::new(), reason, logger);
    }

    let mut theta = theta0;
    let mut history = LbfgsHistory::new(opts.memory_depth);
    let mut loss_trace = vec![loss];
    let mut iterations = 0usize;
    let mut stalled = 0usize;

    let (terminal, status) = loop {
        let grad_norm = grad.l2_norm();
        if grad_norm <= opts.tols.tol_grad * theta.l2_norm().max(1.0) {
            break (TerminalState::Converged, "gradient norm below tolerance".to_string());
        }
        if iterations >= opts.tols.max_iter {
            break (TerminalState::MaxIterationsReached, "iteration limit reached".to_string());
        }

        let (outcome, quasi_newton) = search_with_retries(
            f,
            &theta,
            loss,
            &grad,
            &mut history,
            opts,
            &mut counter,
        )?;
        let trial = match outcome {
            SearchOutcome::Accepted(trial) => trial,
            SearchOutcome::RoundOff => {
                break (
                    TerminalState::Converged,
                    "loss decrease below floating-point resolution".to_string(),
                );
            }
            SearchOutcome::Failed => {
                let reason = format!(
                    "line search failed after {} retries at iteration {iterations}",
                    opts.line_search_retries
                );
                return diverged(
                    theta,
                    loss,
                    Some(&grad),
                    iterations,
                    counter,
                    loss_trace,
                    reason,
                    logger,
                );
            }
        };

        let improvement = (loss - trial.loss) / loss.abs().max(1.0);
        let s = &trial.theta - &theta;
        let y = &trial.grad - &grad;
        history.push(s, y);

        let step = trial.step;
        theta = trial.theta;
        loss = trial.loss;
        grad = trial.grad;
        iterations += 1;
        loss_trace.push(loss);

        debug!(logger, "lbfgs iteration";
            "iter" => iterations,
            "loss" => loss,
            "grad_norm" => grad.l2_norm(),
            "step" => step,
            "history" => history.len()
        );

        stalled = match (improvement < opts.tols.tol_cost, quasi_newton) {
            (false, _) => 0,
            (true, true) => stalled + 1,
            (true, false) => stalled,
        };
        if stalled >= opts.stall_iterations {
            break (
                TerminalState::Converged,
                format!("relative improvement below tolerance for {stalled} iterations"),
            );
        }
    };

    info!(logger, "lbfgs finished";
        "terminal" => %terminal,
        "iterations" => iterations,
        "loss" => loss,
        "cost_count" => counter.cost
    );
    OptimOutcome::new(
        Some(theta),
        loss,
        terminal,
        status,
        iterations,
        counter.to_map(),
        Some(&grad),
        loss_trace,
    )
}

/// Pick a direction and line-search along it, retrying with steepest descent
/// and a shrinking initial step on failure.
///
/// The flag is `true` when the returned outcome came from a quasi-Newton
/// direction, i.e. a non-empty history on the first attempt.
fn search_with_retries<F: Objective + ?Sized>(
    f: &F, theta: &Theta, loss: Cost, grad: &Grad, history: &mut LbfgsHistory,
    opts: &QuasiNewtonOptions, counter: &mut EvalCounter,
) -> OptResult<(SearchOutcome, bool)> {
    let mut direction = history.direction(grad);
    let slope = direction.dot(grad);
    if !(slope < 0.0) || !slope.is_finite() {
        history.clear();
        direction = -grad;
    }
    let mut quasi_newton = !history.is_empty();
    let mut step = if quasi_newton { 1.0 } else { initial_step(loss, grad) };

    for attempt in 0..=opts.line_search_retries {
        if attempt > 0 {
            history.clear();
            direction = -grad;
            step *= 0.1;
            quasi_newton = false;
        }
        let search = StrongWolfe::new(f, theta, loss, grad, &direction, &opts.line_search, counter);
        match search.search(step)? {
            SearchOutcome::Failed => continue,
            done => return Ok((done, quasi_newton)),
        }
    }
    Ok((SearchOutcome::Failed, false))
}

/// Relative size of the predicted first-step decrease `α‖g‖²` against `|f|`
/// below which a steepest-descent step is lost to rounding.
const RESOLVABLE_DECREASE: f64 = 1.490_116_119_384_765_6e-8;

/// First step of a steepest-descent search: unit step capped at `1 / ‖g‖`,
/// raised to `RESOLVABLE_DECREASE · |f| / ‖g‖²` when that is larger.
fn initial_step(loss: Cost, grad: &Grad) -> f64 {
    let norm = grad.l2_norm();
    let unit = if norm > 1.0 { 1.0 / norm } else { 1.0 };
    let resolvable = RESOLVABLE_DECREASE * loss.abs() / (norm * norm);
    if resolvable.is_finite() { unit.max(resolvable) } else { unit }
}

#[allow(clippy::too_many_arguments)]
fn diverged(
    theta: Theta, loss: Cost, grad: Option<&Grad>, iterations: usize, counter: EvalCounter,
    loss_trace: Vec<Cost>, reason: String, logger: &Logger,
) -> OptResult<OptimOutcome> {
    info!(logger, "lbfgs finished";
        "terminal" => %TerminalState::Diverged,
        "iterations" => iterations,
        "reason" => &reason
    );
    OptimOutcome::new(
        Some(theta),
        loss,
        TerminalState::Diverged,
        reason,
        iterations,
        counter.to_map(),
        grad,
        loss_trace,
    )
}
