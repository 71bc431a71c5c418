//! quasi_newton::line_search — strong-Wolfe line search for the native engine.
//!
//! Purpose
//! -------
//! Find a step `α > 0` along a descent direction `d` such that
//!
//! ```text
//! f(θ + αd) ≤ f(θ) + c1·α·∇f(θ)ᵀd          (sufficient decrease)
//! |∇f(θ + αd)ᵀd| ≤ c2·|∇f(θ)ᵀd|            (strong curvature)
//! ```
//!
//! Key behaviors
//! -------------
//! - Bracketing phase doubles `α` until the interval `[α_prev, α]` brackets
//!   an acceptable step, then a zoom phase shrinks it with a safeguarded
//!   quadratic interpolation (bisection when the quadratic is unusable).
//! - A trial with a non-finite loss or gradient, or one whose evaluation
//!   fails with a non-finite [`OptError`], counts as overshoot and becomes
//!   the upper end of the bracket.
//! - At most `max_trials` objective evaluations are made. If the budget runs
//!   out, the lowest-loss trial that satisfied sufficient decrease is
//!   returned. Otherwise the search reports [`SearchOutcome::RoundOff`] when
//!   the last trial's loss was indistinguishable from `f(θ)` at `f64`
//!   resolution, and [`SearchOutcome::Failed`] in every other case.
//!
//! Invariants & assumptions
//! ------------------------
//! - The caller passes a descent direction (`∇f(θ)ᵀd < 0`); anything else is
//!   reported as failure without evaluating the objective.
//! - Any returned trial satisfies sufficient decrease, so its loss is
//!   strictly below `f(θ)`.
//!
//! Conventions
//! -----------
//! - Hard objective errors (dimension mismatch, empty data) are propagated
//!   unchanged; only non-finite failures are absorbed.
use crate::optimization::{
    errors::OptResult,
    quasi_newton::{
        traits::{LineSearchOptions, Objective},
        types::{COST_COUNT, Cost, FnEvalMap, GRADIENT_COUNT, Grad, Theta},
    },
};

/// Loss changes at or below `ROUNDOFF_EPS · max(|f(θ)|, 1)` are treated as
/// floating-point noise.
pub const ROUNDOFF_EPS: f64 = 16.0 * f64::EPSILON;

/// Result of one line search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// An acceptable step (strong Wolfe, or the best Armijo point once the
    /// budget ran out).
    Accepted(Trial),
    /// No decrease was resolvable in `f64`; the iterate is optimal to
    /// machine precision along this direction.
    RoundOff,
    /// No acceptable step and no evidence of round-off.
    Failed,
}

/// Objective / gradient evaluation counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalCounter {
    pub cost: u64,
    pub gradient: u64,
}

impl EvalCounter {
    /// Record one joint loss + gradient evaluation.
    pub fn record_joint(&mut self) {
        self.cost += 1;
        self.gradient += 1;
    }

    pub fn to_map(self) -> FnEvalMap {
        FnEvalMap::from([
            (COST_COUNT.to_string(), self.cost),
            (GRADIENT_COUNT.to_string(), self.gradient),
        ])
    }
}

/// One evaluated point along the search ray.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub step: f64,
    pub theta: Theta,
    pub loss: Cost,
    pub grad: Grad,
    /// Directional derivative `∇f(θ + αd)ᵀd`.
    pub slope: f64,
}

impl Trial {
    fn is_finite(&self) -> bool {
        self.loss.is_finite() && self.slope.is_finite() && self.grad.iter().all(|g| g.is_finite())
    }

    fn point(&self) -> Point {
        Point { step: self.step, loss: self.loss, slope: self.slope }
    }
}

#[derive(Debug, Clone, Copy)]
struct Point {
    step: f64,
    loss: f64,
    slope: f64,
}

/// Strong-Wolfe search along `direction` from `theta`.
pub struct StrongWolfe<'a, F: Objective + ?Sized> {
    f: &'a F,
    theta: &'a Theta,
    direction: &'a Grad,
    loss0: Cost,
    slope0: f64,
    opts: &'a LineSearchOptions,
    counter: &'a mut EvalCounter,
    trials: usize,
    best: Option<Trial>,
    last_change: Option<f64>,
}

impl<'a, F: Objective + ?Sized> StrongWolfe<'a, F> {
    pub fn new(
        f: &'a F, theta: &'a Theta, loss0: Cost, grad0: &Grad, direction: &'a Grad,
        opts: &'a LineSearchOptions, counter: &'a mut EvalCounter,
    ) -> Self {
        let slope0 = grad0.dot(direction);
        Self {
            f,
            theta,
            direction,
            loss0,
            slope0,
            opts,
            counter,
            trials: 0,
            best: None,
            last_change: None,
        }
    }

    /// Run the search starting from `initial_step`.
    ///
    /// # Errors
    /// Propagates objective errors that are not non-finite failures.
    pub fn search(mut self, initial_step: f64) -> OptResult<SearchOutcome> {
        if !(self.slope0 < 0.0) || !self.loss0.is_finite() || !(initial_step > 0.0) {
            return Ok(SearchOutcome::Failed);
        }
        let mut prev = Point { step: 0.0, loss: self.loss0, slope: self.slope0 };
        let mut step = initial_step;
        let mut first = true;

        while self.trials < self.opts.max_trials {
            let trial = self.evaluate(step)?;
            if !trial.is_finite()
                || trial.loss > self.armijo_bound(step)
                || (!first && trial.loss >= prev.loss)
            {
                let hi = trial.point();
                return self.zoom(prev, hi);
            }
            if self.satisfies_curvature(&trial) {
                return Ok(SearchOutcome::Accepted(trial));
            }
            let point = trial.point();
            self.remember(trial);
            if point.slope >= 0.0 {
                return self.zoom(point, prev);
            }
            prev = point;
            step *= 2.0;
            first = false;
        }
        Ok(self.finish())
    }

    fn zoom(mut self, mut lo: Point, mut hi: Point) -> OptResult<SearchOutcome> {
        while self.trials < self.opts.max_trials {
            let width = (hi.step - lo.step).abs();
            if width <= f64::EPSILON * lo.step.abs().max(hi.step.abs()) {
                break;
            }
            let step = interpolate(lo, hi);
            let trial = self.evaluate(step)?;
            if !trial.is_finite() || trial.loss > self.armijo_bound(step) || trial.loss >= lo.loss
            {
                hi = trial.point();
                continue;
            }
            if self.satisfies_curvature(&trial) {
                return Ok(SearchOutcome::Accepted(trial));
            }
            let point = trial.point();
            self.remember(trial);
            if point.slope * (hi.step - lo.step) >= 0.0 {
                hi = lo;
            }
            lo = point;
        }
        Ok(self.finish())
    }

    fn finish(self) -> SearchOutcome {
        if let Some(best) = self.best {
            return SearchOutcome::Accepted(best);
        }
        match self.last_change {
            Some(change) if change <= ROUNDOFF_EPS * self.loss0.abs().max(1.0) => {
                SearchOutcome::RoundOff
            }
            _ => SearchOutcome::Failed,
        }
    }

    fn evaluate(&mut self, step: f64) -> OptResult<Trial> {
        let mut theta = self.theta.clone();
        theta.scaled_add(step, self.direction);
        self.trials += 1;
        self.counter.record_joint();
        let trial = match self.f.loss_and_gradient(&theta) {
            Ok((loss, grad)) => {
                let slope = grad.dot(self.direction);
                Trial { step, theta, loss, grad, slope }
            }
            Err(e) if e.is_non_finite() => Trial {
                step,
                theta,
                loss: f64::INFINITY,
                grad: Grad::zeros(0),
                slope: f64::NAN,
            },
            Err(e) => return Err(e),
        };
        self.last_change = trial.is_finite().then(|| (trial.loss - self.loss0).abs());
        Ok(trial)
    }

    fn armijo_bound(&self, step: f64) -> f64 {
        self.loss0 + self.opts.c1 * step * self.slope0
    }

    fn satisfies_curvature(&self, trial: &Trial) -> bool {
        trial.slope.abs() <= -self.opts.c2 * self.slope0
    }

    /// Keep `trial` as the fallback answer if it lowers the loss below both
    /// `f(θ)` and the best trial so far.
    fn remember(&mut self, trial: Trial) {
        let better = trial.loss < self.loss0
            && match &self.best {
                Some(best) => trial.loss < best.loss,
                None => true,
            };
        if better {
            self.best = Some(trial);
        }
    }
}

/// Safeguarded minimizer of the quadratic through `(lo.loss, lo.slope)` and
/// `hi.loss`, kept inside the middle 80% of the bracket. Falls back to
/// bisection when `hi` is non-finite or the quadratic has no minimum.
fn interpolate(lo: Point, hi: Point) -> f64 {
    let delta = hi.step - lo.step;
    let denom = 2.0 * (hi.loss - lo.loss - lo.slope * delta);
    let candidate = if hi.loss.is_finite() && denom > 0.0 {
        lo.step - lo.slope * delta * delta / denom
    } else {
        lo.step + 0.5 * delta
    };
    let a = lo.step + 0.1 * delta;
    let b = lo.step + 0.9 * delta;
    let (min, max) = if a <= b { (a, b) } else { (b, a) };
    if candidate.is_finite() { candidate.clamp(min, max) } else { lo.step + 0.5 * delta }
}
