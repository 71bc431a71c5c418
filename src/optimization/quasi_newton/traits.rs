//! Public API surface for quasi-Newton minimization.
//!
//! - [`Objective`]: trait callers implement for the function being minimized.
//! - [`QuasiNewtonOptions`], [`Tolerances`] and [`LineSearchOptions`]:
//!   configuration for the optimizer.
//! - [`Solver`] / [`LineSearcher`]: choice between the native engine and the
//!   argmin reference solver.
//! - [`TerminalState`] and [`OptimOutcome`]: normalized result returned by
//!   [`minimize`](super::minimize).
//!
//! Convention: the optimizer *minimizes* `f(θ)` directly; gradients are
//! `∇f(θ)` with no sign flip.
use crate::optimization::{
    errors::{OptError, OptResult},
    quasi_newton::{
        types::{Cost, DEFAULT_MEMORY_DEPTH, FnEvalMap, Grad, Theta},
        validation::{
            validate_theta_hat, validate_value, verify_line_search, verify_max_iter,
            verify_memory_depth, verify_stall_iterations, verify_tol_cost, verify_tol_grad,
        },
    },
};
use argmin_math::ArgminL2Norm;
use std::{fmt, str::FromStr};

/// User-implemented objective interface.
///
/// Required:
/// - `dimension() -> usize`: expected length of `θ`.
/// - `loss(&Theta) -> OptResult<Cost>`: evaluate `f(θ)`.
/// - `gradient(&Theta) -> OptResult<Grad>`: evaluate `∇f(θ)`.
///
/// Optional:
/// - `loss_and_gradient(&Theta)`: both in one pass. The default calls the
///   two required methods; implementors with a shared forward pass should
///   override it since the engine only ever calls this method.
/// - `check(&Theta)`: validation hook called once before optimization. The
///   default enforces the dimension and finiteness of `θ`.
///
/// Non-finite loss values may be returned as `Ok`; the optimizer treats them
/// as overshoot during line search and as divergence at the starting point.
pub trait Objective {
    fn dimension(&self) -> usize;
    fn loss(&self, theta: &Theta) -> OptResult<Cost>;
    fn gradient(&self, theta: &Theta) -> OptResult<Grad>;

    fn loss_and_gradient(&self, theta: &Theta) -> OptResult<(Cost, Grad)> {
        Ok((self.loss(theta)?, self.gradient(theta)?))
    }

    fn check(&self, theta: &Theta) -> OptResult<()> {
        let expected = self.dimension();
        if theta.len() != expected {
            return Err(OptError::ThetaLengthMismatch { expected, actual: theta.len() });
        }
        if let Some((index, &value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(OptError::InvalidThetaInput { index, value });
        }
        Ok(())
    }
}

/// Choice of line search used inside the argmin reference solver.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names
/// (`"MoreThuente"`, `"HagerZhang"`). Unknown names return
/// `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Which optimizer runs the fit.
///
/// - `Native`: this crate's L-BFGS engine with a strong-Wolfe line search,
///   deterministic retries and a recorded loss trace.
/// - `Argmin(ls)`: argmin's `LBFGS` with the given line search, kept as a
///   reference implementation for cross-checking fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Solver {
    #[default]
    Native,
    Argmin(LineSearcher),
}

impl FromStr for Solver {
    type Err = OptError;

    /// Accepts `"native"` or any [`LineSearcher`] name (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("native") {
            return Ok(Solver::Native);
        }
        Ok(Solver::Argmin(s.parse()?))
    }
}

/// Numerical tolerances and iteration limits.
///
/// - `tol_grad`: converged when `‖g‖ ≤ tol_grad · max(1, ‖θ‖)`.
/// - `tol_cost`: an iteration whose relative loss improvement falls below
///   this value counts toward the stall window.
/// - `max_iter`: hard cap on the number of iterations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: f64,
    pub tol_cost: f64,
    pub max_iter: usize,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(tol_grad: f64, tol_cost: f64, max_iter: usize) -> OptResult<Self> {
        verify_tol_grad(tol_grad)?;
        verify_tol_cost(tol_cost)?;
        verify_max_iter(max_iter)?;
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self { tol_grad: 1e-6, tol_cost: 1e-6, max_iter: 200 }
    }
}

/// Strong-Wolfe line-search constants.
///
/// - `c1`: sufficient-decrease (Armijo) constant.
/// - `c2`: curvature constant, `c1 < c2 < 1`.
/// - `max_trials`: objective evaluations allowed per search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSearchOptions {
    pub c1: f64,
    pub c2: f64,
    pub max_trials: usize,
}

impl LineSearchOptions {
    /// Construct validated line-search constants.
    ///
    /// # Errors
    /// - [`OptError::InvalidLineSearchParam`] unless `0 < c1 < c2 < 1` and
    ///   `max_trials ≥ 1`.
    pub fn new(c1: f64, c2: f64, max_trials: usize) -> OptResult<Self> {
        verify_line_search(c1, c2, max_trials)?;
        Ok(Self { c1, c2, max_trials })
    }
}

impl Default for LineSearchOptions {
    fn default() -> Self {
        Self { c1: 1e-4, c2: 0.9, max_trials: 20 }
    }
}

/// Optimizer-level configuration.
///
/// Fields:
/// - `tols: Tolerances` — tolerances and iteration limit.
/// - `memory_depth` — number of `(s, y)` pairs kept by L-BFGS.
/// - `stall_iterations` — consecutive low-improvement iterations that count
///   as convergence.
/// - `line_search_retries` — retries after a failed line search, each one
///   dropping the history and shrinking the initial step 10×.
/// - `line_search: LineSearchOptions` — strong-Wolfe constants.
/// - `solver: Solver` — native engine or argmin reference solver.
/// - `verbose: bool` — if `true` and the `obs_slog` feature is enabled, the
///   argmin path attaches a terminal slog observer.
///
/// Default:
/// - `tols`: `tol_grad = 1e-6`, `tol_cost = 1e-6`, `max_iter = 200`
/// - `memory_depth`: 7, `stall_iterations`: 3, `line_search_retries`: 2
/// - `line_search`: `c1 = 1e-4`, `c2 = 0.9`, `max_trials = 20`
/// - `solver`: `Native`, `verbose`: `false`
#[derive(Debug, Clone, PartialEq)]
pub struct QuasiNewtonOptions {
    pub tols: Tolerances,
    pub memory_depth: usize,
    pub stall_iterations: usize,
    pub line_search_retries: usize,
    pub line_search: LineSearchOptions,
    pub solver: Solver,
    pub verbose: bool,
}

impl QuasiNewtonOptions {
    /// Create a validated set of optimizer options.
    ///
    /// Tolerances and line-search constants are validated by their own
    /// constructors; this checks the remaining integer knobs.
    ///
    /// # Errors
    /// - [`OptError::InvalidMemoryDepth`] if `memory_depth == 0`.
    /// - [`OptError::InvalidStallIterations`] if `stall_iterations == 0`.
    pub fn new(
        tols: Tolerances, memory_depth: usize, stall_iterations: usize, line_search_retries: usize,
        line_search: LineSearchOptions, solver: Solver, verbose: bool,
    ) -> OptResult<Self> {
        verify_memory_depth(memory_depth)?;
        verify_stall_iterations(stall_iterations)?;
        Ok(Self {
            tols,
            memory_depth,
            stall_iterations,
            line_search_retries,
            line_search,
            solver,
            verbose,
        })
    }
}

impl Default for QuasiNewtonOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances::default(),
            memory_depth: DEFAULT_MEMORY_DEPTH,
            stall_iterations: 3,
            line_search_retries: 2,
            line_search: LineSearchOptions::default(),
            solver: Solver::Native,
            verbose: false,
        }
    }
}

/// Terminal state of one optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
    /// Gradient or stall criterion met.
    Converged,
    /// Iteration budget exhausted before convergence.
    MaxIterationsReached,
    /// Non-finite start, or line search failed after every retry.
    Diverged,
}

impl fmt::Display for TerminalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalState::Converged => write!(f, "Converged"),
            TerminalState::MaxIterationsReached => write!(f, "MaxIterationsReached"),
            TerminalState::Diverged => write!(f, "Diverged"),
        }
    }
}

/// Canonical result returned by `minimize`.
///
/// - `theta_hat`: last accepted parameter vector (always finite).
/// - `value`: loss at `theta_hat`; may be non-finite only when the run
///   diverged at its starting point.
/// - `terminal`: how the run ended.
/// - `status`: human-readable termination detail.
/// - `iterations`: number of accepted steps.
/// - `fn_evals`: keys `"cost_count"` and `"gradient_count"`.
/// - `grad_norm`: norm of the gradient at `theta_hat`, if available.
/// - `loss_trace`: initial loss followed by the loss after every accepted
///   step; empty when the backend does not record one.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: Cost,
    pub terminal: TerminalState,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
    pub loss_trace: Vec<Cost>,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// Performs:
    /// - `theta_hat` check via `validate_theta_hat` (present and all finite).
    /// - `value` check via `validate_value` unless the run diverged.
    /// - Computes `grad_norm` if a gradient was provided.
    ///
    /// # Errors
    /// - Propagates any validation errors for `theta_hat` or `value`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        theta_hat_opt: Option<Theta>, value: Cost, terminal: TerminalState, status: String,
        iterations: usize, fn_evals: FnEvalMap, grad: Option<&Grad>, loss_trace: Vec<Cost>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        if terminal != TerminalState::Diverged {
            validate_value(value)?;
        }
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self { theta_hat, value, terminal, status, iterations, fn_evals, grad_norm, loss_trace })
    }

    /// `true` when the run ended in [`TerminalState::Converged`].
    pub fn converged(&self) -> bool {
        self.terminal == TerminalState::Converged
    }
}
