//! Pulse options — configuration for event logging and model fitting.
//!
//! Purpose
//! -------
//! Collect every knob of a [`PulseModel`](crate::pulse::models::PulseModel)
//! in one plain data carrier: optimizer tolerances and limits, worker count,
//! penalty weight, reward family, vocabulary policy and feature layout.
//!
//! Key behaviors
//! -------------
//! - [`PulseOptions::default`] gives the documented defaults.
//! - `with_*` builders validate their argument and return
//!   [`PulseResult<Self>`]; builders over closed enums are infallible.
//! - [`PulseOptions::to_quasi_newton`] projects the optimizer-facing subset
//!   onto [`QuasiNewtonOptions`], re-validating it through that type's own
//!   constructors.
//!
//! Invariants & assumptions
//! ------------------------
//! - Fields are public, so a struct literal can bypass the builders;
//!   [`PulseOptions::validate`] runs every check and is called by the model
//!   constructor.
//! - `convergence_tolerance` drives both the gradient test and the
//!   relative-improvement stall test.
//!
//! Testing notes
//! -------------
//! - Unit tests cover defaults, each builder's rejection path, and the
//!   projection onto optimizer options.
use super::{
    features::FeatureConfig,
    reward_model::RewardModel,
    validation::{validate_regularization, validate_worker_count},
    vocabulary::VocabularyPolicy,
};
use crate::{
    optimization::quasi_newton::{
        DEFAULT_MEMORY_DEPTH, LineSearchOptions, QuasiNewtonOptions, Solver, Tolerances,
    },
    pulse::errors::PulseResult,
};

/// Default gradient / improvement tolerance.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Default iteration cap per fit.
pub const DEFAULT_MAX_ITERATIONS: usize = 200;

/// PulseOptions — configuration of a pulse model.
///
/// Fields
/// ------
/// - `convergence_tolerance`: `> 0`, finite. Default `1e-6`.
/// - `max_iterations`: `≥ 1`. Default `200`.
/// - `memory_depth`: L-BFGS history length, `≥ 1`. Default `7`.
/// - `worker_count`: threads evaluating loss/gradient blocks, `≥ 1`.
///   Default: available parallelism.
/// - `regularization`: L2 penalty weight `λ ≥ 0`. Default `0`.
/// - `reward_model`: likelihood family. Default Gaussian.
/// - `vocabulary_policy`: open or closed id sets. Default open.
/// - `features`: feature layout. Default bias + actions + observations.
/// - `stall_iterations`: consecutive low-improvement iterations before
///   declaring convergence, `≥ 1`. Default `3`.
/// - `line_search_retries`: retries after a failed line search. Default `2`.
/// - `line_search`: strong-Wolfe constants. Default `c1 = 1e-4`, `c2 = 0.9`,
///   `max_trials = 20`.
/// - `solver`: native engine or the argmin reference solver.
/// - `verbose`: log optimizer progress to stderr.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseOptions {
    pub convergence_tolerance: f64,
    pub max_iterations: usize,
    pub memory_depth: usize,
    pub worker_count: usize,
    pub regularization: f64,
    pub reward_model: RewardModel,
    pub vocabulary_policy: VocabularyPolicy,
    pub features: FeatureConfig,
    pub stall_iterations: usize,
    pub line_search_retries: usize,
    pub line_search: LineSearchOptions,
    pub solver: Solver,
    pub verbose: bool,
}

impl PulseOptions {
    /// Run every check on the current field values.
    ///
    /// # Errors
    /// - [`PulseError::InvalidOption`](crate::pulse::errors::PulseError::InvalidOption)
    ///   naming the first invalid field.
    pub fn validate(&self) -> PulseResult<()> {
        validate_worker_count(self.worker_count)?;
        validate_regularization(self.regularization)?;
        self.features.validate()?;
        self.to_quasi_newton()?;
        Ok(())
    }

    /// Optimizer options implied by these settings.
    ///
    /// # Errors
    /// - `InvalidOption` for invalid tolerance, iteration cap, memory depth,
    ///   stall window, or line-search constants.
    pub fn to_quasi_newton(&self) -> PulseResult<QuasiNewtonOptions> {
        let tols = Tolerances::new(
            self.convergence_tolerance,
            self.convergence_tolerance,
            self.max_iterations,
        )?;
        let line_search = LineSearchOptions::new(
            self.line_search.c1,
            self.line_search.c2,
            self.line_search.max_trials,
        )?;
        Ok(QuasiNewtonOptions::new(
            tols,
            self.memory_depth,
            self.stall_iterations,
            self.line_search_retries,
            line_search,
            self.solver,
            self.verbose,
        )?)
    }

    pub fn with_convergence_tolerance(mut self, tol: f64) -> PulseResult<Self> {
        self.convergence_tolerance = tol;
        Tolerances::new(tol, tol, self.max_iterations)?;
        Ok(self)
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> PulseResult<Self> {
        self.max_iterations = max_iterations;
        Tolerances::new(self.convergence_tolerance, self.convergence_tolerance, max_iterations)?;
        Ok(self)
    }

    pub fn with_memory_depth(mut self, memory_depth: usize) -> PulseResult<Self> {
        self.memory_depth = memory_depth;
        self.to_quasi_newton()?;
        Ok(self)
    }

    pub fn with_stall_iterations(mut self, stall_iterations: usize) -> PulseResult<Self> {
        self.stall_iterations = stall_iterations;
        self.to_quasi_newton()?;
        Ok(self)
    }

    pub fn with_worker_count(mut self, worker_count: usize) -> PulseResult<Self> {
        validate_worker_count(worker_count)?;
        self.worker_count = worker_count;
        Ok(self)
    }

    pub fn with_regularization(mut self, lambda: f64) -> PulseResult<Self> {
        validate_regularization(lambda)?;
        self.regularization = lambda;
        Ok(self)
    }

    pub fn with_features(mut self, features: FeatureConfig) -> PulseResult<Self> {
        features.validate()?;
        self.features = features;
        Ok(self)
    }

    pub fn with_line_search(mut self, c1: f64, c2: f64, max_trials: usize) -> PulseResult<Self> {
        self.line_search = LineSearchOptions::new(c1, c2, max_trials)?;
        Ok(self)
    }

    pub fn with_line_search_retries(mut self, retries: usize) -> Self {
        self.line_search_retries = retries;
        self
    }

    pub fn with_reward_model(mut self, reward_model: RewardModel) -> Self {
        self.reward_model = reward_model;
        self
    }

    pub fn with_vocabulary_policy(mut self, policy: VocabularyPolicy) -> Self {
        self.vocabulary_policy = policy;
        self
    }

    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Default for PulseOptions {
    fn default() -> Self {
        Self {
            convergence_tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            memory_depth: DEFAULT_MEMORY_DEPTH,
            worker_count: std::thread::available_parallelism().map_or(1, |n| n.get()),
            regularization: 0.0,
            reward_model: RewardModel::default(),
            vocabulary_policy: VocabularyPolicy::default(),
            features: FeatureConfig::default(),
            stall_iterations: 3,
            line_search_retries: 2,
            line_search: LineSearchOptions::default(),
            solver: Solver::default(),
            verbose: false,
        }
    }
}
