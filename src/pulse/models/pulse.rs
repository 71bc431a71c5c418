//! PulseModel — event log plus quasi-Newton reward-model fitting.
//!
//! Purpose
//! -------
//! Own everything one episode stream needs: the append-only [`EventLog`],
//! the [`FeatureMapper`] and its vocabulary, the current parameter vector,
//! the worker pool and a logger. The control flow is
//! `new → append… → fit → (predict…) → clear → append… → fit …`.
//!
//! Key behaviors
//! -------------
//! - [`PulseModel::append`] validates the reward and ids before anything is
//!   stored, so a failed append leaves the log and vocabulary unchanged.
//! - [`PulseModel::fit`] materializes the design matrix, starts from the
//!   stored parameters (warm start) or zeros, and runs the configured solver.
//! - [`PulseModel::predict`] scores a hypothetical next step, using the tail
//!   of the log as lag context.
//!
//! Invariants & assumptions
//! ------------------------
//! - Stored parameters are always finite.
//! - The vocabulary survives [`PulseModel::clear`]; the feature dimension
//!   only grows.
//! - After a diverged fit the parameters hold the last finite iterate and no
//!   [`FitReport`] is recorded.
//!
//! Conventions
//! -----------
//! - Methods take `&mut self` for mutation; use
//!   [`SharedPulseModel`](super::shared::SharedPulseModel) to share a model
//!   across threads.
//! - With `verbose = true` the model logs to stderr through an asynchronous
//!   `slog` terminal drain; otherwise records are discarded unless a logger
//!   is installed with [`PulseModel::with_logger`].
use super::report::FitReport;
use crate::{
    optimization::quasi_newton::{
        GradientCheck, TerminalState, minimize,
        observer::{discard_logger, term_logger},
    },
    pulse::{
        core::{
            event::Event,
            event_log::EventLog,
            features::FeatureMapper,
            options::PulseOptions,
            validation::{validate_dimension, validate_parameters},
            vocabulary::Vocabulary,
        },
        errors::{PulseError, PulseResult},
        objective::{design::DesignMatrix, evaluator::ObjectiveEvaluator},
    },
};
use ndarray::Array1;
use rayon::{ThreadPool, ThreadPoolBuilder};
use slog::{Level, Logger, debug};
use std::{fmt, sync::Arc};

/// Append-only event log with a fitted linear reward model.
pub struct PulseModel {
    options: PulseOptions,
    log: EventLog,
    mapper: FeatureMapper,
    parameters: Option<Array1<f64>>,
    pool: Option<Arc<ThreadPool>>,
    logger: Logger,
    last_report: Option<FitReport>,
}

impl PulseModel {
    /// Model with an empty vocabulary under `options.vocabulary_policy`.
    ///
    /// # Errors
    /// - [`PulseError::InvalidOption`] if any option is out of range.
    /// - [`PulseError::WorkerPool`] if the thread pool cannot be built.
    pub fn new(options: PulseOptions) -> PulseResult<Self> {
        let vocabulary = Vocabulary::new(options.vocabulary_policy);
        Self::with_vocabulary(options, vocabulary)
    }

    /// Model over a caller-supplied vocabulary, typically
    /// [`Vocabulary::closed`]. The vocabulary's own policy takes precedence
    /// over `options.vocabulary_policy`.
    ///
    /// # Errors
    /// - Same as [`PulseModel::new`].
    pub fn with_vocabulary(options: PulseOptions, vocabulary: Vocabulary) -> PulseResult<Self> {
        options.validate()?;
        let pool = if options.worker_count > 1 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(options.worker_count)
                .thread_name(|i| format!("pulse-worker-{i}"))
                .build()
                .map_err(|e| PulseError::WorkerPool { text: e.to_string() })?;
            Some(Arc::new(pool))
        } else {
            None
        };
        let logger = if options.verbose { term_logger(Level::Debug) } else { discard_logger() };
        let mapper = FeatureMapper::new(options.features, vocabulary);
        Ok(Self {
            options,
            log: EventLog::new(),
            mapper,
            parameters: None,
            pool,
            logger,
            last_report: None,
        })
    }

    /// Replace the logger used for fit and optimizer records.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Discard every event. Parameters, vocabulary and the last report are
    /// kept. Never fails.
    pub fn clear(&mut self) {
        self.log.clear();
    }

    /// Append one `(action, observation, reward)` step.
    ///
    /// # Errors
    /// - [`PulseError::InvalidReward`] for a non-finite reward, or a reward
    ///   outside `[0, 1]` under the Bernoulli model.
    /// - [`PulseError::InvalidCategory`] for an unknown id under a closed
    ///   vocabulary.
    ///
    /// On error nothing is appended or registered.
    pub fn append(&mut self, action: i64, observation: i64, reward: f64) -> PulseResult<()> {
        self.options.reward_model.validate_reward(reward)?;
        let event = Event::new(action, observation, reward)?;
        self.mapper.register(action, observation)?;
        self.log.push(event);
        Ok(())
    }

    /// Fit the reward model to the current log.
    ///
    /// Steps
    /// -----
    /// 1. Reject an empty log.
    /// 2. Take the stored parameters as the start point (zeros if none) and
    ///    check their length against the current feature dimension.
    /// 3. Build the design matrix and evaluator (parallel over the pool).
    /// 4. Run the configured solver.
    /// 5. Store the result: on success the fitted parameters and report; on
    ///    divergence only the last finite iterate.
    ///
    /// # Errors
    /// - [`PulseError::EmptyLog`] if no events were appended since the last
    ///   [`clear`](PulseModel::clear).
    /// - [`PulseError::DimensionMismatch`] if stored parameters were sized for
    ///   a different feature dimension.
    /// - [`PulseError::OptimizationDiverged`] if the optimizer left the finite
    ///   domain or exhausted its line-search retries.
    /// - [`PulseError::OptimizationFailed`] for other solver failures.
    pub fn fit(&mut self) -> PulseResult<FitReport> {
        if self.log.is_empty() {
            return Err(PulseError::EmptyLog);
        }
        let dim = self.feature_dimension();
        let theta0 = match &self.parameters {
            Some(theta) => {
                validate_dimension(dim, theta.len())?;
                theta.clone()
            }
            None => Array1::zeros(dim),
        };
        let qn_opts = self.options.to_quasi_newton()?;
        let evaluator = self.evaluator()?;
        debug!(self.logger, "pulse fit";
            "events" => self.log.len(),
            "dimension" => dim,
            "workers" => evaluator.worker_count(),
            "reward_model" => %self.options.reward_model
        );

        let outcome = minimize(&evaluator, theta0, &qn_opts, &self.logger)?;
        if outcome.terminal == TerminalState::Diverged {
            let err = PulseError::OptimizationDiverged {
                iterations: outcome.iterations,
                loss: outcome.value,
                reason: outcome.status.clone(),
            };
            self.parameters = Some(outcome.theta_hat);
            return Err(err);
        }

        let report = FitReport::from(outcome);
        self.parameters = Some(report.parameters.clone());
        self.last_report = Some(report.clone());
        Ok(report)
    }

    /// Expected reward of `(action, observation)` as the next step of the
    /// current episode.
    ///
    /// # Errors
    /// - [`PulseError::NotFitted`] if no parameters are available.
    /// - [`PulseError::InvalidCategory`] for ids never appended.
    /// - [`PulseError::DimensionMismatch`] if the vocabulary grew since the
    ///   parameters were produced.
    pub fn predict(&self, action: i64, observation: i64) -> PulseResult<f64> {
        let theta = self.parameters.as_ref().ok_or(PulseError::NotFitted)?;
        let context = self.log.tail(self.mapper.config().horizon);
        let x = self.mapper.map_after(context, action, observation)?;
        validate_dimension(x.len(), theta.len())?;
        Ok(self.options.reward_model.predict(x.dot(theta)))
    }

    /// Evaluator over the current log, sharing the model's worker pool.
    ///
    /// # Errors
    /// - [`PulseError::InvalidCategory`] if the log references unknown ids
    ///   (cannot happen for events appended through the model).
    pub fn evaluator(&self) -> PulseResult<ObjectiveEvaluator> {
        let design = DesignMatrix::build(&self.mapper, self.log.as_slice())?;
        Ok(ObjectiveEvaluator::new(design, self.options.reward_model, self.options.regularization)?
            .with_pool(self.pool.clone()))
    }

    /// Analytic vs finite-difference gradient of the current objective at
    /// `theta`.
    ///
    /// # Errors
    /// - `EmptyLog`, `DimensionMismatch`, `InvalidParameters`.
    pub fn check_derivatives(&self, theta: &Array1<f64>) -> PulseResult<GradientCheck> {
        self.evaluator()?.check_derivatives(theta)
    }

    /// Install a warm start. Any length is accepted here; it is checked
    /// against the feature dimension at [`fit`](PulseModel::fit).
    ///
    /// # Errors
    /// - [`PulseError::InvalidParameters`] if an entry is non-finite.
    pub fn set_parameters(&mut self, theta: Array1<f64>) -> PulseResult<()> {
        validate_parameters(theta.view())?;
        self.parameters = Some(theta);
        Ok(())
    }

    /// Drop the stored parameters so the next fit starts from zeros.
    pub fn reset_parameters(&mut self) {
        self.parameters = None;
    }

    pub fn parameters(&self) -> Option<&Array1<f64>> {
        self.parameters.as_ref()
    }

    pub fn last_report(&self) -> Option<&FitReport> {
        self.last_report.as_ref()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn events(&self) -> &EventLog {
        &self.log
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        self.mapper.vocabulary()
    }

    /// Current feature dimension `D`.
    pub fn feature_dimension(&self) -> usize {
        self.mapper.dimension()
    }

    pub fn options(&self) -> &PulseOptions {
        &self.options
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }
}

impl fmt::Debug for PulseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PulseModel")
            .field("options", &self.options)
            .field("events", &self.log.len())
            .field("dimension", &self.feature_dimension())
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::{
        core::{features::FeatureConfig, reward_model::RewardModel},
        errors::CategoryKind,
    };
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Append/clear bookkeeping and atomic rejection of bad events.
    // - Fit preconditions (empty log, parameter dimension).
    // - Small fits with known answers, warm starts, and divergence handling.
    // - Fits whose loss is far above the squared gradient norm.
    // - Prediction before and after fitting.
    //
    // Longer simulated episodes live in `tests/integration_pulse_pipeline.rs`.
    // -------------------------------------------------------------------------

    fn opts() -> PulseOptions {
        PulseOptions::default().with_worker_count(1).unwrap()
    }

    fn bias_only(model: RewardModel) -> PulseOptions {
        opts()
            .with_features(FeatureConfig::new(true, false, false, false, 0).unwrap())
            .unwrap()
            .with_reward_model(model)
    }

    #[test]
    // Purpose
    // -------
    // `len` counts successful appends since the last `clear`.
    //
    // Given
    // -----
    // - Three valid appends, one NaN reward, `clear`, one valid append.
    //
    // Expect
    // ------
    // - Lengths 3, 3, 0, 1; the vocabulary is kept across `clear`.
    fn len_counts_successful_appends() {
        // Arrange
        let mut model = PulseModel::new(opts()).unwrap();

        // Act
        model.append(0, 0, 1.0).unwrap();
        model.append(1, 0, 0.0).unwrap();
        model.append(0, 2, 0.5).unwrap();
        let after_three = model.len();
        let rejected = model.append(5, 5, f64::NAN);
        let after_reject = model.len();
        model.clear();
        let after_clear = model.len();
        model.append(1, 2, 0.0).unwrap();

        // Assert
        assert_eq!((after_three, after_reject, after_clear, model.len()), (3, 3, 0, 1));
        assert!(matches!(rejected, Err(PulseError::InvalidReward { .. })));
        assert_eq!(model.vocabulary().num_actions(), 2);
        assert_eq!(model.feature_dimension(), 1 + 2 + 2);
    }

    #[test]
    // Purpose
    // -------
    // Closed vocabularies and the Bernoulli range reject events atomically.
    //
    // Given
    // -----
    // - Closed vocabulary {0, 1} × {0}; Bernoulli rewards.
    //
    // Expect
    // ------
    // - Unknown ids → `InvalidCategory`, reward 1.5 → `InvalidReward`,
    //   log and vocabulary unchanged.
    fn invalid_events_leave_model_unchanged() {
        // Arrange
        let options = opts().with_reward_model(RewardModel::Bernoulli);
        let vocabulary = Vocabulary::closed([0, 1], [0]);
        let mut model = PulseModel::with_vocabulary(options, vocabulary).unwrap();
        model.append(0, 0, 1.0).unwrap();

        // Act
        let bad_obs = model.append(1, 9, 0.0);
        let bad_reward = model.append(1, 0, 1.5);

        // Assert
        assert_eq!(
            bad_obs,
            Err(PulseError::InvalidCategory { kind: CategoryKind::Observation, id: 9 })
        );
        assert!(matches!(bad_reward, Err(PulseError::InvalidReward { value, .. }) if value == 1.5));
        assert_eq!(model.len(), 1);
        assert_eq!(model.vocabulary().num_observations(), 1);
    }

    #[test]
    // Purpose
    // -------
    // Fitting needs events and correctly sized parameters.
    //
    // Given
    // -----
    // - A fresh model; then a 2×2 vocabulary (D = 5) with a 3-long warm start.
    //
    // Expect
    // ------
    // - `EmptyLog`, then `DimensionMismatch { expected: 5, found: 3 }`;
    //   `clear` followed by `fit` is `EmptyLog` again.
    fn fit_checks_preconditions() {
        // Arrange
        let mut model = PulseModel::new(opts()).unwrap();
        let empty = model.fit();
        for (a, o) in [(0, 0), (1, 1)] {
            model.append(a, o, 1.0).unwrap();
        }
        model.set_parameters(array![0.0, 0.0, 0.0]).unwrap();

        // Act
        let mismatch = model.fit();
        model.clear();
        let after_clear = model.fit();

        // Assert
        assert_eq!(empty.unwrap_err(), PulseError::EmptyLog);
        assert_eq!(
            mismatch.unwrap_err(),
            PulseError::DimensionMismatch { expected: 5, found: 3 }
        );
        assert_eq!(after_clear.unwrap_err(), PulseError::EmptyLog);
    }

    #[test]
    // Purpose
    // -------
    // Two events with identical features and rewards 0 and 1 fit to a
    // prediction strictly between 0 and 1 under both reward families.
    //
    // Given
    // -----
    // - Bias-only features (D = 1), rewards 0 and 1.
    //
    // Expect
    // ------
    // - `Converged`, prediction 0.5 (within 1e-6).
    fn two_conflicting_events_predict_the_midpoint() {
        for reward_model in [RewardModel::Gaussian, RewardModel::Bernoulli] {
            // Arrange
            let mut model = PulseModel::new(bias_only(reward_model)).unwrap();
            model.append(3, 4, 0.0).unwrap();
            model.append(3, 4, 1.0).unwrap();

            // Act
            let report = model.fit().unwrap();
            let p = model.predict(3, 4).unwrap();

            // Assert
            assert_eq!(model.feature_dimension(), 1);
            assert_eq!(report.terminal, TerminalState::Converged);
            assert!(p > 0.0 && p < 1.0);
            assert!((p - 0.5).abs() < 1e-6, "{reward_model}: {p}");
            assert_eq!(model.last_report(), Some(&report));
        }
    }

    #[test]
    // Purpose
    // -------
    // Prediction requires parameters.
    //
    // Given
    // -----
    // - A model with events but no fit.
    //
    // Expect
    // ------
    // - `NotFitted`; after `set_parameters` the prediction is `θ·x`.
    fn predict_requires_parameters() {
        // Arrange
        let mut model = PulseModel::new(opts()).unwrap();
        model.append(0, 0, 1.0).unwrap();

        // Act
        let before = model.predict(0, 0);
        model.set_parameters(array![0.5, 0.25, 0.125]).unwrap();
        let after = model.predict(0, 0);

        // Assert
        assert_eq!(before, Err(PulseError::NotFitted));
        assert_eq!(after, Ok(0.875));
        assert!(matches!(
            model.set_parameters(array![f64::INFINITY]),
            Err(PulseError::InvalidParameters { index: 0, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Repeated fits agree and the loss trace never increases.
    //
    // Given
    // -----
    // - Interaction-only features on a 2×2 vocabulary (one cell per slot),
    //   40 events with cell-dependent rewards.
    //
    // Expect
    // ------
    // - Both fits `Converged`; θ equals the per-cell mean reward within 1e-6;
    //   a reset refit is bit-identical; the loss trace is non-increasing.
    fn repeated_fits_agree() {
        // Arrange
        let options = opts()
            .with_features(FeatureConfig::new(false, false, false, true, 0).unwrap())
            .unwrap();
        let mut model = PulseModel::new(options).unwrap();
        for i in 0..40_i64 {
            let (a, o) = (i % 2, (i / 2) % 2);
            model.append(a, o, (2 * a + o) as f64 + 0.1 * ((i % 3) as f64)).unwrap();
        }

        // Act
        let first = model.fit().unwrap();
        let warm = model.fit().unwrap();
        model.reset_parameters();
        let cold = model.fit().unwrap();

        // Assert
        assert_eq!(first.terminal, TerminalState::Converged);
        assert_eq!(warm.terminal, TerminalState::Converged);
        assert_eq!(cold.parameters, first.parameters);
        assert!(first.loss_trace.windows(2).all(|w| w[1] <= w[0]));
        for (got, want) in warm.parameters.iter().zip(first.parameters.iter()) {
            assert!((got - want).abs() < 1e-6);
        }
        let cell_mean = |a: i64, o: i64| {
            let rewards: Vec<f64> = model
                .events()
                .iter()
                .filter(|e| e.action == a && e.observation == o)
                .map(|e| e.reward)
                .collect();
            rewards.iter().sum::<f64>() / rewards.len() as f64
        };
        assert!((model.predict(1, 0).unwrap() - cell_mean(1, 0)).abs() < 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // Rewards of order 1e20 are fitted, not reported converged while the
    // predictions are still near zero.
    //
    // Given
    // -----
    // - Default features, events (0,0), (1,1), (0,1) with rewards
    //   `[1, −1, 0.3] · 1e20` (the rows are linearly independent, so the
    //   fit can interpolate).
    //
    // Expect
    // ------
    // - `Converged`, and every prediction within 1e-4 of its reward
    //   relative to the 1e20 scale.
    fn large_reward_scale_is_fitted() {
        // Arrange
        let scale = 1e20;
        let cells = [(0, 0, 1.0), (1, 1, -1.0), (0, 1, 0.3)];
        let mut model = PulseModel::new(opts()).unwrap();
        for &(a, o, r) in &cells {
            model.append(a, o, r * scale).unwrap();
        }

        // Act
        let report = model.fit().unwrap();

        // Assert
        assert!(report.converged(), "{:?}: {}", report.terminal, report.status);
        for &(a, o, r) in &cells {
            let residual = model.predict(a, o).unwrap() / scale - r;
            assert!(residual.abs() < 1e-4, "cell ({a}, {o}): residual {residual}");
        }
    }

    #[test]
    // Purpose
    // -------
    // A non-finite starting loss surfaces as `OptimizationDiverged` and the
    // start point is kept.
    //
    // Given
    // -----
    // - Gaussian rewards of 1e200 (squared error overflows to +∞).
    //
    // Expect
    // ------
    // - `OptimizationDiverged { iterations: 0, .. }`, parameters all zero,
    //   no report recorded.
    fn overflowing_loss_diverges() {
        // Arrange
        let mut model = PulseModel::new(opts()).unwrap();
        model.append(0, 0, 1e200).unwrap();
        model.append(1, 0, -1e200).unwrap();

        // Act
        let err = model.fit().unwrap_err();

        // Assert
        assert!(matches!(err, PulseError::OptimizationDiverged { iterations: 0, .. }));
        assert_eq!(model.parameters(), Some(&Array1::zeros(4)));
        assert!(model.last_report().is_none());
    }

    #[test]
    // Purpose
    // -------
    // The model-level derivative check agrees with the analytic gradient.
    //
    // Given
    // -----
    // - A Bernoulli model with lags and a few events, θ = 0.1.
    //
    // Expect
    // ------
    // - Max absolute error below 1e-6.
    fn check_derivatives_agrees() {
        // Arrange
        let options = opts()
            .with_reward_model(RewardModel::Bernoulli)
            .with_features(FeatureConfig { horizon: 2, ..FeatureConfig::default() })
            .unwrap()
            .with_regularization(0.5)
            .unwrap();
        let mut model = PulseModel::new(options).unwrap();
        for i in 0..12_i64 {
            model.append(i % 3, (i * 2) % 5, f64::from(u8::from(i % 4 == 0))).unwrap();
        }
        let theta = Array1::from_elem(model.feature_dimension(), 0.1);

        // Act
        let check = model.check_derivatives(&theta).unwrap();

        // Assert
        assert!(check.max_abs_error < 1e-6, "{}", check.max_abs_error);
    }
}
