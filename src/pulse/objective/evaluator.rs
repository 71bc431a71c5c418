//! ObjectiveEvaluator — penalized loss and gradient over a design matrix.
//!
//! Purpose
//! -------
//! Evaluate
//!
//! ```text
//! loss(θ)     = Σ_i ℓ(θ·x_i, r_i) + ½ λ ‖θ‖²
//! gradient(θ) = Σ_i x_i ∂ℓ/∂z(θ·x_i, r_i) + λ θ
//! ```
//!
//! for the configured [`RewardModel`], and expose it to the optimizer through
//! the [`Objective`] trait.
//!
//! Key behaviors
//! -------------
//! - Rows are processed in fixed blocks (see [`reduction`](super::reduction)).
//!   With a worker pool the blocks run in parallel via `rayon`; without one
//!   they run sequentially. Both paths produce bit-identical results.
//! - A non-finite loss is returned as a value, not an error, so the line
//!   search can treat it as an overshoot.
//!
//! Invariants & assumptions
//! ------------------------
//! - `θ.len()` must equal the design dimension and every entry must be
//!   finite; violations are reported as [`PulseError::DimensionMismatch`] /
//!   [`PulseError::InvalidParameters`].
//! - An evaluator over zero events fails every evaluation with
//!   [`PulseError::EmptyLog`].
//!
//! Downstream usage
//! ----------------
//! - `PulseModel::fit` hands an evaluator to
//!   [`minimize`](crate::optimization::quasi_newton::minimize);
//!   `PulseModel::evaluator` returns one for inspection.
use super::{
    design::DesignMatrix,
    reduction::{BlockPartial, NeumaierSum, block_count, block_range, pairwise_combine},
};
use crate::{
    optimization::{
        errors::OptResult,
        quasi_newton::{Cost, Grad, GradientCheck, Objective, Theta, check_gradient},
    },
    pulse::{
        core::{
            reward_model::RewardModel,
            validation::{validate_dimension, validate_parameters, validate_regularization},
        },
        errors::{PulseError, PulseResult},
    },
};
use ndarray::{Array1, s};
use rayon::{ThreadPool, prelude::*};
use std::sync::Arc;

/// Penalized loss/gradient over a fixed set of events.
#[derive(Debug, Clone)]
pub struct ObjectiveEvaluator {
    design: DesignMatrix,
    reward_model: RewardModel,
    regularization: f64,
    pool: Option<Arc<ThreadPool>>,
}

impl ObjectiveEvaluator {
    /// Sequential evaluator.
    ///
    /// # Errors
    /// - [`PulseError::InvalidOption`] if `regularization` is negative or
    ///   non-finite.
    pub fn new(
        design: DesignMatrix, reward_model: RewardModel, regularization: f64,
    ) -> PulseResult<Self> {
        validate_regularization(regularization)?;
        Ok(Self { design, reward_model, regularization, pool: None })
    }

    /// Run blocks on `pool` instead of the calling thread.
    pub fn with_pool(mut self, pool: Option<Arc<ThreadPool>>) -> Self {
        self.pool = pool;
        self
    }

    pub fn design(&self) -> &DesignMatrix {
        &self.design
    }

    pub fn reward_model(&self) -> RewardModel {
        self.reward_model
    }

    pub fn regularization(&self) -> f64 {
        self.regularization
    }

    pub fn n_events(&self) -> usize {
        self.design.n_events()
    }

    /// Feature dimension `D`.
    pub fn dimension(&self) -> usize {
        self.design.dimension()
    }

    /// Number of threads evaluating blocks (1 without a pool).
    pub fn worker_count(&self) -> usize {
        self.pool.as_ref().map_or(1, |p| p.current_num_threads())
    }

    /// Penalized loss at `theta`.
    ///
    /// # Errors
    /// - `EmptyLog`, `DimensionMismatch`, `InvalidParameters`.
    pub fn loss(&self, theta: &Array1<f64>) -> PulseResult<f64> {
        Ok(self.reduce(theta, false)?.loss)
    }

    /// Gradient of the penalized loss at `theta`.
    ///
    /// # Errors
    /// - `EmptyLog`, `DimensionMismatch`, `InvalidParameters`.
    pub fn gradient(&self, theta: &Array1<f64>) -> PulseResult<Array1<f64>> {
        Ok(self.loss_and_gradient(theta)?.1)
    }

    /// Loss and gradient from a single pass over the rows.
    ///
    /// # Errors
    /// - `EmptyLog`, `DimensionMismatch`, `InvalidParameters`.
    pub fn loss_and_gradient(&self, theta: &Array1<f64>) -> PulseResult<(f64, Array1<f64>)> {
        let total = self.reduce(theta, true)?;
        let grad = total.grad.unwrap_or_else(|| Array1::zeros(theta.len()));
        Ok((total.loss, grad))
    }

    /// Compare the analytic gradient at `theta` with central finite
    /// differences.
    ///
    /// # Errors
    /// - Any evaluation error at `theta` or at a perturbed point.
    pub fn check_derivatives(&self, theta: &Array1<f64>) -> PulseResult<GradientCheck> {
        Ok(check_gradient(self, theta)?)
    }

    fn reduce(&self, theta: &Array1<f64>, want_grad: bool) -> PulseResult<BlockPartial> {
        validate_dimension(self.dimension(), theta.len())?;
        validate_parameters(theta.view())?;
        let n = self.n_events();
        if n == 0 {
            return Err(PulseError::EmptyLog);
        }

        let run = |b: usize| self.block(b, theta, want_grad);
        let partials: Vec<BlockPartial> = match &self.pool {
            Some(pool) => pool.install(|| (0..block_count(n)).into_par_iter().map(run).collect()),
            None => (0..block_count(n)).map(run).collect(),
        };
        let mut total = pairwise_combine(partials).ok_or(PulseError::EmptyLog)?;

        if self.regularization > 0.0 {
            total.loss += 0.5 * self.regularization * theta.dot(theta);
            if let Some(g) = total.grad.as_mut() {
                g.scaled_add(self.regularization, theta);
            }
        }
        Ok(total)
    }

    fn block(&self, b: usize, theta: &Array1<f64>, want_grad: bool) -> BlockPartial {
        let range = block_range(b, self.n_events());
        let rows = self.design.features().slice(s![range.clone(), ..]);
        let rewards = self.design.rewards().slice(s![range]);

        let mut loss = NeumaierSum::new();
        let mut grad = want_grad.then(|| Array1::zeros(theta.len()));
        for (x, &r) in rows.rows().into_iter().zip(rewards.iter()) {
            let z = x.dot(theta);
            loss.add(self.reward_model.loss(z, r));
            if let Some(g) = grad.as_mut() {
                g.scaled_add(self.reward_model.dloss(z, r), &x);
            }
        }
        BlockPartial { loss: loss.value(), grad }
    }
}

impl Objective for ObjectiveEvaluator {
    fn dimension(&self) -> usize {
        self.design.dimension()
    }

    fn loss(&self, theta: &Theta) -> OptResult<Cost> {
        Ok(self.reduce(theta, false)?.loss)
    }

    fn gradient(&self, theta: &Theta) -> OptResult<Grad> {
        Ok(ObjectiveEvaluator::gradient(self, theta)?)
    }

    fn loss_and_gradient(&self, theta: &Theta) -> OptResult<(Cost, Grad)> {
        Ok(ObjectiveEvaluator::loss_and_gradient(self, theta)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        optimization::errors::OptError,
        pulse::core::{
            event::Event,
            features::{FeatureConfig, FeatureMapper},
            vocabulary::Vocabulary,
        },
    };
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Closed-form values on a bias-only design.
    // - Analytic vs finite-difference gradients for both reward families.
    // - Bit-identical results across worker counts.
    // - Error reporting for empty logs and malformed parameter vectors, both
    //   directly and through the `Objective` trait.
    // -------------------------------------------------------------------------

    fn synthetic_events(n: usize, bernoulli: bool) -> Vec<Event> {
        (0..n)
            .map(|i| {
                let action = (i * 7 % 3) as i64;
                let observation = (i * 5 % 4) as i64;
                let raw = ((i * 37 % 101) as f64) / 100.0;
                let reward = if bernoulli { f64::from(u8::from(raw > 0.6)) } else { raw - 0.3 };
                Event { action, observation, reward }
            })
            .collect()
    }

    fn evaluator(n: usize, model: RewardModel, lambda: f64) -> ObjectiveEvaluator {
        let mapper = FeatureMapper::new(
            FeatureConfig { interactions: true, horizon: 1, ..FeatureConfig::default() },
            Vocabulary::closed(0..3, 0..4),
        );
        let events = synthetic_events(n, model == RewardModel::Bernoulli);
        let design = DesignMatrix::build(&mapper, &events).unwrap();
        ObjectiveEvaluator::new(design, model, lambda).unwrap()
    }

    fn sample_theta(d: usize) -> Array1<f64> {
        Array1::from_iter((0..d).map(|j| 0.1 * ((j % 5) as f64) - 0.2))
    }

    #[test]
    // Purpose
    // -------
    // Loss and gradient match closed forms on a bias-only design.
    //
    // Given
    // -----
    // - One column of ones, rewards 0 and 1, Gaussian, λ = 0.
    //
    // Expect
    // ------
    // - At θ = 0.5: loss 0.25, gradient 0. At θ = 0: loss 0.5, gradient -1.
    fn bias_only_design_matches_closed_form() {
        // Arrange
        let design = DesignMatrix::from_parts(array![[1.0], [1.0]], array![0.0, 1.0]).unwrap();
        let eval = ObjectiveEvaluator::new(design, RewardModel::Gaussian, 0.0).unwrap();

        // Act
        let (l_mid, g_mid) = eval.loss_and_gradient(&array![0.5]).unwrap();
        let (l_zero, g_zero) = eval.loss_and_gradient(&array![0.0]).unwrap();

        // Assert
        assert_eq!(l_mid, 0.25);
        assert_eq!(g_mid, array![0.0]);
        assert_eq!(l_zero, 0.5);
        assert_eq!(g_zero, array![-1.0]);
    }

    #[test]
    // Purpose
    // -------
    // Analytic gradients agree with central differences.
    //
    // Given
    // -----
    // - 300 synthetic events with interactions and one lag, λ = 0.1,
    //   both reward families.
    //
    // Expect
    // ------
    // - Max relative error below 1e-4.
    fn gradient_matches_finite_differences() {
        for model in [RewardModel::Gaussian, RewardModel::Bernoulli] {
            // Arrange
            let eval = evaluator(300, model, 0.1);
            let theta = sample_theta(eval.dimension());

            // Act
            let check = eval.check_derivatives(&theta).unwrap();

            // Assert
            assert!(check.max_rel_error < 1e-4, "{model}: {}", check.max_rel_error);
        }
    }

    #[test]
    // Purpose
    // -------
    // Worker count never changes a single bit of the result.
    //
    // Given
    // -----
    // - 1000 events (4 blocks), sequential evaluator vs 3-thread pool.
    //
    // Expect
    // ------
    // - Identical loss and gradient, compared with `==`.
    fn parallel_and_sequential_results_are_identical() {
        // Arrange
        let seq = evaluator(1000, RewardModel::Bernoulli, 0.01);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(3).build().unwrap();
        let par = seq.clone().with_pool(Some(Arc::new(pool)));
        let theta = sample_theta(seq.dimension());

        // Act
        let (l_seq, g_seq) = seq.loss_and_gradient(&theta).unwrap();
        let (l_par, g_par) = par.loss_and_gradient(&theta).unwrap();

        // Assert
        assert_eq!(par.worker_count(), 3);
        assert_eq!(l_seq, l_par);
        assert_eq!(g_seq, g_par);
        assert_eq!(seq.loss(&theta).unwrap(), l_seq);
    }

    #[test]
    // Purpose
    // -------
    // Invalid inputs fail with the documented variants.
    //
    // Given
    // -----
    // - An empty design; a wrong-length θ; a θ with NaN.
    //
    // Expect
    // ------
    // - `EmptyLog`, `DimensionMismatch`, `InvalidParameters`, and the matching
    //   `OptError` variants through the `Objective` trait.
    fn invalid_inputs_are_reported() {
        // Arrange
        let empty = ObjectiveEvaluator::new(
            DesignMatrix::from_parts(ndarray::Array2::zeros((0, 2)), Array1::zeros(0)).unwrap(),
            RewardModel::Gaussian,
            0.0,
        )
        .unwrap();
        let eval = evaluator(10, RewardModel::Gaussian, 0.0);
        let d = eval.dimension();
        let mut nan = Array1::zeros(d);
        nan[1] = f64::NAN;

        // Act + Assert
        assert_eq!(empty.loss(&Array1::zeros(2)), Err(PulseError::EmptyLog));
        assert_eq!(
            eval.gradient(&Array1::zeros(3)),
            Err(PulseError::DimensionMismatch { expected: d, found: 3 })
        );
        assert!(matches!(eval.loss(&nan), Err(PulseError::InvalidParameters { index: 1, .. })));
        assert_eq!(Objective::loss(&empty, &Array1::zeros(2)), Err(OptError::EmptyObjective));
        assert_eq!(
            Objective::gradient(&eval, &Array1::zeros(3)),
            Err(OptError::ThetaLengthMismatch { expected: d, actual: 3 })
        );
    }

    #[test]
    // Purpose
    // -------
    // Negative penalty weights are rejected at construction.
    //
    // Given
    // -----
    // - λ = -0.5.
    //
    // Expect
    // ------
    // - `InvalidOption { name: "regularization" }`.
    fn negative_regularization_is_rejected() {
        let design = DesignMatrix::from_parts(array![[1.0]], array![0.0]).unwrap();
        assert!(matches!(
            ObjectiveEvaluator::new(design, RewardModel::Gaussian, -0.5),
            Err(PulseError::InvalidOption { name: "regularization", .. })
        ));
    }
}
