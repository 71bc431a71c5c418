//! Reward models — per-event loss, its derivative in the linear score, and
//! the prediction link.
//!
//! With score `z = θ·x` and observed reward `r`:
//!
//! | model       | loss `ℓ(z, r)`          | `∂ℓ/∂z`     | prediction |
//! |-------------|-------------------------|-------------|------------|
//! | `Gaussian`  | `½ (z − r)²`            | `z − r`     | `z`        |
//! | `Bernoulli` | `softplus(z) − r·z`     | `σ(z) − r`  | `σ(z)`     |
//!
//! The Bernoulli loss is the negative log-likelihood of `r ∈ [0, 1]` under a
//! logistic link and is evaluated with the guarded transforms from
//! [`numerical_stability`](crate::optimization::numerical_stability), so
//! trial points with large `|z|` stay finite.
use crate::{
    optimization::numerical_stability::{safe_logistic, safe_softplus},
    pulse::errors::{PulseError, PulseResult},
};
use std::{fmt, str::FromStr};

/// Likelihood family linking the linear score to the reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewardModel {
    /// Squared error; rewards anywhere on the real line.
    #[default]
    Gaussian,
    /// Logistic link; rewards in `[0, 1]`.
    Bernoulli,
}

impl RewardModel {
    /// Per-event loss `ℓ(z, r)`.
    #[inline]
    pub fn loss(&self, z: f64, r: f64) -> f64 {
        match self {
            RewardModel::Gaussian => {
                let e = z - r;
                0.5 * e * e
            }
            RewardModel::Bernoulli => safe_softplus(z) - r * z,
        }
    }

    /// Derivative `∂ℓ/∂z`.
    #[inline]
    pub fn dloss(&self, z: f64, r: f64) -> f64 {
        match self {
            RewardModel::Gaussian => z - r,
            RewardModel::Bernoulli => safe_logistic(z) - r,
        }
    }

    /// Expected reward at score `z`.
    #[inline]
    pub fn predict(&self, z: f64) -> f64 {
        match self {
            RewardModel::Gaussian => z,
            RewardModel::Bernoulli => safe_logistic(z),
        }
    }

    /// Check that `reward` is admissible under this model.
    ///
    /// # Errors
    /// - [`PulseError::InvalidReward`] if `reward` is non-finite, or outside
    ///   `[0, 1]` for [`RewardModel::Bernoulli`].
    pub fn validate_reward(&self, reward: f64) -> PulseResult<()> {
        if !reward.is_finite() {
            return Err(PulseError::InvalidReward { value: reward, reason: "must be finite" });
        }
        if *self == RewardModel::Bernoulli && !(0.0..=1.0).contains(&reward) {
            return Err(PulseError::InvalidReward {
                value: reward,
                reason: "must lie in [0, 1] under the Bernoulli model",
            });
        }
        Ok(())
    }
}

impl FromStr for RewardModel {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gaussian" => Ok(RewardModel::Gaussian),
            "bernoulli" => Ok(RewardModel::Bernoulli),
            _ => Err(PulseError::InvalidOption {
                name: "reward_model",
                reason: format!("unknown reward model '{s}', expected 'gaussian' or 'bernoulli'"),
            }),
        }
    }
}

impl fmt::Display for RewardModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewardModel::Gaussian => write!(f, "gaussian"),
            RewardModel::Bernoulli => write!(f, "bernoulli"),
        }
    }
}
