//! Feature mapping — `(action, observation)` plus lag context → dense vector.
//!
//! Purpose
//! -------
//! Turn events into fixed-length design rows for the linear reward model.
//! The layout is fully determined by a [`FeatureConfig`] and the current
//! [`Vocabulary`].
//!
//! Key behaviors
//! -------------
//! - Blocks, in order (each present only when enabled):
//!   1. bias (1 slot),
//!   2. action one-hot (`|A|` slots),
//!   3. observation one-hot (`|O|` slots),
//!   4. action × observation interaction one-hot (`|A|·|O|` slots,
//!      row-major in action index),
//!   5. for each lag `k = 1..=horizon`: action one-hot (when `actions`)
//!      then observation one-hot (when `observations`) of the event `k`
//!      steps earlier; zeros when that event precedes the start of the log.
//! - Feature dimension:
//!   `D = bias + |A|·actions + |O|·observations + |A|·|O|·interactions
//!        + horizon·(|A|·actions + |O|·observations)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Mapping never registers ids; unknown ids fail with
//!   [`PulseError::InvalidCategory`]. Registration happens once, at append.
//! - `D` grows whenever the vocabulary grows, so parameter vectors are tied
//!   to the vocabulary size at the time they were produced.
//!
//! Conventions
//! -----------
//! - Rows are written in place into caller-provided `ArrayViewMut1` buffers
//!   so the design matrix can be filled without per-row allocation.
use super::{event::Event, vocabulary::Vocabulary};
use crate::pulse::errors::{PulseError, PulseResult};
use ndarray::{Array1, ArrayViewMut1};

/// Which feature blocks are emitted.
///
/// Defaults: bias, action and observation one-hots, no interactions, no lags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureConfig {
    pub bias: bool,
    pub actions: bool,
    pub observations: bool,
    pub interactions: bool,
    /// Number of preceding events whose one-hots are appended as lag blocks.
    pub horizon: usize,
}

impl FeatureConfig {
    /// Create a validated feature configuration.
    ///
    /// # Errors
    /// - [`PulseError::InvalidOption`] if no block is enabled (the dimension
    ///   would be zero for every vocabulary), or if `horizon > 0` with both
    ///   `actions` and `observations` disabled (the lag blocks would be empty).
    pub fn new(
        bias: bool, actions: bool, observations: bool, interactions: bool, horizon: usize,
    ) -> PulseResult<Self> {
        let config = Self { bias, actions, observations, interactions, horizon };
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> PulseResult<()> {
        if !(self.bias || self.actions || self.observations || self.interactions) {
            return Err(PulseError::InvalidOption {
                name: "features",
                reason: "at least one feature block must be enabled".to_string(),
            });
        }
        if self.horizon > 0 && !(self.actions || self.observations) {
            return Err(PulseError::InvalidOption {
                name: "features",
                reason: "lag blocks need action or observation one-hots".to_string(),
            });
        }
        Ok(())
    }

    /// Feature dimension for `num_actions` / `num_observations` categories.
    pub fn dimension(&self, num_actions: usize, num_observations: usize) -> usize {
        usize::from(self.bias)
            + self.width(num_actions, num_observations)
            + if self.interactions { num_actions * num_observations } else { 0 }
            + self.horizon * self.width(num_actions, num_observations)
    }

    /// Width of one action + observation one-hot group.
    fn width(&self, num_actions: usize, num_observations: usize) -> usize {
        (if self.actions { num_actions } else { 0 })
            + if self.observations { num_observations } else { 0 }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self { bias: true, actions: true, observations: true, interactions: false, horizon: 0 }
    }
}

/// Feature map bound to a vocabulary.
///
/// Owns the [`Vocabulary`]; registration goes through
/// [`FeatureMapper::register`] so the dimension always reflects what was
/// appended.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMapper {
    config: FeatureConfig,
    vocabulary: Vocabulary,
}

impl FeatureMapper {
    pub fn new(config: FeatureConfig, vocabulary: Vocabulary) -> Self {
        Self { config, vocabulary }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Current feature dimension `D`.
    pub fn dimension(&self) -> usize {
        self.config.dimension(self.vocabulary.num_actions(), self.vocabulary.num_observations())
    }

    /// Validate or register ids, see [`Vocabulary::register`].
    pub fn register(&mut self, action: i64, observation: i64) -> PulseResult<()> {
        self.vocabulary.register(action, observation).map(|_| ())
    }

    /// Features of `(action, observation)` with no preceding context.
    ///
    /// # Errors
    /// - [`PulseError::InvalidCategory`] for unknown ids.
    pub fn map(&self, action: i64, observation: i64) -> PulseResult<Array1<f64>> {
        self.map_after(&[], action, observation)
    }

    /// Features of `(action, observation)` as if it followed `history`.
    ///
    /// Used for prediction: `history` is the tail of the current log.
    pub fn map_after(
        &self, history: &[Event], action: i64, observation: i64,
    ) -> PulseResult<Array1<f64>> {
        let mut row = Array1::zeros(self.dimension());
        self.fill(history, action, observation, row.view_mut())?;
        Ok(row)
    }

    /// Write the features of `events[t]` into `row`, lag blocks filled from
    /// `events[t-1]`, `events[t-2]`, …
    ///
    /// # Errors
    /// - [`PulseError::DimensionMismatch`] if `row.len() != D`.
    /// - [`PulseError::InvalidCategory`] for unknown ids.
    /// - [`PulseError::EventOutOfRange`] if `t >= events.len()`.
    pub fn map_event_into(
        &self, events: &[Event], t: usize, row: ArrayViewMut1<'_, f64>,
    ) -> PulseResult<()> {
        let current =
            events.get(t).ok_or(PulseError::EventOutOfRange { index: t, len: events.len() })?;
        self.fill(&events[..t], current.action, current.observation, row)
    }

    fn fill(
        &self, history: &[Event], action: i64, observation: i64, mut row: ArrayViewMut1<'_, f64>,
    ) -> PulseResult<()> {
        let dim = self.dimension();
        if row.len() != dim {
            return Err(PulseError::DimensionMismatch { expected: dim, found: row.len() });
        }
        row.fill(0.0);

        let n_a = self.vocabulary.num_actions();
        let n_o = self.vocabulary.num_observations();
        let a = self.vocabulary.action_index(action)?;
        let o = self.vocabulary.observation_index(observation)?;
        let cfg = &self.config;

        let mut offset = 0;
        if cfg.bias {
            row[0] = 1.0;
            offset = 1;
        }
        offset = self.write_group(&mut row, offset, a, o);
        if cfg.interactions {
            row[offset + a * n_o + o] = 1.0;
            offset += n_a * n_o;
        }

        let group = cfg.width(n_a, n_o);
        for k in 1..=cfg.horizon {
            if let Some(prev) = history.len().checked_sub(k).map(|i| &history[i]) {
                let pa = self.vocabulary.action_index(prev.action)?;
                let po = self.vocabulary.observation_index(prev.observation)?;
                self.write_group(&mut row, offset, pa, po);
            }
            offset += group;
        }
        Ok(())
    }

    /// One-hot action then observation starting at `offset`; returns the
    /// offset past the group.
    fn write_group(
        &self, row: &mut ArrayViewMut1<'_, f64>, mut offset: usize, a: usize, o: usize,
    ) -> usize {
        if self.config.actions {
            row[offset + a] = 1.0;
            offset += self.vocabulary.num_actions();
        }
        if self.config.observations {
            row[offset + o] = 1.0;
            offset += self.vocabulary.num_observations();
        }
        offset
    }
}
