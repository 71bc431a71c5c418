//! A single interaction record.
use crate::pulse::errors::{PulseError, PulseResult};

/// Caller-chosen identifier of an action.
pub type ActionId = i64;

/// Caller-chosen identifier of an observation.
pub type ObservationId = i64;

/// Event — one `(action, observation, reward)` step of an episode.
///
/// Events are immutable once constructed; their position in the
/// [`EventLog`](super::event_log::EventLog) is their temporal order.
///
/// Fields
/// ------
/// - `action`: id of the action taken at this step.
/// - `observation`: id of the observation received at this step.
/// - `reward`: scalar reward, always finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub action: ActionId,
    pub observation: ObservationId,
    pub reward: f64,
}

impl Event {
    /// Construct an event, rejecting non-finite rewards.
    ///
    /// Reward-model specific ranges (e.g. `[0, 1]` for Bernoulli) are checked
    /// by the model at append time, not here.
    ///
    /// # Errors
    /// - [`PulseError::InvalidReward`] if `reward` is NaN or ±∞.
    pub fn new(action: ActionId, observation: ObservationId, reward: f64) -> PulseResult<Self> {
        if !reward.is_finite() {
            return Err(PulseError::InvalidReward { value: reward, reason: "must be finite" });
        }
        Ok(Self { action, observation, reward })
    }
}
