//! Design matrix — the event log materialized as feature rows.
//!
//! Built once per fit so every loss/gradient evaluation is a pass of dot
//! products over a contiguous `Array2`.
use crate::pulse::{
    core::{event::Event, features::FeatureMapper},
    errors::{PulseError, PulseResult},
};
use ndarray::{Array1, Array2};

/// `n × D` feature rows with their rewards.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    features: Array2<f64>,
    rewards: Array1<f64>,
}

impl DesignMatrix {
    /// Map every event through `mapper`.
    ///
    /// # Errors
    /// - [`PulseError::InvalidCategory`] if an event id is unknown to the
    ///   mapper's vocabulary.
    pub fn build(mapper: &FeatureMapper, events: &[Event]) -> PulseResult<Self> {
        let mut features = Array2::zeros((events.len(), mapper.dimension()));
        for (t, row) in features.rows_mut().into_iter().enumerate() {
            mapper.map_event_into(events, t, row)?;
        }
        let rewards = events.iter().map(|e| e.reward).collect::<Array1<f64>>();
        Ok(Self { features, rewards })
    }

    /// Wrap precomputed rows.
    ///
    /// # Errors
    /// - [`PulseError::DimensionMismatch`] if row and reward counts differ.
    /// - [`PulseError::InvalidReward`] for a non-finite reward.
    pub fn from_parts(features: Array2<f64>, rewards: Array1<f64>) -> PulseResult<Self> {
        if features.nrows() != rewards.len() {
            return Err(PulseError::DimensionMismatch {
                expected: features.nrows(),
                found: rewards.len(),
            });
        }
        if let Some(&value) = rewards.iter().find(|r| !r.is_finite()) {
            return Err(PulseError::InvalidReward { value, reason: "must be finite" });
        }
        Ok(Self { features, rewards })
    }

    pub fn n_events(&self) -> usize {
        self.features.nrows()
    }

    /// Feature dimension `D`.
    pub fn dimension(&self) -> usize {
        self.features.ncols()
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn rewards(&self) -> &Array1<f64> {
        &self.rewards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::core::{features::FeatureConfig, vocabulary::Vocabulary};
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // `build` stacks mapped rows and rewards in log order.
    //
    // Given
    // -----
    // - Default features, |A| = |O| = 2, events (0,1,0.5), (1,0,-1).
    //
    // Expect
    // ------
    // - Rows `[1 1 0 0 1]`, `[1 0 1 1 0]`; rewards `[0.5, -1]`.
    fn build_stacks_rows_in_order() {
        // Arrange
        let vocabulary = Vocabulary::closed([0, 1], [0, 1]);
        let mapper = FeatureMapper::new(FeatureConfig::default(), vocabulary);
        let events = [
            Event { action: 0, observation: 1, reward: 0.5 },
            Event { action: 1, observation: 0, reward: -1.0 },
        ];

        // Act
        let design = DesignMatrix::build(&mapper, &events).unwrap();

        // Assert
        assert_eq!(design.features(), &array![[1., 1., 0., 0., 1.], [1., 0., 1., 1., 0.]]);
        assert_eq!(design.rewards(), &array![0.5, -1.0]);
        assert_eq!((design.n_events(), design.dimension()), (2, 5));
    }

    #[test]
    // Purpose
    // -------
    // `from_parts` rejects mismatched shapes and non-finite rewards.
    //
    // Given
    // -----
    // - 2 rows with 3 rewards; 1 row with a NaN reward.
    //
    // Expect
    // ------
    // - `DimensionMismatch` and `InvalidReward`.
    fn from_parts_validates_inputs() {
        assert_eq!(
            DesignMatrix::from_parts(Array2::zeros((2, 1)), Array1::zeros(3)),
            Err(PulseError::DimensionMismatch { expected: 2, found: 3 })
        );
        assert!(matches!(
            DesignMatrix::from_parts(Array2::zeros((1, 1)), array![f64::NAN]),
            Err(PulseError::InvalidReward { .. })
        ));
    }
}
