//! pulse::core — events, vocabulary, feature layout, reward families and
//! options.
//!
//! Purpose
//! -------
//! Hold the data-side building blocks of the pulse model. Nothing here runs
//! an optimizer; [`objective`](crate::pulse::objective) and
//! [`models`](crate::pulse::models) build on these types.
//!
//! Key behaviors
//! -------------
//! - [`event`], [`event_log`]: immutable records in an append-only log.
//! - [`vocabulary`]: dense, first-seen indexing of action/observation ids
//!   under an open or closed policy.
//! - [`features`]: the one-hot (+ interaction, + lag) feature layout.
//! - [`reward_model`]: Gaussian and Bernoulli loss/derivative/prediction.
//! - [`options`], [`validation`]: validated configuration.
pub mod event;
pub mod event_log;
pub mod features;
pub mod options;
pub mod reward_model;
pub mod validation;
pub mod vocabulary;

pub use self::event::{ActionId, Event, ObservationId};
pub use self::event_log::EventLog;
pub use self::features::{FeatureConfig, FeatureMapper};
pub use self::options::PulseOptions;
pub use self::reward_model::RewardModel;
pub use self::vocabulary::{CategoryIndex, Vocabulary, VocabularyPolicy};
