//! Vocabulary — dense indexing of caller-chosen action and observation ids.
//!
//! Purpose
//! -------
//! Map arbitrary `i64` ids to contiguous indices `0..|A|` / `0..|O|` so the
//! feature mapper can lay out one-hot blocks. Indices follow first-seen order
//! and never change once assigned.
//!
//! Key behaviors
//! -------------
//! - [`VocabularyPolicy::Open`]: unknown ids are registered on first sight.
//! - [`VocabularyPolicy::Closed`]: the id sets are fixed at construction and
//!   unknown ids fail with [`PulseError::InvalidCategory`].
//! - [`Vocabulary::register`] is all-or-nothing: if the observation is
//!   rejected, a new action id from the same call is not registered either.
//!
//! Invariants & assumptions
//! ------------------------
//! - The vocabulary is append-only; clearing the event log does not shrink
//!   it, so the feature dimension is stable across episodes.
use crate::pulse::errors::{CategoryKind, PulseError, PulseResult};
use std::{collections::HashMap, fmt, str::FromStr};

/// Whether unknown ids may be added to a vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VocabularyPolicy {
    #[default]
    Open,
    Closed,
}

impl FromStr for VocabularyPolicy {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(VocabularyPolicy::Open),
            "closed" => Ok(VocabularyPolicy::Closed),
            _ => Err(PulseError::InvalidOption {
                name: "vocabulary_policy",
                reason: format!("unknown policy '{s}', expected 'open' or 'closed'"),
            }),
        }
    }
}

impl fmt::Display for VocabularyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VocabularyPolicy::Open => write!(f, "open"),
            VocabularyPolicy::Closed => write!(f, "closed"),
        }
    }
}

/// Bidirectional id ↔ index table for one category kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryIndex {
    index: HashMap<i64, usize>,
    ids: Vec<i64>,
}

impl CategoryIndex {
    /// Index built from `ids` in order; duplicates keep their first position.
    pub fn from_ids<I: IntoIterator<Item = i64>>(ids: I) -> Self {
        let mut out = Self::default();
        for id in ids {
            out.insert(id);
        }
        out
    }

    /// Index of `id`, if known.
    pub fn get(&self, id: i64) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids in index order.
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    fn insert(&mut self, id: i64) -> usize {
        if let Some(&i) = self.index.get(&id) {
            return i;
        }
        let i = self.ids.len();
        self.ids.push(id);
        self.index.insert(id, i);
        i
    }
}

/// Action and observation indices under a single policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    actions: CategoryIndex,
    observations: CategoryIndex,
    policy: VocabularyPolicy,
}

impl Vocabulary {
    /// Empty vocabulary with the given policy.
    ///
    /// An empty closed vocabulary rejects every id; use [`Vocabulary::closed`]
    /// to supply the id sets.
    pub fn new(policy: VocabularyPolicy) -> Self {
        Self { actions: CategoryIndex::default(), observations: CategoryIndex::default(), policy }
    }

    /// Empty open vocabulary.
    pub fn open() -> Self {
        Self::new(VocabularyPolicy::Open)
    }

    /// Closed vocabulary over the given ids (indices follow iteration order).
    pub fn closed<A, O>(actions: A, observations: O) -> Self
    where
        A: IntoIterator<Item = i64>,
        O: IntoIterator<Item = i64>,
    {
        Self {
            actions: CategoryIndex::from_ids(actions),
            observations: CategoryIndex::from_ids(observations),
            policy: VocabularyPolicy::Closed,
        }
    }

    pub fn policy(&self) -> VocabularyPolicy {
        self.policy
    }

    pub fn actions(&self) -> &CategoryIndex {
        &self.actions
    }

    pub fn observations(&self) -> &CategoryIndex {
        &self.observations
    }

    /// `|A|`.
    pub fn num_actions(&self) -> usize {
        self.actions.len()
    }

    /// `|O|`.
    pub fn num_observations(&self) -> usize {
        self.observations.len()
    }

    /// Index of a known action id.
    ///
    /// # Errors
    /// - [`PulseError::InvalidCategory`] if `id` has never been registered.
    pub fn action_index(&self, id: i64) -> PulseResult<usize> {
        self.actions.get(id).ok_or(PulseError::InvalidCategory { kind: CategoryKind::Action, id })
    }

    /// Index of a known observation id.
    ///
    /// # Errors
    /// - [`PulseError::InvalidCategory`] if `id` has never been registered.
    pub fn observation_index(&self, id: i64) -> PulseResult<usize> {
        self.observations
            .get(id)
            .ok_or(PulseError::InvalidCategory { kind: CategoryKind::Observation, id })
    }

    /// Validate (closed) or register (open) an `(action, observation)` pair.
    ///
    /// Returns the pair's indices. Nothing is registered unless both ids are
    /// accepted.
    ///
    /// # Errors
    /// - [`PulseError::InvalidCategory`] under [`VocabularyPolicy::Closed`]
    ///   when either id is unknown (the action is reported first).
    pub fn register(&mut self, action: i64, observation: i64) -> PulseResult<(usize, usize)> {
        match self.policy {
            VocabularyPolicy::Closed => {
                Ok((self.action_index(action)?, self.observation_index(observation)?))
            }
            VocabularyPolicy::Open => {
                Ok((self.actions.insert(action), self.observations.insert(observation)))
            }
        }
    }
}
