//! SharedPulseModel — a clonable, thread-safe handle to one [`PulseModel`].
//!
//! Purpose
//! -------
//! Let producer threads append events while another thread fits, without
//! ever observing a half-updated model.
//!
//! Key behaviors
//! -------------
//! - All access is serialized by a `Mutex`.
//! - An in-flight flag marks a running fit. `append` and a second `fit`
//!   fail fast with [`PulseError::ConcurrentMutation`] while it is set
//!   instead of queueing behind the fit.
//! - `clear` waits for the lock and never fails.
//!
//! Invariants & assumptions
//! ------------------------
//! - A panic inside a model call poisons the mutex; the handle recovers the
//!   inner model with [`PoisonError::into_inner`]. Model methods validate
//!   before mutating, so the recovered state is consistent.
use super::{pulse::PulseModel, report::FitReport};
use crate::pulse::errors::{PulseError, PulseResult};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
};

/// Clonable handle; clones refer to the same model.
#[derive(Debug, Clone)]
pub struct SharedPulseModel {
    inner: Arc<Mutex<PulseModel>>,
    fitting: Arc<AtomicBool>,
}

/// Clears the in-flight flag when a fit ends, including by panic.
struct FitGuard<'a>(&'a AtomicBool);

impl Drop for FitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SharedPulseModel {
    pub fn new(model: PulseModel) -> Self {
        Self { inner: Arc::new(Mutex::new(model)), fitting: Arc::new(AtomicBool::new(false)) }
    }

    fn lock(&self) -> MutexGuard<'_, PulseModel> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `true` while a fit is running on some clone of this handle.
    pub fn is_fitting(&self) -> bool {
        self.fitting.load(Ordering::Acquire)
    }

    /// Append one event.
    ///
    /// # Errors
    /// - [`PulseError::ConcurrentMutation`] while a fit is in flight.
    /// - Everything [`PulseModel::append`] returns.
    pub fn append(&self, action: i64, observation: i64, reward: f64) -> PulseResult<()> {
        if self.is_fitting() {
            return Err(PulseError::ConcurrentMutation);
        }
        self.lock().append(action, observation, reward)
    }

    /// Fit the shared model.
    ///
    /// # Errors
    /// - [`PulseError::ConcurrentMutation`] if another fit is in flight.
    /// - Everything [`PulseModel::fit`] returns.
    pub fn fit(&self) -> PulseResult<FitReport> {
        if self.fitting.swap(true, Ordering::AcqRel) {
            return Err(PulseError::ConcurrentMutation);
        }
        let _guard = FitGuard(&self.fitting);
        self.lock().fit()
    }

    /// Discard all events, waiting for any in-flight fit to finish.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// See [`PulseModel::predict`].
    pub fn predict(&self, action: i64, observation: i64) -> PulseResult<f64> {
        self.lock().predict(action, observation)
    }
}

impl From<PulseModel> for SharedPulseModel {
    fn from(model: PulseModel) -> Self {
        Self::new(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::core::options::PulseOptions;
    use std::thread;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover the in-flight flag (deterministically, by setting it
    // directly) and a multi-threaded smoke run.
    // -------------------------------------------------------------------------

    fn shared() -> SharedPulseModel {
        let opts = PulseOptions::default().with_worker_count(1).unwrap();
        SharedPulseModel::new(PulseModel::new(opts).unwrap())
    }

    #[test]
    // Purpose
    // -------
    // Appends and fits are rejected while a fit is in flight; clear is not.
    //
    // Given
    // -----
    // - A handle with one event and the in-flight flag set.
    //
    // Expect
    // ------
    // - `append` and `fit` fail with `ConcurrentMutation`; `clear` succeeds;
    //   once the flag drops, `append` works again.
    fn in_flight_fit_rejects_mutation() {
        // Arrange
        let handle = shared();
        handle.append(0, 0, 1.0).unwrap();
        handle.fitting.store(true, Ordering::Release);

        // Act
        let append = handle.append(1, 1, 0.0);
        let fit = handle.fit();
        let len_during = handle.len();
        handle.clear();
        handle.fitting.store(false, Ordering::Release);
        let append_after = handle.append(1, 1, 0.0);

        // Assert
        assert_eq!(append, Err(PulseError::ConcurrentMutation));
        assert_eq!(fit.unwrap_err(), PulseError::ConcurrentMutation);
        assert_eq!(len_during, 1);
        assert!(append_after.is_ok());
        assert_eq!(handle.len(), 1);
    }

    #[test]
    // Purpose
    // -------
    // The in-flight flag is released after a fit, even a failing one.
    //
    // Given
    // -----
    // - An empty shared model (fit fails with `EmptyLog`).
    //
    // Expect
    // ------
    // - `EmptyLog`, then `is_fitting() == false`.
    fn flag_is_released_after_fit() {
        // Arrange
        let handle = shared();

        // Act
        let err = handle.fit().unwrap_err();

        // Assert
        assert_eq!(err, PulseError::EmptyLog);
        assert!(!handle.is_fitting());
    }

    #[test]
    // Purpose
    // -------
    // Concurrent producers and a fitter never corrupt the log.
    //
    // Given
    // -----
    // - Four threads each attempting 50 appends while the main thread fits.
    //
    // Expect
    // ------
    // - Every append either succeeds or fails with `ConcurrentMutation`;
    //   the final length equals the number of successes.
    fn concurrent_appends_are_counted_exactly() {
        // Arrange
        let handle = shared();
        handle.append(0, 0, 0.0).unwrap();

        // Act
        let producers: Vec<_> = (0..4_i64)
            .map(|t| {
                let h = handle.clone();
                thread::spawn(move || {
                    (0..50_i64)
                        .filter(|i| match h.append(t, i % 3, 0.1 * (*i as f64)) {
                            Ok(()) => true,
                            Err(PulseError::ConcurrentMutation) => false,
                            Err(other) => panic!("unexpected error: {other}"),
                        })
                        .count()
                })
            })
            .collect();
        let _ = handle.fit();
        let successes: usize = producers.into_iter().map(|p| p.join().unwrap()).sum();

        // Assert
        assert_eq!(handle.len(), 1 + successes);
        assert!(!handle.is_fitting());
    }
}
