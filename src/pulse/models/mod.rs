//! pulse::models — the user-facing model types.
//!
//! - [`pulse`]: [`PulseModel`], single-owner event log + fitter.
//! - [`shared`]: [`SharedPulseModel`], a thread-safe handle that rejects
//!   mutation during an in-flight fit.
//! - [`report`]: [`FitReport`], the summary returned by a successful fit.
pub mod pulse;
pub mod report;
pub mod shared;

pub use self::pulse::PulseModel;
pub use self::report::FitReport;
pub use self::shared::SharedPulseModel;
