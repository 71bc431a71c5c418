//! pulse::objective — the fitting objective over an event log.
//!
//! - [`design`]: events → `n × D` feature rows, built once per fit.
//! - [`reduction`]: fixed-block, order-stable summation.
//! - [`evaluator`]: penalized loss/gradient, parallel over blocks, exposed to
//!   the optimizer as an [`Objective`](crate::optimization::quasi_newton::Objective).
pub mod design;
pub mod evaluator;
pub mod reduction;

pub use self::design::DesignMatrix;
pub use self::evaluator::ObjectiveEvaluator;
pub use self::reduction::REDUCTION_BLOCK;
