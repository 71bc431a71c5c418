//! Fit report — the user-facing summary of one successful fit.
use crate::optimization::quasi_newton::{Cost, FnEvalMap, OptimOutcome, TerminalState};
use ndarray::Array1;

/// Summary of a completed fit (`Converged` or `MaxIterationsReached`).
///
/// Fields
/// ------
/// - `parameters`: fitted θ, also stored on the model.
/// - `terminal`: terminal optimizer state.
/// - `loss`: penalized loss at `parameters`.
/// - `iterations`: optimizer iterations performed.
/// - `grad_norm`: ‖∇loss‖ at `parameters`, when the solver reports it.
/// - `fn_evals`: evaluation counters (`"cost_count"`, `"gradient_count"`).
/// - `loss_trace`: initial loss followed by the loss after each accepted
///   step; non-increasing. Empty for the argmin solver.
/// - `status`: solver's termination message.
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    pub parameters: Array1<f64>,
    pub terminal: TerminalState,
    pub loss: Cost,
    pub iterations: usize,
    pub grad_norm: Option<f64>,
    pub fn_evals: FnEvalMap,
    pub loss_trace: Vec<Cost>,
    pub status: String,
}

impl FitReport {
    pub fn converged(&self) -> bool {
        self.terminal == TerminalState::Converged
    }
}

impl From<OptimOutcome> for FitReport {
    fn from(outcome: OptimOutcome) -> Self {
        Self {
            parameters: outcome.theta_hat,
            terminal: outcome.terminal,
            loss: outcome.value,
            iterations: outcome.iterations,
            grad_norm: outcome.grad_norm,
            fn_evals: outcome.fn_evals,
            loss_trace: outcome.loss_trace,
            status: outcome.status,
        }
    }
}
