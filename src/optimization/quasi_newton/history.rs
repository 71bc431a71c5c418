//! quasi_newton::history — bounded `(s, y)` curvature memory for L-BFGS.
//!
//! Purpose
//! -------
//! Hold the last `m` curvature pairs `s_k = θ_{k+1} − θ_k`,
//! `y_k = g_{k+1} − g_k` and turn them into a search direction with the
//! standard two-loop recursion, without ever forming the inverse Hessian.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every stored pair satisfies `sᵀy > ε‖s‖‖y‖` with `ε = CURVATURE_EPS`,
//!   so each `ρ = 1 / sᵀy` is finite and positive and the implicit inverse
//!   Hessian stays positive definite.
//! - At most `capacity` pairs are stored; pushing into a full history evicts
//!   the oldest pair.
//! - The history is ephemeral: it lives for one optimization run.
use crate::optimization::quasi_newton::types::{Grad, Theta};
use std::collections::VecDeque;

/// Relative curvature threshold for accepting a pair.
pub const CURVATURE_EPS: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq)]
struct CurvaturePair {
    s: Theta,
    y: Grad,
    rho: f64,
}

/// Limited-memory inverse-Hessian approximation.
#[derive(Debug, Clone, PartialEq)]
pub struct LbfgsHistory {
    pairs: VecDeque<CurvaturePair>,
    capacity: usize,
}

impl LbfgsHistory {
    /// Empty history holding at most `capacity` pairs (`capacity ≥ 1` is
    /// enforced by option validation upstream).
    pub fn new(capacity: usize) -> Self {
        Self { pairs: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    /// Push a curvature pair if it passes the curvature test.
    ///
    /// Returns `true` when the pair was stored. Pairs failing
    /// `sᵀy > ε‖s‖‖y‖` (or producing a non-finite `ρ`) are skipped and the
    /// history is left unchanged.
    pub fn push(&mut self, s: Theta, y: Grad) -> bool {
        let sy = s.dot(&y);
        let threshold = CURVATURE_EPS * s.dot(&s).sqrt() * y.dot(&y).sqrt();
        if !(sy > threshold) || !sy.is_finite() {
            return false;
        }
        let rho = 1.0 / sy;
        if !rho.is_finite() {
            return false;
        }
        if self.pairs.len() == self.capacity {
            self.pairs.pop_front();
        }
        self.pairs.push_back(CurvaturePair { s, y, rho });
        true
    }

    /// Search direction `d = −H·g` via the two-loop recursion.
    ///
    /// The initial inverse Hessian is `γI` with `γ = sᵀy / yᵀy` taken from the
    /// newest pair; an empty history yields steepest descent `−g`.
    pub fn direction(&self, grad: &Grad) -> Grad {
        let Some(newest) = self.pairs.back() else {
            return -grad;
        };
        let mut q = grad.clone();
        let mut alpha = Vec::with_capacity(self.pairs.len());
        for pair in self.pairs.iter().rev() {
            let a = pair.rho * pair.s.dot(&q);
            q.scaled_add(-a, &pair.y);
            alpha.push(a);
        }

        let yy = newest.y.dot(&newest.y);
        let gamma = if yy > 0.0 { 1.0 / (newest.rho * yy) } else { 1.0 };
        q *= gamma;

        for (pair, a) in self.pairs.iter().zip(alpha.iter().rev()) {
            let b = pair.rho * pair.y.dot(&q);
            q.scaled_add(a - b, &pair.s);
        }
        -q
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Steepest descent on an empty history.
    // - Exact inverse curvature recovered on a separable quadratic.
    // - Curvature-test rejection and capacity eviction.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // An empty history falls back to steepest descent.
    //
    // Given
    // -----
    // - `g = [1, -2]`.
    //
    // Expect
    // ------
    // - `d = [-1, 2]`.
    fn empty_history_returns_steepest_descent() {
        let history = LbfgsHistory::new(3);
        assert_eq!(history.direction(&array![1.0, -2.0]), array![-1.0, 2.0]);
    }

    #[test]
    // Purpose
    // -------
    // On `f(θ) = ½ θᵀ diag(2, 8) θ` two independent pairs reproduce `H⁻¹`.
    //
    // Given
    // -----
    // - Pairs along each axis: `s = e_i`, `y = A e_i`.
    //
    // Expect
    // ------
    // - `direction(g) = −A⁻¹ g` to machine precision.
    fn two_pairs_recover_inverse_hessian_of_diagonal_quadratic() {
        // Arrange
        let mut history = LbfgsHistory::new(5);
        assert!(history.push(array![1.0, 0.0], array![2.0, 0.0]));
        assert!(history.push(array![0.0, 1.0], array![0.0, 8.0]));

        // Act
        let d = history.direction(&array![4.0, 4.0]);

        // Assert
        assert!((d[0] + 2.0).abs() < 1e-12);
        assert!((d[1] + 0.5).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Pairs with non-positive curvature are skipped; a full history evicts
    // its oldest pair.
    //
    // Given
    // -----
    // - Capacity 2, one pair with `sᵀy < 0`, then three valid pairs.
    //
    // Expect
    // ------
    // - The negative-curvature pair is rejected; length never exceeds 2.
    fn push_rejects_negative_curvature_and_evicts_oldest() {
        // Arrange
        let mut history = LbfgsHistory::new(2);

        // Act + Assert
        assert!(!history.push(array![1.0], array![-1.0]));
        assert!(history.is_empty());
        for k in 1..=3 {
            assert!(history.push(array![1.0], array![f64::from(k)]));
        }
        assert_eq!(history.len(), 2);

        // Newest pair has y = 3, so γ = 1/3 and d = −g/3.
        let d = history.direction(&array![3.0]);
        assert!((d[0] + 1.0).abs() < 1e-12);
    }
}
