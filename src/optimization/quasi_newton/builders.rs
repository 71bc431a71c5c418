//! quasi_newton::builders — argmin L-BFGS construction helpers.
//!
//! Purpose
//! -------
//! Build argmin `LBFGS` solvers for the reference [`Solver::Argmin`] path,
//! applying the crate-level memory depth, tolerances and line-search
//! constants from [`QuasiNewtonOptions`] so callers never touch argmin's
//! generic wiring.
//!
//! Key behaviors
//! -------------
//! - Hager–Zhang: `(δ, σ)` are set from `(c1, c2)`.
//! - More–Thuente: `(c1, c2)` are passed through unchanged.
//! - `tol_grad` / `tol_cost` are applied via [`configure_lbfgs`].
//!
//! Conventions
//! -----------
//! - The builders do **not** set `theta0` or `max_iters`; those are applied
//!   by [`run_lbfgs`](super::run::run_lbfgs).
//! - argmin errors surface as [`OptError`](crate::optimization::errors::OptError)
//!   through the crate's `From<argmin::core::Error>` conversion.
//!
//! [`Solver::Argmin`]: super::traits::Solver::Argmin
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    quasi_newton::{
        traits::QuasiNewtonOptions,
        types::{
            Cost, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente, MoreThuenteLS, Theta,
        },
    },
};

/// Construct argmin L-BFGS with a Hager–Zhang line search.
///
/// # Errors
/// Returns an `OptError` when argmin rejects the line-search constants or a
/// tolerance.
pub fn build_optimizer_hager_zhang(opts: &QuasiNewtonOptions) -> OptResult<LbfgsHagerZhang> {
    let ls = &opts.line_search;
    let hager_zhang = HagerZhangLS::new().with_delta_sigma(ls.c1, ls.c2)?;
    let lbfgs = LbfgsHagerZhang::new(hager_zhang, opts.memory_depth);
    configure_lbfgs(lbfgs, opts)
}

/// Construct argmin L-BFGS with a More–Thuente line search.
///
/// # Errors
/// Returns an `OptError` when argmin rejects `(c1, c2)` or a tolerance.
pub fn build_optimizer_more_thuente(opts: &QuasiNewtonOptions) -> OptResult<LbfgsMoreThuente> {
    let ls = &opts.line_search;
    let more_thuente = MoreThuenteLS::new().with_c(ls.c1, ls.c2)?;
    let lbfgs = LbfgsMoreThuente::new(more_thuente, opts.memory_depth);
    configure_lbfgs(lbfgs, opts)
}

/// Apply gradient and cost tolerances to an L-BFGS solver, regardless of
/// its line-search type.
///
/// # Errors
/// Returns an `OptError` when argmin rejects a tolerance.
pub fn configure_lbfgs<L>(
    solver: LBFGS<L, Theta, Grad, Cost>, opts: &QuasiNewtonOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    Ok(solver.with_tolerance_grad(opts.tols.tol_grad)?.with_tolerance_cost(opts.tols.tol_cost)?)
}
