//! Local constrained solver: projected gradient on the bounded
//! simplex.
//!
//! Every constraint in this problem is the unit simplex intersected
//! with a box, so the natural local method is gradient descent along
//! the projected arc: Barzilai-Borwein steps, Armijo backtracking,
//! forward-difference gradients. Success means projected-gradient
//! stationarity. A line search that cannot decrease the objective at
//! a non-stationary point is the signature of an out-of-tolerance
//! penalty kink pinning the minimum; that failure is what drives the
//! tolerance relax sweep upstream.

use nalgebra::DVector;

use super::SolverSettings;
use crate::constraints::FeasibleRegion;
use crate::objective::PenaltyObjective;

/// sqrt(f64::EPSILON), the forward-difference step scale.
const FD_STEP: f64 = 1.490_116_119_384_765_6e-8;

/// Armijo sufficient-decrease constant.
const ARMIJO_C: f64 = 1e-4;

/// Maximum step halvings per line search.
const BACKTRACK_MAX: usize = 30;

/// Consecutive near-zero objective decreases before giving up on
/// reaching strict stationarity.
const STALL_LIMIT: usize = 10;

/// Looser stationarity accepted once progress has stopped. Points
/// pinned at a penalty kink sit far above this; points at a smooth
/// minimum's numerical floor sit below it.
const LAX_GTOL: f64 = 1e-4;

/// How a local solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalStatus {
    /// Projected-gradient stationarity reached.
    Stationary,
    /// No descent available at a non-stationary point (penalty kink).
    LineSearchFailed,
    /// Iteration cap exhausted.
    MaxIters,
    /// The constraint box cannot intersect the simplex.
    Infeasible,
}

impl LocalStatus {
    /// Whether this outcome counts as a successful solve.
    pub fn is_success(&self) -> bool {
        matches!(self, LocalStatus::Stationary)
    }
}

/// Result of one local solve.
#[derive(Debug, Clone)]
pub struct LocalOutcome {
    pub x: Vec<f64>,
    pub fval: f64,
    pub status: LocalStatus,
    pub iterations: usize,
}

/// Minimize the objective over the region starting from `x0`.
pub(crate) fn minimize(
    objective: &PenaltyObjective<'_>,
    region: &FeasibleRegion,
    x0: &[f64],
    settings: &SolverSettings,
) -> LocalOutcome {
    if !region.is_consistent() {
        let mut x = x0.to_vec();
        region.clamp(&mut x);
        let fval = objective.value(&x);
        return LocalOutcome {
            x,
            fval,
            status: LocalStatus::Infeasible,
            iterations: 0,
        };
    }

    let mut x = DVector::from_vec(region.project(x0));
    let mut f = objective.value(x.as_slice());
    let mut g = gradient(objective, x.as_slice(), f);
    let mut bb_step = 1.0;
    let mut stall = 0;

    for iter in 0..settings.max_iter {
        let pg = projected_gradient_norm(region, &x, &g);
        if pg <= settings.gtol {
            return LocalOutcome {
                x: x.as_slice().to_vec(),
                fval: f,
                status: LocalStatus::Stationary,
                iterations: iter,
            };
        }

        // Backtracking along the projected arc.
        let mut alpha = bb_step;
        let mut accepted: Option<(DVector<f64>, f64)> = None;
        for _ in 0..BACKTRACK_MAX {
            let shifted = &x - g.scale(alpha);
            let cand = DVector::from_vec(region.project(shifted.as_slice()));
            let step = &x - &cand;
            let step_sq = step.dot(&step);
            if step_sq == 0.0 {
                break;
            }
            let fc = objective.value(cand.as_slice());
            if fc <= f - ARMIJO_C * step_sq / alpha {
                accepted = Some((cand, fc));
                break;
            }
            alpha *= 0.5;
        }

        let Some((xn, fn_new)) = accepted else {
            let status = if pg <= LAX_GTOL {
                LocalStatus::Stationary
            } else {
                LocalStatus::LineSearchFailed
            };
            return LocalOutcome {
                x: x.as_slice().to_vec(),
                fval: f,
                status,
                iterations: iter,
            };
        };

        let gn = gradient(objective, xn.as_slice(), fn_new);

        // BB1 step for the next iteration.
        let s = &xn - &x;
        let y = &gn - &g;
        let sy = s.dot(&y);
        bb_step = if sy > 1e-30 {
            (s.dot(&s) / sy).clamp(1e-8, 1e8)
        } else {
            1.0
        };

        if (f - fn_new).abs() <= settings.ftol * (1.0 + fn_new.abs()) {
            stall += 1;
        } else {
            stall = 0;
        }

        x = xn;
        f = fn_new;
        g = gn;

        if stall >= STALL_LIMIT {
            let pg = projected_gradient_norm(region, &x, &g);
            let status = if pg <= LAX_GTOL {
                LocalStatus::Stationary
            } else {
                LocalStatus::LineSearchFailed
            };
            return LocalOutcome {
                x: x.as_slice().to_vec(),
                fval: f,
                status,
                iterations: iter + 1,
            };
        }
    }

    LocalOutcome {
        x: x.as_slice().to_vec(),
        fval: f,
        status: LocalStatus::MaxIters,
        iterations: settings.max_iter,
    }
}

/// Infinity norm of `x - P(x - g)`, the stationarity measure.
fn projected_gradient_norm(
    region: &FeasibleRegion,
    x: &DVector<f64>,
    g: &DVector<f64>,
) -> f64 {
    let shifted = x - g;
    let trial = region.project(shifted.as_slice());
    x.iter()
        .zip(&trial)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}

/// Forward-difference gradient. `fx` is the already-computed value at
/// `x`, saving one evaluation per call.
fn gradient(
    objective: &PenaltyObjective<'_>,
    x: &[f64],
    fx: f64,
) -> DVector<f64> {
    let n = x.len();
    let mut g = DVector::zeros(n);
    let mut probe = x.to_vec();
    for i in 0..n {
        let h = FD_STEP * (1.0 + x[i].abs());
        probe[i] = x[i] + h;
        g[i] = (objective.value(&probe) - fx) / h;
        probe[i] = x[i];
    }
    g
}
