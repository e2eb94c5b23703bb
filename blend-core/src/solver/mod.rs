//! Staged solve orchestration.
//!
//! The search runs a fixed fallback ladder: a strict local solve,
//! then (when auto-relax is on) the same local solve at successively
//! looser tolerances, then differential evolution. Whatever the last
//! stage produced is final; non-convergence degrades into
//! `success = false` rather than an error.

mod global;
mod local;

pub use global::GlobalOutcome;
pub use local::{LocalOutcome, LocalStatus};

use crate::constraints::FeasibleRegion;
use crate::objective::PenaltyObjective;

/// Settings for the staged solver.
#[derive(Debug, Clone)]
pub struct SolverSettings {
    /// Iteration cap for each local solve.
    pub max_iter: usize,

    /// Functional tolerance for the local solve.
    pub ftol: f64,

    /// Projected-gradient stationarity tolerance.
    pub gtol: f64,

    /// Tolerance ladder for the relax sweep, in percent.
    pub relax_ladder: Vec<f64>,

    /// Generation cap for differential evolution.
    pub de_max_iter: usize,

    /// Population multiplier for differential evolution (times the
    /// number of materials).
    pub de_popsize: usize,

    /// RNG seed for differential evolution.
    pub de_seed: u64,

    /// Relative energy spread at which the population counts as
    /// converged.
    pub de_conv_tol: f64,

    /// Residual-status factor separating marginal from exceeding.
    pub marginal_factor: f64,

    /// Print stage progress to stderr.
    pub verbose: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        // Environment overrides for the iteration cap and the DE seed
        // help when reproducing solver behavior outside the test
        // suite.
        let max_iter = std::env::var("BLENDIX_MAX_ITER")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(1000);
        let de_seed = std::env::var("BLENDIX_DE_SEED")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(42);

        Self {
            max_iter,
            ftol: 1e-9,
            gtol: 1e-6,
            relax_ladder: vec![40.0, 50.0, 60.0, 80.0, 100.0],
            de_max_iter: 1000,
            de_popsize: 15,
            de_seed,
            de_conv_tol: 0.01,
            marginal_factor: 1.5,
            verbose: false,
        }
    }
}

impl SolverSettings {
    /// Enable stage-progress logging.
    pub fn with_verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Override the local iteration cap.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Override the relax ladder (percent values, tried in order).
    pub fn with_relax_ladder(mut self, ladder: Vec<f64>) -> Self {
        self.relax_ladder = ladder;
        self
    }
}

/// Which stage produced the final vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Strict local solve succeeded.
    Initial,
    /// A relaxed-tolerance local solve succeeded.
    Relaxed,
    /// Differential evolution ran last.
    Global,
}

impl Stage {
    /// Method name reported in the optimization details.
    pub fn method(&self) -> &'static str {
        match self {
            Stage::Initial | Stage::Relaxed => "local",
            Stage::Global => "differential_evolution",
        }
    }
}

/// Outcome of the staged search. The ratio vector is not yet
/// normalized; the caller divides by the sum as a final defensive
/// step.
#[derive(Debug, Clone)]
pub struct StagedOutcome {
    pub x: Vec<f64>,
    pub fval: f64,
    pub success: bool,
    pub iterations: usize,
    pub stage: Stage,
    /// Percent value at which the relax sweep first succeeded.
    pub relaxed_tolerance: Option<f64>,
}

/// Run the staged fallback search.
pub fn solve_staged(
    objective: &PenaltyObjective<'_>,
    region: &FeasibleRegion,
    auto_relax: bool,
    settings: &SolverSettings,
) -> StagedOutcome {
    let n = region.len();
    let x0 = vec![1.0 / n as f64; n];

    let first = local::minimize(objective, region, &x0, settings);
    if settings.verbose {
        eprintln!(
            "[blend] initial solve: {:?}, f = {:.6e}, iters = {}",
            first.status, first.fval, first.iterations
        );
    }
    if first.status.is_success() {
        return StagedOutcome {
            x: first.x,
            fval: first.fval,
            success: true,
            iterations: first.iterations,
            stage: Stage::Initial,
            relaxed_tolerance: None,
        };
    }

    if auto_relax {
        let (hit, last) = sweep(&settings.relax_ladder, |pct| {
            let relaxed = objective.with_tolerance_percent(pct);
            local::minimize(&relaxed, region, &x0, settings)
        });
        if settings.verbose {
            match hit {
                Some(pct) => eprintln!("[blend] relax sweep succeeded at {pct}%"),
                None => eprintln!("[blend] relax sweep exhausted"),
            }
        }
        if let (Some(pct), Some(out)) = (hit, last) {
            return StagedOutcome {
                x: out.x,
                fval: out.fval,
                success: true,
                iterations: out.iterations,
                stage: Stage::Relaxed,
                relaxed_tolerance: Some(pct),
            };
        }
    }

    // Global fallback at the original tolerance.
    let out = global::minimize(objective, region, settings);
    if settings.verbose {
        eprintln!(
            "[blend] global solve: converged = {}, f = {:.6e}, generations = {}",
            out.converged, out.fval, out.generations
        );
    }
    StagedOutcome {
        x: out.x,
        fval: out.fval,
        success: out.converged,
        iterations: out.generations,
        stage: Stage::Global,
        relaxed_tolerance: None,
    }
}

/// Run the relax ladder until an attempt succeeds. Returns the
/// percent that succeeded (if any) and the last attempt's outcome.
fn sweep<F>(ladder: &[f64], mut attempt: F) -> (Option<f64>, Option<LocalOutcome>)
where
    F: FnMut(f64) -> LocalOutcome,
{
    let mut last = None;
    for &pct in ladder {
        let out = attempt(pct);
        let ok = out.status.is_success();
        last = Some(out);
        if ok {
            return (Some(pct), last);
        }
    }
    (None, last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: LocalStatus) -> LocalOutcome {
        LocalOutcome {
            x: vec![0.5, 0.5],
            fval: 1.0,
            status,
            iterations: 7,
        }
    }

    #[test]
    fn test_sweep_stops_at_first_success() {
        let ladder = [40.0, 50.0, 60.0, 80.0, 100.0];
        let mut tried = Vec::new();
        let (hit, _) = sweep(&ladder, |pct| {
            tried.push(pct);
            if pct >= 50.0 {
                outcome(LocalStatus::Stationary)
            } else {
                outcome(LocalStatus::LineSearchFailed)
            }
        });
        assert_eq!(hit, Some(50.0));
        assert_eq!(tried, vec![40.0, 50.0]);
    }

    #[test]
    fn test_sweep_returns_last_attempt_when_all_fail() {
        let ladder = [40.0, 50.0, 60.0, 80.0, 100.0];
        let mut tried = Vec::new();
        let (hit, last) = sweep(&ladder, |pct| {
            tried.push(pct);
            outcome(LocalStatus::MaxIters)
        });
        assert_eq!(hit, None);
        assert_eq!(tried, vec![40.0, 50.0, 60.0, 80.0, 100.0]);
        assert_eq!(last.unwrap().status, LocalStatus::MaxIters);
    }

    #[test]
    fn test_default_ladder_matches_policy() {
        let settings = SolverSettings::default();
        assert_eq!(settings.relax_ladder, vec![40.0, 50.0, 60.0, 80.0, 100.0]);
        assert_eq!(settings.marginal_factor, 1.5);
        assert_eq!(settings.de_seed, 42);
    }

    #[test]
    fn test_stage_method_names() {
        assert_eq!(Stage::Initial.method(), "local");
        assert_eq!(Stage::Relaxed.method(), "local");
        assert_eq!(Stage::Global.method(), "differential_evolution");
    }
}
