//! blend-core: constrained soil-blend optimization.
//!
//! Computes the blend of soil-like materials (ratios summing to 1)
//! that best satisfies chemical/physical targets and regulatory
//! limits, subject to per-material percentage constraints.
//!
//! # Pipeline
//!
//! 1. Extract selected parameters into material-aligned vectors
//!    ([`extract::ParameterMatrix`]).
//! 2. Resolve per-parameter limits and targets against the built-in
//!    BS3882 defaults ([`limits`]).
//! 3. Build the feasible region: the unit simplex intersected with
//!    per-material percentage boxes ([`constraints::FeasibleRegion`]).
//! 4. Minimize the tolerance-weighted penalty objective
//!    ([`objective::PenaltyObjective`]) with a staged fallback: local
//!    solve, tolerance relax sweep, differential evolution
//!    ([`solver::solve_staged`]).
//! 5. Post-process the ratio vector into a compliance report
//!    ([`report::OptimizationResult`]).
//!
//! Non-convergence is not an error: the best-found vector is reported
//! with `success = false` and explanatory warnings.
//!
//! # Example
//!
//! ```ignore
//! use blend_core::{optimize_blend, Config, Material};
//!
//! let materials: Vec<Material> = serde_json::from_str(materials_json)?;
//! let config: Config = serde_json::from_str(config_json)?;
//!
//! let result = optimize_blend(&materials, &config)?;
//! println!("success: {}", result.success);
//! for (id, ratio) in &result.blend_ratios {
//!     println!("{id}: {:.1}%", ratio * 100.0);
//! }
//! ```

pub mod constraints;
pub mod error;
pub mod extract;
pub mod limits;
pub mod model;
pub mod objective;
pub mod report;
pub mod solver;

pub use error::{BlendError, BlendResult};
pub use model::{Config, LimitOverride, Material, MaterialConstraint, ParameterValue};
pub use report::{
    Compliance, OptimizationDetails, OptimizationResult, Residual, ResidualStatus,
    SoilTexture, TonnageEntry,
};
pub use solver::{SolverSettings, Stage};

use constraints::{FeasibleRegion, RegionBuild};
use extract::ParameterMatrix;
use objective::PenaltyObjective;

/// Optimize a blend with default solver settings.
///
/// Fails only on input validation (fewer than 2 materials); solver
/// non-convergence degrades into `success = false` on the result.
pub fn optimize_blend(
    materials: &[Material],
    config: &Config,
) -> BlendResult<OptimizationResult> {
    optimize_blend_with(materials, config, &SolverSettings::default())
}

/// Optimize a blend with explicit solver settings.
pub fn optimize_blend_with(
    materials: &[Material],
    config: &Config,
    settings: &SolverSettings,
) -> BlendResult<OptimizationResult> {
    if materials.len() < 2 {
        return Err(BlendError::TooFewMaterials(materials.len()));
    }

    let specs = limits::resolve_params(config);
    let matrix = ParameterMatrix::extract(materials, &config.selected_parameters);
    let RegionBuild {
        region,
        unresolved_ids,
    } = FeasibleRegion::from_config(materials, &config.material_constraints);
    let objective = PenaltyObjective::new(&matrix, &specs, config.tolerance);

    let mut staged = solver::solve_staged(&objective, &region, config.auto_relax, settings);
    // The equality constraint already holds; dividing by the sum is a
    // defensive final step and is idempotent on the simplex.
    constraints::normalize(&mut staged.x);

    Ok(report::build_result(
        materials,
        config,
        &specs,
        &matrix,
        &staged,
        &unresolved_ids,
        settings,
    ))
}
