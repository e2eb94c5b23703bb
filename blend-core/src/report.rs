//! Compliance reporting: residuals, tonnage breakdown, soil texture
//! and warnings.
//!
//! Output types serialize camelCase; the field set is the stable
//! external JSON schema consumed by the front-end.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::extract::ParameterMatrix;
use crate::limits::ParamSpec;
use crate::model::{Config, Material};
use crate::solver::{SolverSettings, StagedOutcome};

/// Acceptable soil-texture ranges after renormalizing Clay/Silt/Sand
/// to percentages of their sum.
const CLAY_RANGE: (f64, f64) = (8.0, 35.0);
const SILT_RANGE: (f64, f64) = (15.0, 60.0);
const SAND_RANGE: (f64, f64) = (30.0, 60.0);

/// Missing-data warnings name at most this many parameters before
/// collapsing the rest into a count.
const MISSING_NAMES_SHOWN: usize = 5;

/// Compliance status of one parameter residual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidualStatus {
    Compliant,
    Marginal,
    Exceeding,
}

/// Signed deviation of one blended parameter from its target or
/// violated bound.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Residual {
    pub parameter: String,
    pub value: f64,
    pub lower_limit: Option<f64>,
    pub upper_limit: Option<f64>,
    pub target: f64,
    pub residual: f64,
    pub residual_percent: f64,
    pub status: ResidualStatus,
}

/// Per-material tonnage usage at the final ratios.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TonnageEntry {
    pub material_name: String,
    pub material_id: String,
    pub available: f64,
    pub used: f64,
    pub remaining: f64,
    pub percentage: f64,
}

/// Tally over all reported residuals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Compliance {
    pub total_parameters: usize,
    pub compliant: usize,
    pub marginal: usize,
    pub exceeding: usize,
    pub mean_residual: f64,
    pub highest_residual: f64,
    pub lowest_residual: f64,
}

/// Clay/Silt/Sand shares renormalized to 100%, checked against the
/// acceptable texture triangle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilTexture {
    pub clay: f64,
    pub silt: f64,
    pub sand: f64,
    pub within_acceptable_range: bool,
}

/// Diagnostics of the staged solve.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationDetails {
    pub iterations: usize,
    pub convergence: bool,
    pub relaxed_tolerance: Option<f64>,
    pub method: &'static str,
}

/// Complete optimization result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub success: bool,
    pub blend_ratios: BTreeMap<String, f64>,
    pub tonnage_breakdown: Vec<TonnageEntry>,
    pub compliance: Compliance,
    pub residuals: Vec<Residual>,
    pub soil_texture: Option<SoilTexture>,
    pub warnings: Vec<String>,
    pub optimization_details: OptimizationDetails,
}

/// Residual record for one parameter with a present blend value.
///
/// `tolerance_percent` is the configured tolerance used directly as a
/// percent threshold (not divided by 100) for the status bands.
pub fn residual_for(
    spec: &ParamSpec,
    blend: f64,
    tolerance_percent: f64,
    marginal_factor: f64,
) -> Residual {
    let residual = match (spec.bounds.lower, spec.bounds.upper) {
        (Some(lower), _) if blend < lower => blend - lower,
        (_, Some(upper)) if blend > upper => blend - upper,
        _ => blend - spec.target,
    };
    let scale = if spec.target != 0.0 { spec.target } else { 1.0 };
    let residual_percent = (residual / scale).abs() * 100.0;

    let status = if residual_percent <= tolerance_percent {
        ResidualStatus::Compliant
    } else if residual_percent <= tolerance_percent * marginal_factor {
        ResidualStatus::Marginal
    } else {
        ResidualStatus::Exceeding
    };

    Residual {
        parameter: spec.name.clone(),
        value: blend,
        lower_limit: spec.bounds.lower,
        upper_limit: spec.bounds.upper,
        target: spec.target,
        residual,
        residual_percent,
        status,
    }
}

/// Texture check on raw Clay/Silt/Sand blend values (any absolute
/// units); returns None when the three sum to nothing.
pub fn soil_texture(clay: f64, silt: f64, sand: f64) -> Option<SoilTexture> {
    let total = clay + silt + sand;
    if total <= 0.0 {
        return None;
    }
    let clay_pct = clay / total * 100.0;
    let silt_pct = silt / total * 100.0;
    let sand_pct = sand / total * 100.0;
    let within = in_range(clay_pct, CLAY_RANGE)
        && in_range(silt_pct, SILT_RANGE)
        && in_range(sand_pct, SAND_RANGE);
    Some(SoilTexture {
        clay: clay_pct,
        silt: silt_pct,
        sand: sand_pct,
        within_acceptable_range: within,
    })
}

fn in_range(v: f64, (lo, hi): (f64, f64)) -> bool {
    (lo..=hi).contains(&v)
}

/// Assemble the full result from the final (normalized) ratios.
pub fn build_result(
    materials: &[Material],
    config: &Config,
    specs: &[ParamSpec],
    matrix: &ParameterMatrix,
    staged: &StagedOutcome,
    unresolved_ids: &[String],
    settings: &SolverSettings,
) -> OptimizationResult {
    let ratios = &staged.x;
    let blends = matrix.blend_values(ratios);

    let blend_ratios: BTreeMap<String, f64> = materials
        .iter()
        .zip(ratios)
        .map(|(m, &r)| (m.id.clone(), r))
        .collect();

    let tonnage_breakdown: Vec<TonnageEntry> = materials
        .iter()
        .zip(ratios)
        .map(|(m, &r)| {
            let used = m.available_tonnage * r;
            TonnageEntry {
                material_name: m.name.clone(),
                material_id: m.id.clone(),
                available: m.available_tonnage,
                used,
                remaining: m.available_tonnage - used,
                percentage: r * 100.0,
            }
        })
        .collect();

    let mut residuals: Vec<Residual> = specs
        .iter()
        .zip(&blends)
        .filter_map(|(spec, blend)| {
            blend.map(|b| {
                residual_for(spec, b, config.tolerance, settings.marginal_factor)
            })
        })
        .collect();
    residuals.sort_by(|a, b| {
        b.residual_percent
            .abs()
            .total_cmp(&a.residual_percent.abs())
    });

    let compliant = count_status(&residuals, ResidualStatus::Compliant);
    let marginal = count_status(&residuals, ResidualStatus::Marginal);
    let exceeding = count_status(&residuals, ResidualStatus::Exceeding);
    let percents: Vec<f64> = residuals
        .iter()
        .map(|r| r.residual_percent.abs())
        .collect();
    let compliance = Compliance {
        total_parameters: residuals.len(),
        compliant,
        marginal,
        exceeding,
        mean_residual: if percents.is_empty() {
            0.0
        } else {
            percents.iter().sum::<f64>() / percents.len() as f64
        },
        highest_residual: percents.iter().copied().fold(0.0, f64::max),
        lowest_residual: if percents.is_empty() {
            0.0
        } else {
            percents.iter().copied().fold(f64::INFINITY, f64::min)
        },
    };

    let texture = blend_of(specs, &blends, "Clay")
        .zip(blend_of(specs, &blends, "Silt"))
        .zip(blend_of(specs, &blends, "Sand"))
        .and_then(|((clay, silt), sand)| soil_texture(clay, silt, sand));

    let mut warnings = Vec::new();
    if exceeding > 0 {
        warnings.push(format!("{exceeding} parameter(s) exceed acceptable limits"));
    }
    if marginal > 0 {
        warnings.push(format!("{marginal} parameter(s) are marginal"));
    }
    if let Some(relaxed) = staged.relaxed_tolerance {
        warnings.push(format!(
            "Tolerance was relaxed to {relaxed:.0}% to find a solution"
        ));
    }

    let missing: Vec<&str> = specs
        .iter()
        .zip(&blends)
        .filter(|(_, blend)| blend.is_none())
        .map(|(spec, _)| spec.name.as_str())
        .collect();
    if !missing.is_empty() {
        let shown = missing
            .iter()
            .take(MISSING_NAMES_SHOWN)
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
        let rest = missing.len().saturating_sub(MISSING_NAMES_SHOWN);
        if rest > 0 {
            warnings.push(format!("Missing data for: {shown} and {rest} more"));
        } else {
            warnings.push(format!("Missing data for: {shown}"));
        }
    }

    for id in unresolved_ids {
        warnings.push(format!(
            "Material constraint ignored: no material with id '{id}'"
        ));
    }

    OptimizationResult {
        success: staged.success,
        blend_ratios,
        tonnage_breakdown,
        compliance,
        residuals,
        soil_texture: texture,
        warnings,
        optimization_details: OptimizationDetails {
            iterations: staged.iterations,
            convergence: staged.success,
            relaxed_tolerance: staged.relaxed_tolerance,
            method: staged.stage.method(),
        },
    }
}

fn count_status(residuals: &[Residual], status: ResidualStatus) -> usize {
    residuals.iter().filter(|r| r.status == status).count()
}

fn blend_of(specs: &[ParamSpec], blends: &[Option<f64>], name: &str) -> Option<f64> {
    specs
        .iter()
        .zip(blends)
        .find(|(spec, _)| spec.name == name)
        .and_then(|(_, blend)| *blend)
}
