//! Input data model: materials and optimization configuration.
//!
//! Field names mirror the external JSON schema consumed by the
//! front-end; they are part of a stable contract and must not change.

use serde::Deserialize;
use std::collections::HashMap;

/// A single parameter reading declared on a material.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ParameterValue {
    /// Measured value. A null or absent value counts as missing data.
    pub value: Option<f64>,
}

/// One blendable material with its declared chemistry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    /// Stable identifier, referenced by material constraints.
    pub id: String,

    /// Display name used in the tonnage breakdown.
    pub name: String,

    /// Stock available for blending, in tonnes.
    #[serde(default)]
    pub available_tonnage: f64,

    /// Parameter name to declared reading.
    #[serde(default)]
    pub parameters: HashMap<String, ParameterValue>,
}

/// Custom lower/upper override for one parameter.
///
/// Either side may be absent; absent sides fall through to the
/// built-in regulatory default for that parameter.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LimitOverride {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

/// Percentage constraint pinning one material's share of the blend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialConstraint {
    /// Id of the constrained material.
    pub material_id: String,

    /// Minimum share, in percent of the whole blend.
    pub min_percentage: Option<f64>,

    /// Maximum share, in percent of the whole blend.
    pub max_percentage: Option<f64>,
}

/// Optimization configuration supplied alongside the materials.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Parameters to optimize, in display order. This order is the
    /// index contract for every per-parameter vector downstream.
    #[serde(default)]
    pub selected_parameters: Vec<String>,

    /// Per-parameter limit overrides, taking precedence over the
    /// built-in regulatory defaults.
    #[serde(default)]
    pub custom_limits: HashMap<String, LimitOverride>,

    /// Per-material percentage constraints.
    #[serde(default)]
    pub material_constraints: Vec<MaterialConstraint>,

    /// Allowed deviation from target, in percent, before the heavy
    /// objective penalty and a worse compliance status apply.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Retry with a loosened tolerance ladder when the strict solve
    /// does not converge.
    #[serde(default = "default_auto_relax")]
    pub auto_relax: bool,
}

fn default_tolerance() -> f64 {
    30.0
}

fn default_auto_relax() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            selected_parameters: Vec::new(),
            custom_limits: HashMap::new(),
            material_constraints: Vec::new(),
            tolerance: default_tolerance(),
            auto_relax: default_auto_relax(),
        }
    }
}
