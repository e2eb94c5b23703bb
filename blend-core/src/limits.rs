//! Regulatory limit defaults and per-parameter target resolution.
//!
//! Limits resolve with precedence: custom override > built-in BS3882
//! default > absent. The target derived from the resolved bounds is
//! what the objective pulls the blend toward.

use crate::model::Config;

/// Resolved lower/upper bounds for one parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    /// Lower acceptable value (None = unbounded below).
    pub lower: Option<f64>,
    /// Upper acceptable value (None = unbounded above).
    pub upper: Option<f64>,
}

/// A selected parameter with resolved bounds and optimization target.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    /// Parameter name as selected in the configuration.
    pub name: String,
    /// Resolved regulatory bounds.
    pub bounds: Bounds,
    /// Scalar value the optimizer pulls the blend toward.
    pub target: f64,
}

/// BS3882-style default limits for multipurpose topsoil.
/// Parameters not listed here carry no default limit.
const BS3882_DEFAULTS: &[(&str, Bounds)] = &[
    ("pH", Bounds { lower: Some(5.5), upper: Some(8.5) }),
    ("Stone Content (>2mm)", Bounds { lower: None, upper: Some(8.0) }),
    ("Organic Matter", Bounds { lower: Some(3.5), upper: Some(10.0) }),
    ("Clay", Bounds { lower: Some(8.0), upper: Some(35.0) }),
    ("Silt", Bounds { lower: Some(15.0), upper: Some(60.0) }),
    ("Sand", Bounds { lower: Some(30.0), upper: Some(60.0) }),
    ("Arsenic", Bounds { lower: None, upper: Some(20.0) }),
    ("Cadmium", Bounds { lower: None, upper: Some(3.0) }),
    ("Chromium (Total)", Bounds { lower: None, upper: Some(100.0) }),
    ("Copper", Bounds { lower: None, upper: Some(200.0) }),
    ("Lead", Bounds { lower: None, upper: Some(450.0) }),
    ("Mercury", Bounds { lower: None, upper: Some(1.0) }),
    ("Nickel", Bounds { lower: None, upper: Some(75.0) }),
    ("Zinc", Bounds { lower: None, upper: Some(300.0) }),
];

/// Contaminants whose target is minimization: the optimizer is pulled
/// toward the low end of the allowed band, or toward zero when no
/// explicit lower bound exists.
const ZERO_SEEKING: &[&str] = &[
    "Arsenic",
    "Cadmium",
    "Chromium (Total)",
    "Chromium (VI)",
    "Lead",
    "Mercury",
    "Selenium",
    "Molybdenum",
    "Cyanide (Free)",
    "Cyanide (Total)",
    "TPH (Total Petroleum Hydrocarbons)",
    "PAH (Total)",
    "PCBs (Total)",
    "Asbestos",
];

/// Built-in default bounds for a parameter name.
pub fn default_bounds(name: &str) -> Bounds {
    BS3882_DEFAULTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, b)| *b)
        .unwrap_or_default()
}

/// Whether a parameter belongs to the fixed zero-seeking contaminant set.
pub fn is_zero_seeking(name: &str) -> bool {
    ZERO_SEEKING.contains(&name)
}

/// Resolve bounds and target for every selected parameter, in
/// selection order.
pub fn resolve_params(config: &Config) -> Vec<ParamSpec> {
    config
        .selected_parameters
        .iter()
        .map(|name| {
            let defaults = default_bounds(name);
            let custom = config
                .custom_limits
                .get(name)
                .copied()
                .unwrap_or_default();
            let bounds = Bounds {
                lower: custom.lower.or(defaults.lower),
                upper: custom.upper.or(defaults.upper),
            };
            let target = if is_zero_seeking(name) {
                bounds.lower.unwrap_or(0.0)
            } else {
                match (bounds.lower, bounds.upper) {
                    (Some(l), Some(u)) => 0.5 * (l + u),
                    (Some(l), None) => l,
                    (None, Some(u)) => u,
                    (None, None) => 0.0,
                }
            };
            ParamSpec {
                name: name.clone(),
                bounds,
                target,
            }
        })
        .collect()
}
