//! Penalty objective mapping a ratio vector to a scalar error.
//!
//! All state the objective needs travels in an explicit struct; the
//! relax sweep swaps the working tolerance without touching anything
//! else.

use crate::extract::ParameterMatrix;
use crate::limits::ParamSpec;

/// Weight applied to squared residuals beyond the tolerance band.
/// The step is part of the contract; do not smooth it away.
pub const OUT_OF_TOLERANCE_WEIGHT: f64 = 10.0;

/// Sum-of-squares penalty over all parameters with a present blend
/// value.
#[derive(Debug, Clone, Copy)]
pub struct PenaltyObjective<'a> {
    matrix: &'a ParameterMatrix,
    specs: &'a [ParamSpec],
    /// Working tolerance as a fraction (config percent / 100).
    tolerance: f64,
}

impl<'a> PenaltyObjective<'a> {
    /// Build the objective at the configured tolerance (in percent).
    pub fn new(
        matrix: &'a ParameterMatrix,
        specs: &'a [ParamSpec],
        tolerance_percent: f64,
    ) -> Self {
        Self {
            matrix,
            specs,
            tolerance: tolerance_percent / 100.0,
        }
    }

    /// The same objective at a different tolerance; used by the relax
    /// sweep.
    pub fn with_tolerance_percent(&self, tolerance_percent: f64) -> Self {
        Self {
            tolerance: tolerance_percent / 100.0,
            ..*self
        }
    }

    /// Total squared-residual error at `ratios`.
    ///
    /// Per parameter: residual is measured against the violated bound
    /// when the blend falls outside the band, against the target when
    /// inside, scaled by the target (or 1 for a zero target). Beyond
    /// the tolerance the squared term is weighted ×10. Parameters
    /// with no blend value are skipped.
    pub fn value(&self, ratios: &[f64]) -> f64 {
        let mut total = 0.0;
        for (p, spec) in self.specs.iter().enumerate() {
            let Some(blend) = self.matrix.blend_value(p, ratios) else {
                continue;
            };
            let scale = if spec.target != 0.0 { spec.target } else { 1.0 };
            let residual = match (spec.bounds.lower, spec.bounds.upper) {
                (Some(lower), _) if blend < lower => (lower - blend) / scale,
                (_, Some(upper)) if blend > upper => (blend - upper) / scale,
                _ => (blend - spec.target) / scale,
            };
            let sq = residual * residual;
            total += if residual.abs() > self.tolerance {
                sq * OUT_OF_TOLERANCE_WEIGHT
            } else {
                sq
            };
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::{Bounds, ParamSpec};
    use crate::model::{Material, ParameterValue};
    use std::collections::HashMap;

    fn material(id: &str, params: &[(&str, f64)]) -> Material {
        Material {
            id: id.to_string(),
            name: id.to_string(),
            available_tonnage: 0.0,
            parameters: params
                .iter()
                .map(|(n, v)| (n.to_string(), ParameterValue { value: Some(*v) }))
                .collect::<HashMap<_, _>>(),
        }
    }

    fn spec(name: &str, lower: Option<f64>, upper: Option<f64>, target: f64) -> ParamSpec {
        ParamSpec {
            name: name.to_string(),
            bounds: Bounds { lower, upper },
            target,
        }
    }

    #[test]
    fn test_in_band_residual_measured_against_target() {
        let mats = vec![material("a", &[("pH", 6.0)]), material("b", &[("pH", 9.0)])];
        let matrix = ParameterMatrix::extract(&mats, &["pH".to_string()]);
        let specs = vec![spec("pH", Some(5.5), Some(8.5), 7.0)];
        let obj = PenaltyObjective::new(&matrix, &specs, 30.0);

        // Blend at 7.5: residual 0.5/7, inside tolerance, plain square.
        let expected = (0.5_f64 / 7.0).powi(2);
        assert!((obj.value(&[0.5, 0.5]) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_band_residual_measured_against_bound() {
        let mats = vec![material("a", &[("pH", 9.0)]), material("b", &[("pH", 10.0)])];
        let matrix = ParameterMatrix::extract(&mats, &["pH".to_string()]);
        let specs = vec![spec("pH", Some(5.5), Some(8.5), 7.0)];
        let obj = PenaltyObjective::new(&matrix, &specs, 30.0);

        // Blend 9.5 > upper 8.5: residual (9.5 - 8.5) / 7, within the
        // 30% tolerance so no extra weight.
        let r: f64 = 1.0 / 7.0;
        assert!((obj.value(&[0.5, 0.5]) - r * r).abs() < 1e-12);
    }

    #[test]
    fn test_penalty_weight_kicks_in_beyond_tolerance() {
        // Target 100, no bounds. Blend 131 is 31% off (weighted),
        // blend 129 is 29% off (plain).
        let specs = vec![spec("X", None, None, 100.0)];

        let mats_hot = vec![material("a", &[("X", 131.0)]), material("b", &[("X", 131.0)])];
        let matrix_hot = ParameterMatrix::extract(&mats_hot, &["X".to_string()]);
        let hot = PenaltyObjective::new(&matrix_hot, &specs, 30.0).value(&[0.5, 0.5]);

        let mats_cool = vec![material("a", &[("X", 129.0)]), material("b", &[("X", 129.0)])];
        let matrix_cool = ParameterMatrix::extract(&mats_cool, &["X".to_string()]);
        let cool = PenaltyObjective::new(&matrix_cool, &specs, 30.0).value(&[0.5, 0.5]);

        assert!((hot - 10.0 * 0.31_f64.powi(2)).abs() < 1e-12);
        assert!((cool - 0.29_f64.powi(2)).abs() < 1e-12);
        assert!(hot > 10.0 * cool);
    }

    #[test]
    fn test_relaxed_tolerance_removes_penalty_weight() {
        let specs = vec![spec("X", None, None, 100.0)];
        let mats = vec![material("a", &[("X", 135.0)]), material("b", &[("X", 135.0)])];
        let matrix = ParameterMatrix::extract(&mats, &["X".to_string()]);
        let obj = PenaltyObjective::new(&matrix, &specs, 30.0);

        let strict = obj.value(&[0.5, 0.5]);
        let relaxed = obj.with_tolerance_percent(40.0).value(&[0.5, 0.5]);
        assert!((strict - 10.0 * relaxed).abs() < 1e-12);
    }

    #[test]
    fn test_zero_target_scales_by_one() {
        // Zero-seeking parameter without lower bound: target 0,
        // residual is the raw blend value.
        let specs = vec![spec("Lead", None, Some(450.0), 0.0)];
        let mats = vec![material("a", &[("Lead", 0.1)]), material("b", &[("Lead", 0.3)])];
        let matrix = ParameterMatrix::extract(&mats, &["Lead".to_string()]);
        let obj = PenaltyObjective::new(&matrix, &specs, 30.0);

        // Blend 0.2, |0.2| > 0.3 tolerance is false, plain square.
        assert!((obj.value(&[0.5, 0.5]) - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_missing_parameter_contributes_nothing() {
        let specs = vec![
            spec("pH", Some(5.5), Some(8.5), 7.0),
            spec("Boron", None, None, 0.0),
        ];
        let mats = vec![material("a", &[("pH", 7.0)]), material("b", &[("pH", 7.0)])];
        let matrix = ParameterMatrix::extract(
            &mats,
            &["pH".to_string(), "Boron".to_string()],
        );
        let obj = PenaltyObjective::new(&matrix, &specs, 30.0);
        assert_eq!(obj.value(&[0.5, 0.5]), 0.0);
    }
}
