//! Property tests for the geometric invariants the optimizer relies
//! on: projection feasibility, normalization idempotence and the
//! weighted-average identity of blend parameters.

use std::collections::HashMap;

use proptest::prelude::*;

use blend_core::constraints::{normalize, FeasibleRegion};
use blend_core::extract::ParameterMatrix;
use blend_core::{Material, ParameterValue};

fn materials_with_values(values: &[f64]) -> Vec<Material> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| Material {
            id: format!("m{i}"),
            name: format!("m{i}"),
            available_tonnage: 0.0,
            parameters: HashMap::from([(
                "X".to_string(),
                ParameterValue { value: Some(v) },
            )]),
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_projection_lands_on_the_simplex(
        y in prop::collection::vec(-2.0f64..2.0, 2..7)
    ) {
        let region = FeasibleRegion::unit(y.len());
        let x = region.project(&y);
        let sum: f64 = x.iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-7, "sum = {sum}");
        prop_assert!(x.iter().all(|&v| (-1e-9..=1.0 + 1e-9).contains(&v)));
    }

    #[test]
    fn prop_projection_is_idempotent(
        y in prop::collection::vec(-2.0f64..2.0, 2..7)
    ) {
        let region = FeasibleRegion::unit(y.len());
        let once = region.project(&y);
        let twice = region.project(&once);
        for (a, b) in once.iter().zip(&twice) {
            prop_assert!((a - b).abs() < 1e-7);
        }
    }

    #[test]
    fn prop_normalize_is_idempotent(
        raw in prop::collection::vec(0.01f64..10.0, 2..7)
    ) {
        let mut x = raw.clone();
        normalize(&mut x);
        let mut y = x.clone();
        normalize(&mut y);
        for (a, b) in x.iter().zip(&y) {
            prop_assert!((a - b).abs() < 1e-12);
        }
        prop_assert!((x.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn prop_blend_equals_weighted_average_when_fully_populated(
        pairs in prop::collection::vec((0.0f64..100.0, 0.01f64..1.0), 2..7)
    ) {
        let values: Vec<f64> = pairs.iter().map(|(v, _)| *v).collect();
        let mut ratios: Vec<f64> = pairs.iter().map(|(_, r)| *r).collect();
        normalize(&mut ratios);

        let mats = materials_with_values(&values);
        let matrix = ParameterMatrix::extract(&mats, &["X".to_string()]);
        let blend = matrix.blend_value(0, &ratios).unwrap();

        let expected: f64 = values.iter().zip(&ratios).map(|(v, r)| v * r).sum();
        prop_assert!((blend - expected).abs() < 1e-9);
    }

    #[test]
    fn prop_blend_invariant_under_ratio_rescaling(
        pairs in prop::collection::vec((0.0f64..100.0, 0.01f64..1.0), 2..7),
        scale in 0.1f64..10.0
    ) {
        let values: Vec<f64> = pairs.iter().map(|(v, _)| *v).collect();
        let ratios: Vec<f64> = pairs.iter().map(|(_, r)| *r).collect();
        let scaled: Vec<f64> = ratios.iter().map(|r| r * scale).collect();

        let mats = materials_with_values(&values);
        let matrix = ParameterMatrix::extract(&mats, &["X".to_string()]);

        let a = matrix.blend_value(0, &ratios).unwrap();
        let b = matrix.blend_value(0, &scaled).unwrap();
        prop_assert!((a - b).abs() < 1e-9, "a = {a}, b = {b}");
    }
}
