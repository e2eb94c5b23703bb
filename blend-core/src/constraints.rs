//! Feasible region for ratio vectors: the unit simplex intersected
//! with per-material percentage boxes.
//!
//! Every constraint in this problem class is either the sum-to-one
//! equality or a per-coordinate bound, so the region admits an exact
//! Euclidean projection: clamp a shifted copy of the point into the
//! box and bisect on the shift until the coordinates sum to one.

use std::collections::HashMap;

use crate::model::{Material, MaterialConstraint};

/// Slack allowed on the sum-to-one equality.
const SUM_TOL: f64 = 1e-9;

/// Bisection iterations for the projection shift. 100 halvings of the
/// initial bracket put the shift far below f64 resolution.
const PROJECT_ITERS: usize = 100;

/// Bounded-simplex region `{x : Σx = 1, lo ≤ x ≤ hi}`.
#[derive(Debug, Clone)]
pub struct FeasibleRegion {
    lo: Vec<f64>,
    hi: Vec<f64>,
}

/// A built region together with the constraint ids that matched no
/// material. Unresolved ids do not tighten the region but are
/// surfaced as warnings instead of dropping silently.
#[derive(Debug, Clone)]
pub struct RegionBuild {
    pub region: FeasibleRegion,
    pub unresolved_ids: Vec<String>,
}

impl FeasibleRegion {
    /// The unconstrained region: [0, 1] per ratio plus the simplex.
    pub fn unit(n: usize) -> Self {
        Self {
            lo: vec![0.0; n],
            hi: vec![1.0; n],
        }
    }

    /// Build the region from configured material constraints,
    /// resolving material ids through an index built once per call.
    pub fn from_config(
        materials: &[Material],
        constraints: &[MaterialConstraint],
    ) -> RegionBuild {
        let index: HashMap<&str, usize> = materials
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id.as_str(), i))
            .collect();

        let mut region = Self::unit(materials.len());
        let mut unresolved_ids = Vec::new();
        for c in constraints {
            match index.get(c.material_id.as_str()) {
                Some(&i) => {
                    if let Some(min) = c.min_percentage {
                        region.lo[i] = region.lo[i].max(min / 100.0);
                    }
                    if let Some(max) = c.max_percentage {
                        region.hi[i] = region.hi[i].min(max / 100.0);
                    }
                }
                None => unresolved_ids.push(c.material_id.clone()),
            }
        }
        RegionBuild {
            region,
            unresolved_ids,
        }
    }

    /// Ratio vector length.
    pub fn len(&self) -> usize {
        self.lo.len()
    }

    /// True for a zero-material region (never produced by the public
    /// entry point, which validates material count first).
    pub fn is_empty(&self) -> bool {
        self.lo.is_empty()
    }

    /// Whether the box can intersect the simplex at all.
    pub fn is_consistent(&self) -> bool {
        let lo_sum: f64 = self.lo.iter().sum();
        let hi_sum: f64 = self.hi.iter().sum();
        lo_sum <= 1.0 + SUM_TOL
            && hi_sum >= 1.0 - SUM_TOL
            && self
                .lo
                .iter()
                .zip(&self.hi)
                .all(|(l, h)| *l <= *h + SUM_TOL)
    }

    /// Clamp a point into the box (ignores the simplex equality).
    pub fn clamp(&self, x: &mut [f64]) {
        for ((v, &l), &h) in x.iter_mut().zip(&self.lo).zip(&self.hi) {
            *v = v.clamp(l, h.max(l));
        }
    }

    /// Exact Euclidean projection onto the region.
    ///
    /// `g(t) = Σ clamp(yᵢ - t, loᵢ, hiᵢ)` is continuous and
    /// nonincreasing in the shift `t`; bisection finds the shift at
    /// which the clamped point sums to one. Falls back to a box clamp
    /// when the region is inconsistent.
    pub fn project(&self, y: &[f64]) -> Vec<f64> {
        if !self.is_consistent() {
            let mut x = y.to_vec();
            self.clamp(&mut x);
            return x;
        }

        let shifted_sum = |t: f64| -> f64 {
            y.iter()
                .zip(&self.lo)
                .zip(&self.hi)
                .map(|((&v, &l), &h)| (v - t).clamp(l, h))
                .sum()
        };

        // Bracket: all coordinates at hi on the left, all at lo on
        // the right.
        let mut t_lo = y
            .iter()
            .zip(&self.hi)
            .map(|(&v, &h)| v - h)
            .fold(f64::INFINITY, f64::min);
        let mut t_hi = y
            .iter()
            .zip(&self.lo)
            .map(|(&v, &l)| v - l)
            .fold(f64::NEG_INFINITY, f64::max);

        for _ in 0..PROJECT_ITERS {
            let mid = 0.5 * (t_lo + t_hi);
            if shifted_sum(mid) > 1.0 {
                t_lo = mid;
            } else {
                t_hi = mid;
            }
        }

        let t = 0.5 * (t_lo + t_hi);
        y.iter()
            .zip(&self.lo)
            .zip(&self.hi)
            .map(|((&v, &l), &h)| (v - t).clamp(l, h))
            .collect()
    }

    /// Whether a point lies in the region (up to the sum slack).
    pub fn contains(&self, x: &[f64]) -> bool {
        let sum: f64 = x.iter().sum();
        (sum - 1.0).abs() <= 1e-6
            && x.iter()
                .zip(&self.lo)
                .zip(&self.hi)
                .all(|((&v, &l), &h)| v >= l - 1e-9 && v <= h + 1e-9)
    }
}

/// Normalize a ratio vector by its own sum. Idempotent on vectors
/// already summing to one; leaves an all-zero vector untouched.
pub fn normalize(x: &mut [f64]) {
    let sum: f64 = x.iter().sum();
    if sum > f64::EPSILON {
        for v in x.iter_mut() {
            *v /= sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Material;
    use std::collections::HashMap;

    fn materials(ids: &[&str]) -> Vec<Material> {
        ids.iter()
            .map(|id| Material {
                id: id.to_string(),
                name: id.to_string(),
                available_tonnage: 0.0,
                parameters: HashMap::new(),
            })
            .collect()
    }

    fn constraint(id: &str, min: Option<f64>, max: Option<f64>) -> MaterialConstraint {
        MaterialConstraint {
            material_id: id.to_string(),
            min_percentage: min,
            max_percentage: max,
        }
    }

    #[test]
    fn test_project_fixes_point_already_in_region() {
        let region = FeasibleRegion::unit(2);
        let x = region.project(&[0.5, 0.5]);
        assert!((x[0] - 0.5).abs() < 1e-9);
        assert!((x[1] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_project_clamps_to_vertex() {
        let region = FeasibleRegion::unit(2);
        let x = region.project(&[2.0, 0.0]);
        assert!((x[0] - 1.0).abs() < 1e-9);
        assert!(x[1].abs() < 1e-9);
    }

    #[test]
    fn test_project_respects_material_box() {
        let mats = materials(&["a", "b"]);
        let build = FeasibleRegion::from_config(
            &mats,
            &[constraint("a", Some(80.0), None)],
        );
        let x = build.region.project(&[0.5, 0.5]);
        assert!(x[0] >= 0.8 - 1e-9);
        assert!((x.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unresolved_constraint_ids_are_collected() {
        let mats = materials(&["a", "b"]);
        let build = FeasibleRegion::from_config(
            &mats,
            &[
                constraint("a", Some(10.0), None),
                constraint("ghost", None, Some(50.0)),
            ],
        );
        assert_eq!(build.unresolved_ids, vec!["ghost".to_string()]);
        // The resolvable constraint still applies.
        assert!(build.region.lo[0] >= 0.1 - 1e-12);
    }

    #[test]
    fn test_inconsistent_region_detected() {
        let mats = materials(&["a", "b"]);
        let build = FeasibleRegion::from_config(
            &mats,
            &[
                constraint("a", Some(80.0), None),
                constraint("b", Some(80.0), None),
            ],
        );
        assert!(!build.region.is_consistent());
    }

    #[test]
    fn test_normalize_is_idempotent_on_simplex() {
        let mut x = vec![0.25, 0.75];
        normalize(&mut x);
        assert_eq!(x, vec![0.25, 0.75]);

        let mut y = vec![2.0, 6.0];
        normalize(&mut y);
        assert!((y[0] - 0.25).abs() < 1e-12);
        assert!((y[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_leaves_zero_vector() {
        let mut x = vec![0.0, 0.0];
        normalize(&mut x);
        assert_eq!(x, vec![0.0, 0.0]);
    }
}
