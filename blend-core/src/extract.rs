//! Parameter extraction and blend-parameter computation.
//!
//! Material records are heterogeneous maps; the optimizer needs
//! aligned numeric vectors. Missing readings are carried as NAN and
//! excluded (with subset re-normalization) when blending.

use crate::model::Material;

/// Per-parameter value rows, index-aligned with the material list.
///
/// The material order of the input is the index contract used by
/// every downstream ratio vector.
#[derive(Debug, Clone)]
pub struct ParameterMatrix {
    rows: Vec<Vec<f64>>,
}

impl ParameterMatrix {
    /// Extract one row per selected parameter, one value per material,
    /// with `f64::NAN` marking missing readings.
    pub fn extract(materials: &[Material], selected: &[String]) -> Self {
        let rows = selected
            .iter()
            .map(|name| {
                materials
                    .iter()
                    .map(|m| {
                        m.parameters
                            .get(name)
                            .and_then(|p| p.value)
                            .unwrap_or(f64::NAN)
                    })
                    .collect()
            })
            .collect();
        Self { rows }
    }

    /// Number of parameter rows.
    pub fn num_params(&self) -> usize {
        self.rows.len()
    }

    /// Values for parameter row `p` (NAN = missing).
    pub fn row(&self, p: usize) -> &[f64] {
        &self.rows[p]
    }

    /// Weighted blend value for parameter `p` under `ratios`.
    ///
    /// Materials without a reading are excluded and the remaining
    /// ratios re-normalized over the subset. Returns None when no
    /// material carries a value or the subset has no ratio mass.
    pub fn blend_value(&self, p: usize, ratios: &[f64]) -> Option<f64> {
        let mut mass = 0.0;
        let mut acc = 0.0;
        for (&v, &r) in self.rows[p].iter().zip(ratios) {
            if v.is_nan() {
                continue;
            }
            mass += r;
            acc += r * v;
        }
        (mass > 0.0).then(|| acc / mass)
    }

    /// Blend values for all parameters at once.
    pub fn blend_values(&self, ratios: &[f64]) -> Vec<Option<f64>> {
        (0..self.rows.len())
            .map(|p| self.blend_value(p, ratios))
            .collect()
    }
}
