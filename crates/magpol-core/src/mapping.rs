//! Model parametrizations mapping inversion parameters to physical
//! polarizabilities.

use magpol_types::error::{MagError, MagResult};
use ndarray::Array1;

/// A (possibly nonlinear) parametrization of the polarizability model.
///
/// `apply` maps inversion parameters to per-(cell, axis) polarizability;
/// `apply_transpose` is the transpose of its linearization, used by the
/// adjoint operator.
pub trait Mapping {
    /// Number of inversion parameters.
    fn n_params(&self) -> usize;

    /// Length of the physical polarizability vector (3 × ncells).
    fn n_outputs(&self) -> usize;

    fn apply(&self, model: &Array1<f64>) -> MagResult<Array1<f64>>;

    fn apply_transpose(&self, gradient: &Array1<f64>) -> MagResult<Array1<f64>>;
}

/// Identity parametrization: the model is the polarizability.
#[derive(Debug, Clone)]
pub struct IdentityMap {
    n_params: usize,
}

impl IdentityMap {
    pub fn new(n_params: usize) -> Self {
        IdentityMap { n_params }
    }
}

impl Mapping for IdentityMap {
    fn n_params(&self) -> usize {
        self.n_params
    }

    fn n_outputs(&self) -> usize {
        self.n_params
    }

    fn apply(&self, model: &Array1<f64>) -> MagResult<Array1<f64>> {
        if model.len() != self.n_params {
            return Err(MagError::ConfigError(format!(
                "identity map expects {} parameters, got {}",
                self.n_params,
                model.len()
            )));
        }
        Ok(model.clone())
    }

    fn apply_transpose(&self, gradient: &Array1<f64>) -> MagResult<Array1<f64>> {
        if gradient.len() != self.n_params {
            return Err(MagError::ConfigError(format!(
                "identity map transpose expects {} values, got {}",
                self.n_params,
                gradient.len()
            )));
        }
        Ok(gradient.clone())
    }
}

/// Diagonal linear parametrization: polarizability = scale ∘ model.
#[derive(Debug, Clone)]
pub struct ScalingMap {
    scale: Array1<f64>,
}

impl ScalingMap {
    pub fn new(scale: Array1<f64>) -> MagResult<Self> {
        if scale.iter().any(|v| !v.is_finite()) {
            return Err(MagError::ConfigError(
                "scaling map entries must be finite".to_string(),
            ));
        }
        Ok(ScalingMap { scale })
    }
}

impl Mapping for ScalingMap {
    fn n_params(&self) -> usize {
        self.scale.len()
    }

    fn n_outputs(&self) -> usize {
        self.scale.len()
    }

    fn apply(&self, model: &Array1<f64>) -> MagResult<Array1<f64>> {
        if model.len() != self.scale.len() {
            return Err(MagError::ConfigError(format!(
                "scaling map expects {} parameters, got {}",
                self.scale.len(),
                model.len()
            )));
        }
        Ok(model * &self.scale)
    }

    fn apply_transpose(&self, gradient: &Array1<f64>) -> MagResult<Array1<f64>> {
        // Diagonal: the transpose is the same elementwise scaling.
        self.apply(gradient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_identity_passes_through() {
        let map = IdentityMap::new(3);
        let m = array![1.0, -2.0, 0.5];
        assert_eq!(map.apply(&m).unwrap(), m);
        assert_eq!(map.apply_transpose(&m).unwrap(), m);
        assert_eq!(map.n_params(), 3);
        assert_eq!(map.n_outputs(), 3);
    }

    #[test]
    fn test_identity_rejects_wrong_length() {
        let map = IdentityMap::new(4);
        assert!(map.apply(&array![1.0]).is_err());
        assert!(map.apply_transpose(&array![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_scaling_map_applies_elementwise() {
        let map = ScalingMap::new(array![2.0, 0.0, -1.0]).unwrap();
        let m = array![1.0, 5.0, 3.0];
        assert_eq!(map.apply(&m).unwrap(), array![2.0, 0.0, -3.0]);
        assert_eq!(map.apply_transpose(&m).unwrap(), array![2.0, 0.0, -3.0]);
    }

    #[test]
    fn test_scaling_map_rejects_non_finite() {
        assert!(ScalingMap::new(array![1.0, f64::NAN]).is_err());
    }
}
