// ─────────────────────────────────────────────────────────────────────
// SCPN MagPol Core — Geometry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! 3-D location-array validation and flattening helpers.
//!
//! Every ordered point set in the system (cell centers, receiver
//! positions, loop nodes, evaluation points) is an (npoints, 3) array,
//! fixed at construction. Shape violations are rejected immediately.

use crate::error::{MagError, MagResult};
use ndarray::{Array1, Array2};

/// Validate an (npoints, 3) location array.
///
/// `name` labels the offending array in the error message.
pub fn validate_locations(name: &str, locations: &Array2<f64>) -> MagResult<()> {
    if locations.ncols() != 3 {
        return Err(MagError::ConfigError(format!(
            "{name} must have shape (npoints, 3), but the input shape is ({}, {})",
            locations.nrows(),
            locations.ncols()
        )));
    }
    if locations.iter().any(|v| !v.is_finite()) {
        return Err(MagError::ConfigError(format!(
            "{name} must contain only finite coordinates"
        )));
    }
    Ok(())
}

/// Flatten an (n, 3) vector field to length 3n in location-major order:
/// [x0, y0, z0, x1, y1, z1, ...].
pub fn flatten_vectors(field: &Array2<f64>) -> Array1<f64> {
    let n = field.nrows();
    let mut flat = Array1::zeros(3 * n);
    for i in 0..n {
        for k in 0..3 {
            flat[3 * i + k] = field[[i, k]];
        }
    }
    flat
}
