// ─────────────────────────────────────────────────────────────────────
// SCPN MagPol Core — Line Current
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Free-space magnetic field of a polygonal line current.
//!
//! Closed-form Biot-Savart sum over straight segments. For a segment
//! from p0 to p1 with unit direction l̂ and an observation point at
//! perpendicular distance d:
//!
//!   H = I/(4πd) · (s/|r0| + (L-s)/|r1|) · (l̂ × d̂)
//!
//! where r0, r1 run from the endpoints to the observation point and
//! s = r0·l̂ is the along-segment projection. The field is magnetic
//! field strength H (A/m); multiply by μ₀ for flux density.

use magpol_types::constants::{INV_FOUR_PI, MU0_SI};
use magpol_types::error::{MagError, MagResult};
use magpol_types::geometry::validate_locations;
use ndarray::Array2;

/// Segments shorter than this are skipped (repeated nodes).
const SEGMENT_MIN_LENGTH: f64 = 1e-12;

/// Squared perpendicular distance below which an observation point is
/// treated as on the segment axis; the axial field of a straight
/// element is zero there.
const AXIAL_DISTANCE_SQ_MIN: f64 = 1e-24;

/// Node-coincidence tolerance for the closed-loop check.
const CLOSURE_TOL: f64 = 1e-12;

/// A polygonal loop of line current in free space.
#[derive(Debug, Clone)]
pub struct LineCurrent {
    nodes: Array2<f64>,
    current: f64,
}

impl LineCurrent {
    /// Build from an ordered (nnodes, 3) polygon and a scalar current.
    ///
    /// An unclosed polygon (first node != last node) is a physics
    /// caveat, not an error: the evaluation proceeds with a warning.
    pub fn new(nodes: Array2<f64>, current: f64) -> MagResult<Self> {
        validate_locations("line-current nodes", &nodes)?;
        if nodes.nrows() < 2 {
            return Err(MagError::ConfigError(format!(
                "line-current polygon needs at least 2 nodes, got {}",
                nodes.nrows()
            )));
        }
        if !current.is_finite() {
            return Err(MagError::ConfigError(format!(
                "line-current current must be finite, got {current}"
            )));
        }
        if !Self::is_closed(&nodes) {
            log::warn!("line-current polygon is not a closed loop (first node != last node)");
        }
        Ok(LineCurrent { nodes, current })
    }

    fn is_closed(nodes: &Array2<f64>) -> bool {
        let last = nodes.nrows() - 1;
        (0..3).all(|k| (nodes[[0, k]] - nodes[[last, k]]).abs() <= CLOSURE_TOL)
    }

    pub fn nodes(&self) -> &Array2<f64> {
        &self.nodes
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    /// Magnetic field strength H (A/m) at each observation point.
    /// Returns an (npoints, 3) array.
    pub fn magnetic_field(&self, points: &Array2<f64>) -> MagResult<Array2<f64>> {
        validate_locations("evaluation points", points)?;

        let n_points = points.nrows();
        let n_segments = self.nodes.nrows() - 1;
        let mut h: Array2<f64> = Array2::zeros((n_points, 3));

        for i in 0..n_points {
            let p = [points[[i, 0]], points[[i, 1]], points[[i, 2]]];
            for seg in 0..n_segments {
                let p0 = [
                    self.nodes[[seg, 0]],
                    self.nodes[[seg, 1]],
                    self.nodes[[seg, 2]],
                ];
                let p1 = [
                    self.nodes[[seg + 1, 0]],
                    self.nodes[[seg + 1, 1]],
                    self.nodes[[seg + 1, 2]],
                ];

                let l = [p1[0] - p0[0], p1[1] - p0[1], p1[2] - p0[2]];
                let len = (l[0] * l[0] + l[1] * l[1] + l[2] * l[2]).sqrt();
                if len < SEGMENT_MIN_LENGTH {
                    continue;
                }
                let l_hat = [l[0] / len, l[1] / len, l[2] / len];

                let r0 = [p[0] - p0[0], p[1] - p0[1], p[2] - p0[2]];
                let s = r0[0] * l_hat[0] + r0[1] * l_hat[1] + r0[2] * l_hat[2];
                let d_vec = [
                    r0[0] - s * l_hat[0],
                    r0[1] - s * l_hat[1],
                    r0[2] - s * l_hat[2],
                ];
                let d_sq = d_vec[0] * d_vec[0] + d_vec[1] * d_vec[1] + d_vec[2] * d_vec[2];
                if d_sq < AXIAL_DISTANCE_SQ_MIN {
                    continue;
                }

                let r1 = [p[0] - p1[0], p[1] - p1[1], p[2] - p1[2]];
                let r0_norm = (r0[0] * r0[0] + r0[1] * r0[1] + r0[2] * r0[2]).sqrt();
                let r1_norm = (r1[0] * r1[0] + r1[1] * r1[1] + r1[2] * r1[2]).sqrt();
                let geom = s / r0_norm + (len - s) / r1_norm;

                let cross = [
                    l_hat[1] * d_vec[2] - l_hat[2] * d_vec[1],
                    l_hat[2] * d_vec[0] - l_hat[0] * d_vec[2],
                    l_hat[0] * d_vec[1] - l_hat[1] * d_vec[0],
                ];

                let scale = self.current * INV_FOUR_PI * geom / d_sq;
                h[[i, 0]] += scale * cross[0];
                h[[i, 1]] += scale * cross[1];
                h[[i, 2]] += scale * cross[2];
            }
        }

        Ok(h)
    }

    /// Magnetic flux density B = μ₀·H (T) at each observation point.
    pub fn flux_density(&self, points: &Array2<f64>) -> MagResult<Array2<f64>> {
        Ok(self.magnetic_field(points)? * MU0_SI)
    }
}
