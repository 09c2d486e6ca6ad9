// ─────────────────────────────────────────────────────────────────────
// SCPN MagPol Core — Linear Algebra
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Dense direct solver for the damped normal equations.
//!
//! The inversion system matrix WdGᵀWdG + βI is symmetric positive
//! definite for β > 0, so a Cholesky factorization is the exact direct
//! solve. A non-positive pivot surfaces as a `LinAlg` error; the caller
//! never gets a silently regularized answer.

use magpol_types::error::{MagError, MagResult};
use ndarray::{Array1, Array2};

/// Relative tolerance for the symmetry pre-check.
const SYMMETRY_RTOL: f64 = 1e-10;

/// Lower-triangular Cholesky factor L of a symmetric positive-definite
/// matrix A = L·Lᵀ. Factor once, apply to any number of right-hand sides.
#[derive(Debug, Clone)]
pub struct CholeskyFactor {
    l: Array2<f64>,
}

impl CholeskyFactor {
    /// Factorize a symmetric positive-definite matrix.
    ///
    /// Errors on a non-square or non-symmetric input, and on a
    /// non-positive pivot (matrix not positive definite).
    pub fn factor(a: &Array2<f64>) -> MagResult<Self> {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(MagError::LinAlg(format!(
                "Cholesky requires a square matrix, got ({}, {})",
                a.nrows(),
                a.ncols()
            )));
        }
        let scale = a.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        if !scale.is_finite() {
            return Err(MagError::LinAlg(
                "Cholesky input contains non-finite entries".to_string(),
            ));
        }
        let tol = SYMMETRY_RTOL * (1.0 + scale);
        for i in 0..n {
            for j in (i + 1)..n {
                if (a[[i, j]] - a[[j, i]]).abs() > tol {
                    return Err(MagError::LinAlg(format!(
                        "Cholesky input is not symmetric at ({i}, {j})"
                    )));
                }
            }
        }

        let mut l: Array2<f64> = Array2::zeros((n, n));
        for j in 0..n {
            let mut diag = a[[j, j]];
            for k in 0..j {
                diag -= l[[j, k]] * l[[j, k]];
            }
            if !diag.is_finite() || diag <= 0.0 {
                return Err(MagError::LinAlg(format!(
                    "matrix is not positive definite (pivot {j}: {diag})"
                )));
            }
            let ljj = diag.sqrt();
            l[[j, j]] = ljj;
            for i in (j + 1)..n {
                let mut sum = a[[i, j]];
                for k in 0..j {
                    sum -= l[[i, k]] * l[[j, k]];
                }
                l[[i, j]] = sum / ljj;
            }
        }

        Ok(CholeskyFactor { l })
    }

    /// System dimension.
    pub fn n(&self) -> usize {
        self.l.nrows()
    }

    /// Solve A·x = rhs by forward then backward substitution.
    pub fn solve(&self, rhs: &Array1<f64>) -> MagResult<Array1<f64>> {
        let n = self.n();
        if rhs.len() != n {
            return Err(MagError::LinAlg(format!(
                "right-hand side length {} does not match system dimension {n}",
                rhs.len()
            )));
        }

        // L·y = rhs
        let mut y = Array1::zeros(n);
        for i in 0..n {
            let mut sum = rhs[i];
            for k in 0..i {
                sum -= self.l[[i, k]] * y[k];
            }
            y[i] = sum / self.l[[i, i]];
        }

        // Lᵀ·x = y
        let mut x = Array1::zeros(n);
        for i in (0..n).rev() {
            let mut sum = y[i];
            for k in (i + 1)..n {
                sum -= self.l[[k, i]] * x[k];
            }
            x[i] = sum / self.l[[i, i]];
        }

        Ok(x)
    }
}
