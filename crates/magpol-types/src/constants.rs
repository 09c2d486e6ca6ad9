// ─────────────────────────────────────────────────────────────────────
// SCPN MagPol Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Vacuum permeability (H/m) - real SI value.
/// Field evaluation works in H (A/m); multiply by MU0_SI for flux density.
pub const MU0_SI: f64 = 1.2566370614e-6;

/// 1/(4π) prefactor shared by the dipole Green's function and the
/// Biot-Savart line integral.
pub const INV_FOUR_PI: f64 = 1.0 / (4.0 * std::f64::consts::PI);
