// ─────────────────────────────────────────────────────────────────────
// SCPN MagPol Core — Inversion
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Regularized least-squares inversion of the polarizability model.
//!
//! Solves the damped normal equations
//!
//!   (WdGᵀ·WdG + β·I) · m = WdGᵀ·Wd·d
//!
//! where G stacks the per-source sensitivity matrices, Wd is the
//! diagonal data weighting 1/noise_floor and the regularizer is plain
//! damping toward zero. β is supplied, estimated from a random test
//! vector, or cooled geometrically until the weighted data misfit
//! reaches the target (one datum of misfit per datum).

use crate::simulation::Simulation;
use magpol_math::linalg::CholeskyFactor;
use magpol_types::config::SolveSchedule;
use magpol_types::error::{MagError, MagResult};
use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::StandardNormal;

/// Assumed per-datum measurement uncertainty: one value for every datum
/// or an explicit per-datum vector. Strictly positive everywhere.
#[derive(Debug, Clone)]
pub enum NoiseFloor {
    Uniform(f64),
    PerDatum(Array1<f64>),
}

impl NoiseFloor {
    fn validate(&self, n_data: usize) -> MagResult<()> {
        match self {
            NoiseFloor::Uniform(value) => {
                if !value.is_finite() || *value <= 0.0 {
                    return Err(MagError::ConfigError(format!(
                        "noise_floor must be larger than 0, got {value}"
                    )));
                }
            }
            NoiseFloor::PerDatum(values) => {
                if values.len() != n_data {
                    return Err(MagError::ConfigError(format!(
                        "per-datum noise floor has {} entries for {n_data} data",
                        values.len()
                    )));
                }
                if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                    return Err(MagError::ConfigError(
                        "noise_floor must be larger than 0 in every entry".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Diagonal of Wd: elementwise 1/noise_floor.
    fn weights(&self, n_data: usize) -> Array1<f64> {
        match self {
            NoiseFloor::Uniform(value) => Array1::from_elem(n_data, 1.0 / value),
            NoiseFloor::PerDatum(values) => values.mapv(|v| 1.0 / v),
        }
    }
}

pub struct Inversion {
    simulation: Simulation,
    data: Array1<f64>,
    noise_floor: NoiseFloor,
    beta: Option<f64>,
    // Derived quantities, recomputed lazily on next access.
    stacked_g: Option<Array2<f64>>,
    wd: Option<Array1<f64>>,
    weighted_g: Option<Array2<f64>>,
    misfit_hessian: Option<Array2<f64>>,
    rhs: Option<Array1<f64>>,
}

impl Inversion {
    /// Build from a simulation, observed data and a noise floor.
    ///
    /// The solve operates on the 3·ncells polarizability space, so the
    /// simulation must carry an identity-sized parametrization.
    pub fn new(
        simulation: Simulation,
        data: Array1<f64>,
        noise_floor: NoiseFloor,
        beta: Option<f64>,
    ) -> MagResult<Self> {
        if data.len() != simulation.survey().n_data() {
            return Err(MagError::ConfigError(format!(
                "observed data has {} entries, survey declares {}",
                data.len(),
                simulation.survey().n_data()
            )));
        }
        noise_floor.validate(data.len())?;
        if simulation.mapping().n_params() != 3 * simulation.n_cells() {
            return Err(MagError::ConfigError(
                "inversion requires a parametrization over the full 3 x ncells model space"
                    .to_string(),
            ));
        }
        if let Some(value) = beta {
            if !value.is_finite() || value <= 0.0 {
                return Err(MagError::ConfigError(format!(
                    "beta must be finite and > 0, got {value}"
                )));
            }
        }

        Ok(Inversion {
            simulation,
            data,
            noise_floor,
            beta,
            stacked_g: None,
            wd: None,
            weighted_g: None,
            misfit_hessian: None,
            rhs: None,
        })
    }

    pub fn data(&self) -> &Array1<f64> {
        &self.data
    }

    pub fn noise_floor(&self) -> &NoiseFloor {
        &self.noise_floor
    }

    pub fn beta(&self) -> Option<f64> {
        self.beta
    }

    /// Target weighted data misfit: one datum of misfit per datum.
    pub fn target_misfit(&self) -> f64 {
        self.data.len() as f64
    }

    /// Replace the noise floor and drop every quantity derived from it.
    /// The geometry-only stacked sensitivity matrix survives.
    pub fn set_noise_floor(&mut self, noise_floor: NoiseFloor) -> MagResult<()> {
        noise_floor.validate(self.data.len())?;
        self.wd = None;
        self.weighted_g = None;
        self.misfit_hessian = None;
        self.rhs = None;
        self.noise_floor = noise_floor;
        Ok(())
    }

    fn ensure_wd(&mut self) {
        if self.wd.is_none() {
            self.wd = Some(self.noise_floor.weights(self.data.len()));
        }
    }

    fn ensure_stacked_g(&mut self) -> MagResult<()> {
        if self.stacked_g.is_some() {
            return Ok(());
        }
        let n_data = self.data.len();
        let n_model = 3 * self.simulation.n_cells();
        let g_list = self.simulation.sensitivities()?;

        let mut stacked: Array2<f64> = Array2::zeros((n_data, n_model));
        let mut offset = 0;
        for g in g_list {
            for i in 0..g.nrows() {
                for j in 0..n_model {
                    stacked[[offset + i, j]] = g[[i, j]];
                }
            }
            offset += g.nrows();
        }
        if offset != n_data {
            return Err(MagError::Inconsistency(format!(
                "stacked {offset} sensitivity rows, survey declares {n_data}"
            )));
        }
        self.stacked_g = Some(stacked);
        Ok(())
    }

    fn ensure_weighted_g(&mut self) -> MagResult<()> {
        if self.weighted_g.is_some() {
            return Ok(());
        }
        self.ensure_wd();
        self.ensure_stacked_g()?;
        let (wd, g) = match (&self.wd, &self.stacked_g) {
            (Some(wd), Some(g)) => (wd, g),
            _ => {
                return Err(MagError::Inconsistency(
                    "weighting cache empty after assembly".to_string(),
                ))
            }
        };
        let mut weighted = g.clone();
        for (i, mut row) in weighted.outer_iter_mut().enumerate() {
            row *= wd[i];
        }
        self.weighted_g = Some(weighted);
        Ok(())
    }

    /// Weighted data-misfit Hessian WdGᵀ·WdG.
    fn ensure_misfit_hessian(&mut self) -> MagResult<()> {
        if self.misfit_hessian.is_some() {
            return Ok(());
        }
        self.ensure_weighted_g()?;
        let wdg = match &self.weighted_g {
            Some(wdg) => wdg,
            None => {
                return Err(MagError::Inconsistency(
                    "weighted sensitivity cache empty after assembly".to_string(),
                ))
            }
        };
        self.misfit_hessian = Some(wdg.t().dot(wdg));
        Ok(())
    }

    fn ensure_rhs(&mut self) -> MagResult<()> {
        if self.rhs.is_some() {
            return Ok(());
        }
        self.ensure_weighted_g()?;
        let (wd, wdg) = match (&self.wd, &self.weighted_g) {
            (Some(wd), Some(wdg)) => (wd, wdg),
            _ => {
                return Err(MagError::Inconsistency(
                    "weighting cache empty after assembly".to_string(),
                ))
            }
        };
        let weighted_data = wd * &self.data;
        self.rhs = Some(wdg.t().dot(&weighted_data));
        Ok(())
    }

    /// Estimate β from the curvature ratio of a random test model:
    /// β = factor · ‖(WdGᵀWdG)·m_test‖ / ‖m_test‖.
    pub fn estimate_beta(&mut self, beta_factor: f64) -> MagResult<f64> {
        if !beta_factor.is_finite() || beta_factor <= 0.0 {
            return Err(MagError::ConfigError(format!(
                "beta_factor must be finite and > 0, got {beta_factor}"
            )));
        }
        self.ensure_misfit_hessian()?;
        let hessian = match &self.misfit_hessian {
            Some(h) => h,
            None => {
                return Err(MagError::Inconsistency(
                    "misfit Hessian cache empty after assembly".to_string(),
                ))
            }
        };

        let n = hessian.nrows();
        let mut rng = rand::thread_rng();
        let m_test: Array1<f64> =
            Array1::from_iter((0..n).map(|_| rng.sample::<f64, _>(StandardNormal)));

        let data_curvature = hessian.dot(&m_test);
        let numerator = data_curvature.dot(&data_curvature).sqrt();
        // Identity regularizer: ‖I·m_test‖ = ‖m_test‖.
        let denominator = m_test.dot(&m_test).sqrt();
        if denominator <= 0.0 {
            return Err(MagError::LinAlg(
                "degenerate test vector in beta estimation".to_string(),
            ));
        }
        Ok(beta_factor * numerator / denominator)
    }

    /// Weighted data misfit ‖Wd(G·m − d)‖² for a candidate model.
    pub fn data_misfit(&mut self, model: &Array1<f64>) -> MagResult<f64> {
        if model.len() != 3 * self.simulation.n_cells() {
            return Err(MagError::ConfigError(format!(
                "model length {} does not match the {} model space",
                model.len(),
                3 * self.simulation.n_cells()
            )));
        }
        self.ensure_wd();
        self.ensure_stacked_g()?;
        let (wd, g) = match (&self.wd, &self.stacked_g) {
            (Some(wd), Some(g)) => (wd, g),
            _ => {
                return Err(MagError::Inconsistency(
                    "weighting cache empty after assembly".to_string(),
                ))
            }
        };
        let predicted = g.dot(model);
        let mut misfit = 0.0;
        for i in 0..predicted.len() {
            let residual = wd[i] * (predicted[i] - self.data[i]);
            misfit += residual * residual;
        }
        Ok(misfit)
    }

    /// Factorize WdGᵀWdG + β·I and apply the factor to the RHS.
    fn solve_for_model(&mut self, beta: f64) -> MagResult<Array1<f64>> {
        self.ensure_misfit_hessian()?;
        self.ensure_rhs()?;
        let (hessian, rhs) = match (&self.misfit_hessian, &self.rhs) {
            (Some(h), Some(rhs)) => (h, rhs),
            _ => {
                return Err(MagError::Inconsistency(
                    "normal-equation caches empty after assembly".to_string(),
                ))
            }
        };

        let mut system = hessian.clone();
        for i in 0..system.nrows() {
            system[[i, i]] += beta;
        }
        let factor = CholeskyFactor::factor(&system)?;
        factor.solve(rhs)
    }

    /// Solve for the model under the given schedule.
    ///
    /// β resolution order: explicit `schedule.beta`, then a
    /// `beta_factor` estimate, then the β given at construction.
    /// With `beta_cooling` set, β is divided by the cooling factor and
    /// the system re-solved until the weighted data misfit reaches the
    /// target or `max_iterations` solves have run.
    pub fn solve(&mut self, schedule: &SolveSchedule) -> MagResult<Array1<f64>> {
        schedule.validate()?;

        if let Some(beta) = schedule.beta {
            self.beta = Some(beta);
        } else if let Some(factor) = schedule.beta_factor {
            let estimate = self.estimate_beta(factor)?;
            self.beta = Some(estimate);
        }
        let mut beta = self.beta.ok_or_else(|| {
            MagError::ConfigError(
                "beta must be supplied directly, via beta_factor, or at construction".to_string(),
            )
        })?;

        let mut model = self.solve_for_model(beta)?;

        if let Some(cooling) = schedule.beta_cooling {
            let target = self.target_misfit();
            for _ in 1..schedule.max_iterations {
                if self.data_misfit(&model)? <= target {
                    break;
                }
                beta /= cooling;
                model = self.solve_for_model(beta)?;
            }
            self.beta = Some(beta);
        }

        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receiver::Receiver;
    use crate::source::{Source, UniformSource};
    use crate::survey::Survey;
    use magpol_types::component::Component;
    use ndarray::Array2;

    /// Four buried cells on a line under a 5x4 surface receiver grid,
    /// excited by a unit uniform background field along z.
    fn build_simulation() -> Simulation {
        let mut cells = Array2::zeros((4, 3));
        for i in 0..4 {
            cells[[i, 0]] = i as f64 * 0.8;
            cells[[i, 2]] = -1.5;
        }

        let mut rx_locations = Array2::zeros((20, 3));
        for ix in 0..5 {
            for iy in 0..4 {
                let i = ix * 4 + iy;
                rx_locations[[i, 0]] = -0.8 + ix as f64 * 0.8;
                rx_locations[[i, 1]] = -0.9 + iy as f64 * 0.6;
                rx_locations[[i, 2]] = 0.0;
            }
        }
        let receiver = Receiver::new(rx_locations, None, None).unwrap();
        let survey = Survey::new(vec![Source::Uniform(UniformSource::new(
            vec![receiver],
            Component::Z,
            Some(1.0),
        ))]);
        Simulation::new(cells, survey, None).unwrap()
    }

    /// Sparse true model: z polarizability on two of the four cells.
    fn true_model() -> Array1<f64> {
        let mut model = Array1::zeros(12);
        model[2] = 2.0;
        model[8] = 1.2;
        model
    }

    fn noiseless_inversion(noise_floor: NoiseFloor, beta: Option<f64>) -> Inversion {
        let mut sim = build_simulation();
        let observed = sim.dpred(&true_model()).unwrap();
        Inversion::new(sim, observed, noise_floor, beta).unwrap()
    }

    #[test]
    fn test_roundtrip_recovers_sparse_model() {
        let mut inversion = noiseless_inversion(NoiseFloor::Uniform(1.0), None);
        let schedule = SolveSchedule {
            beta_factor: Some(1e-12),
            ..SolveSchedule::default()
        };
        let recovered = inversion.solve(&schedule).unwrap();
        let truth = true_model();

        let mut err = 0.0;
        let mut norm = 0.0;
        for i in 0..truth.len() {
            err += (recovered[i] - truth[i]).powi(2);
            norm += truth[i].powi(2);
        }
        let relative = (err / norm).sqrt();
        assert!(
            relative < 1e-2,
            "Round-trip relative model error too large: {relative}"
        );

        // The recovered model must also reproduce the data.
        let misfit = inversion.data_misfit(&recovered).unwrap();
        assert!(misfit < 1e-6, "Residual misfit too large: {misfit}");
    }

    #[test]
    fn test_per_datum_noise_floor_matches_uniform() {
        let mut uniform = noiseless_inversion(NoiseFloor::Uniform(0.01), None);
        let n_data = uniform.data().len();
        let mut per_datum = noiseless_inversion(
            NoiseFloor::PerDatum(Array1::from_elem(n_data, 0.01)),
            None,
        );

        let schedule = SolveSchedule {
            beta: Some(1e-4),
            ..SolveSchedule::default()
        };
        let m_uniform = uniform.solve(&schedule).unwrap();
        let m_per_datum = per_datum.solve(&schedule).unwrap();
        for i in 0..m_uniform.len() {
            assert!((m_uniform[i] - m_per_datum[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_beta_cooling_reaches_target_misfit() {
        let mut inversion = noiseless_inversion(NoiseFloor::Uniform(0.001), None);
        let initial_beta = inversion.estimate_beta(1e3).unwrap();
        let schedule = SolveSchedule {
            beta: Some(initial_beta),
            beta_cooling: Some(10.0),
            max_iterations: 30,
            ..SolveSchedule::default()
        };

        let model = inversion.solve(&schedule).unwrap();
        let final_misfit = inversion.data_misfit(&model).unwrap();
        let final_beta = inversion.beta().unwrap();

        assert!(
            final_misfit <= inversion.target_misfit(),
            "Cooling stopped above target: misfit {final_misfit}, target {}",
            inversion.target_misfit()
        );
        assert!(
            final_beta < initial_beta,
            "Cooling never reduced beta: {final_beta} vs {initial_beta}"
        );
    }

    #[test]
    fn test_noise_floor_change_invalidates_weighting() {
        let mut inversion = noiseless_inversion(NoiseFloor::Uniform(1.0), Some(1.0));
        let schedule = SolveSchedule::default();
        let model_before = inversion.solve(&schedule).unwrap();
        let misfit_before = inversion.data_misfit(&model_before).unwrap();

        inversion.set_noise_floor(NoiseFloor::Uniform(0.1)).unwrap();
        let misfit_after = inversion.data_misfit(&model_before).unwrap();
        // Wd scales by 10, the squared misfit by 100.
        assert!(
            (misfit_after - 100.0 * misfit_before).abs() <= 1e-10 * misfit_after.max(1e-300),
            "Misfit did not rescale with the new weighting: {misfit_before} -> {misfit_after}"
        );

        let model_after = inversion.solve(&schedule).unwrap();
        let mut diff = 0.0;
        let mut norm = 0.0;
        for i in 0..model_before.len() {
            diff += (model_after[i] - model_before[i]).powi(2);
            norm += model_before[i].powi(2);
        }
        assert!(
            (diff / norm.max(1e-300)).sqrt() > 1e-3,
            "New weighting should change the damped solution"
        );
    }

    #[test]
    fn test_estimate_beta_is_positive() {
        let mut inversion = noiseless_inversion(NoiseFloor::Uniform(0.05), None);
        let beta = inversion.estimate_beta(2.0).unwrap();
        assert!(beta.is_finite() && beta > 0.0);
        assert!(inversion.estimate_beta(0.0).is_err());
        assert!(inversion.estimate_beta(-1.0).is_err());
    }

    #[test]
    fn test_solve_without_any_beta_fails() {
        let mut inversion = noiseless_inversion(NoiseFloor::Uniform(1.0), None);
        let schedule = SolveSchedule::default();
        assert!(inversion.solve(&schedule).is_err());
    }

    #[test]
    fn test_rejects_invalid_construction() {
        let mut sim = build_simulation();
        let n_data = sim.survey().n_data();
        let observed = sim.dpred(&true_model()).unwrap();

        // Wrong data length.
        let short = Array1::zeros(n_data - 1);
        assert!(
            Inversion::new(build_simulation(), short, NoiseFloor::Uniform(1.0), None).is_err()
        );

        // Non-positive noise floors.
        assert!(Inversion::new(
            build_simulation(),
            observed.clone(),
            NoiseFloor::Uniform(0.0),
            None
        )
        .is_err());
        assert!(Inversion::new(
            build_simulation(),
            observed.clone(),
            NoiseFloor::Uniform(-0.1),
            None
        )
        .is_err());
        let mut per_datum = Array1::from_elem(n_data, 0.01);
        per_datum[3] = 0.0;
        assert!(Inversion::new(
            build_simulation(),
            observed.clone(),
            NoiseFloor::PerDatum(per_datum),
            None
        )
        .is_err());

        // Non-positive beta.
        assert!(Inversion::new(
            build_simulation(),
            observed,
            NoiseFloor::Uniform(1.0),
            Some(-2.0)
        )
        .is_err());
    }

    #[test]
    fn test_set_noise_floor_rejects_invalid_values() {
        let mut inversion = noiseless_inversion(NoiseFloor::Uniform(1.0), Some(1.0));
        assert!(inversion.set_noise_floor(NoiseFloor::Uniform(0.0)).is_err());
        assert!(inversion
            .set_noise_floor(NoiseFloor::Uniform(f64::NAN))
            .is_err());
        // The inversion must still be usable after a rejected update.
        assert!(inversion.solve(&SolveSchedule::default()).is_ok());
    }
}
