// ─────────────────────────────────────────────────────────────────────
// SCPN MagPol Core — Forward Simulation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Forward operator for the polarizability model.
//!
//! Per source, a dense sensitivity matrix maps per-cell magnetization
//! to observed data through the magnetic-dipole Green's function
//!
//!   G_cell,rx = 1/(4π) · (1/r³) · (3·r̂⊗r̂ − I₃)
//!
//! with r running from the cell to the receiver location. The matrix is
//! pure geometry: it is built once per simulation and reused across
//! models. Magnetization is the source excitation field at the cells
//! times the per-cell polarizability, so the forward map is linear in
//! the model and `jvec`/`jtvec` are exact.

use crate::mapping::{IdentityMap, Mapping};
use crate::source::Source;
use crate::survey::Survey;
use magpol_types::constants::INV_FOUR_PI;
use magpol_types::error::{MagError, MagResult};
use magpol_types::geometry::validate_locations;
use ndarray::{s, Array1, Array2};

/// Cell-to-receiver separations below this are unphysical for a point
/// dipole model.
const MIN_SEPARATION: f64 = 1e-9;

pub struct Simulation {
    cell_locations: Array2<f64>,
    survey: Survey,
    mapping: Box<dyn Mapping>,
    sensitivities: Option<Vec<Array2<f64>>>,
}

impl Simulation {
    /// Build from (ncells, 3) cell centers, a survey, and an optional
    /// model parametrization (default: identity over 3·ncells).
    pub fn new(
        cell_locations: Array2<f64>,
        survey: Survey,
        mapping: Option<Box<dyn Mapping>>,
    ) -> MagResult<Self> {
        validate_locations("cell locations", &cell_locations)?;
        if cell_locations.nrows() == 0 {
            return Err(MagError::ConfigError(
                "simulation needs at least one cell".to_string(),
            ));
        }

        let n_outputs = 3 * cell_locations.nrows();
        let mapping = mapping.unwrap_or_else(|| Box::new(IdentityMap::new(n_outputs)));
        if mapping.n_outputs() != n_outputs {
            return Err(MagError::ConfigError(format!(
                "mapping produces {} polarizabilities, but 3 x ncells = {n_outputs} are required",
                mapping.n_outputs()
            )));
        }

        Ok(Simulation {
            cell_locations,
            survey,
            mapping,
            sensitivities: None,
        })
    }

    pub fn cell_locations(&self) -> &Array2<f64> {
        &self.cell_locations
    }

    pub fn n_cells(&self) -> usize {
        self.cell_locations.nrows()
    }

    pub fn survey(&self) -> &Survey {
        &self.survey
    }

    pub fn mapping(&self) -> &dyn Mapping {
        self.mapping.as_ref()
    }

    /// Per-source sensitivity matrices, built on first access and cached
    /// for the lifetime of the simulation (geometry never changes).
    pub fn sensitivities(&mut self) -> MagResult<&[Array2<f64>]> {
        if self.sensitivities.is_none() {
            let mut list = Vec::with_capacity(self.survey.n_sources());
            for source in self.survey.source_list() {
                list.push(assemble_source_sensitivity(&self.cell_locations, source)?);
            }
            self.sensitivities = Some(list);
        }
        match &self.sensitivities {
            Some(list) => Ok(list),
            None => Err(MagError::Inconsistency(
                "sensitivity cache empty after assembly".to_string(),
            )),
        }
    }

    /// Per-source magnetization: excitation field at the cells times the
    /// physical polarizability obtained from the mapping.
    pub fn magnetization(&mut self, model: &Array1<f64>) -> MagResult<Vec<Array1<f64>>> {
        let polarizabilities = self.mapping.apply(model)?;
        if polarizabilities.len() != 3 * self.cell_locations.nrows() {
            return Err(MagError::Inconsistency(format!(
                "mapping returned {} polarizabilities for {} cells",
                polarizabilities.len(),
                self.cell_locations.nrows()
            )));
        }

        let cells = &self.cell_locations;
        let mut magnetizations = Vec::with_capacity(self.survey.n_sources());
        for source in self.survey.source_list_mut() {
            let field = source.evaluate(cells)?;
            if field.len() != polarizabilities.len() {
                return Err(MagError::Inconsistency(format!(
                    "excitation field length {} does not match polarizability length {}",
                    field.len(),
                    polarizabilities.len()
                )));
            }
            magnetizations.push(&field * &polarizabilities);
        }
        Ok(magnetizations)
    }

    /// Per-source predicted data: G_source · magnetization_source.
    pub fn fields(&mut self, model: &Array1<f64>) -> MagResult<Vec<Array1<f64>>> {
        self.sensitivities()?;
        let magnetizations = self.magnetization(model)?;
        let g_list = match &self.sensitivities {
            Some(list) => list,
            None => {
                return Err(MagError::Inconsistency(
                    "sensitivity cache empty after assembly".to_string(),
                ))
            }
        };
        if g_list.len() != magnetizations.len() {
            return Err(MagError::Inconsistency(
                "the length of the system matrix list and magnetizations don't match".to_string(),
            ));
        }
        Ok(g_list
            .iter()
            .zip(&magnetizations)
            .map(|(g, m)| g.dot(m))
            .collect())
    }

    /// Predicted data vector, concatenated in source order.
    pub fn dpred(&mut self, model: &Array1<f64>) -> MagResult<Array1<f64>> {
        let fields = self.fields(model)?;
        let n_data = self.survey.n_data();
        let mut predicted = Array1::zeros(n_data);
        let mut offset = 0;
        for field in &fields {
            predicted
                .slice_mut(s![offset..offset + field.len()])
                .assign(field);
            offset += field.len();
        }
        if offset != n_data {
            return Err(MagError::Inconsistency(format!(
                "assembled {offset} data rows, survey declares {n_data}"
            )));
        }
        Ok(predicted)
    }

    /// Jacobian-vector product. The forward map is linear in the model,
    /// so this is the forward prediction of the perturbation.
    pub fn jvec(&mut self, model: &Array1<f64>, perturbation: &Array1<f64>) -> MagResult<Array1<f64>> {
        if model.len() != self.mapping.n_params() {
            return Err(MagError::ConfigError(format!(
                "model length {} does not match mapping parameter count {}",
                model.len(),
                self.mapping.n_params()
            )));
        }
        self.dpred(perturbation)
    }

    /// Transpose Jacobian-vector product: field-weighted back-projection
    /// of a data-space vector onto the model space, summed over sources.
    pub fn jtvec(&mut self, model: &Array1<f64>, data_vector: &Array1<f64>) -> MagResult<Array1<f64>> {
        if model.len() != self.mapping.n_params() {
            return Err(MagError::ConfigError(format!(
                "model length {} does not match mapping parameter count {}",
                model.len(),
                self.mapping.n_params()
            )));
        }
        if data_vector.len() != self.survey.n_data() {
            return Err(MagError::ConfigError(format!(
                "data-space vector length {} does not match survey datum count {}",
                data_vector.len(),
                self.survey.n_data()
            )));
        }

        self.sensitivities()?;
        let g_list = match &self.sensitivities {
            Some(list) => list,
            None => {
                return Err(MagError::Inconsistency(
                    "sensitivity cache empty after assembly".to_string(),
                ))
            }
        };
        let cells = &self.cell_locations;
        let sources = self.survey.source_list_mut();
        if g_list.len() != sources.len() {
            return Err(MagError::Inconsistency(
                "the length of the system matrix list and source list don't match".to_string(),
            ));
        }

        let mut accumulated: Array1<f64> = Array1::zeros(3 * cells.nrows());
        let mut offset = 0;
        for (g, source) in g_list.iter().zip(sources.iter_mut()) {
            let nd = source.n_data();
            let segment = data_vector.slice(s![offset..offset + nd]);
            let back_projected = g.t().dot(&segment);
            let field = source.evaluate(cells)?;
            accumulated += &(&field * &back_projected);
            offset += nd;
        }

        self.mapping.apply_transpose(&accumulated)
    }
}

/// Dense sensitivity matrix for one source: (source n_data, 3·ncells).
///
/// Row blocks follow the source's receivers in declared order; within a
/// receiver, rows are location-major then component order. Columns are
/// cell-major with x, y, z per cell.
fn assemble_source_sensitivity(cells: &Array2<f64>, source: &Source) -> MagResult<Array2<f64>> {
    let n_cells = cells.nrows();
    let mut g: Array2<f64> = Array2::zeros((source.n_data(), 3 * n_cells));

    let mut row_offset = 0;
    for receiver in source.receivers() {
        let n_components = receiver.components().len();
        let scale = receiver.area() * INV_FOUR_PI;
        let rx_locations = receiver.locations();

        for i in 0..receiver.n_locations() {
            for j in 0..n_cells {
                let r = [
                    rx_locations[[i, 0]] - cells[[j, 0]],
                    rx_locations[[i, 1]] - cells[[j, 1]],
                    rx_locations[[i, 2]] - cells[[j, 2]],
                ];
                let dist = (r[0] * r[0] + r[1] * r[1] + r[2] * r[2]).sqrt();
                if dist < MIN_SEPARATION {
                    return Err(MagError::PhysicsViolation(format!(
                        "receiver location {i} coincides with cell {j}"
                    )));
                }
                let inv_d3 = 1.0 / (dist * dist * dist);
                let rhat = [r[0] / dist, r[1] / dist, r[2] / dist];

                for (c_idx, component) in receiver.components().iter().enumerate() {
                    let a = component.index();
                    let row = row_offset + i * n_components + c_idx;
                    for b in 0..3 {
                        let identity = if a == b { 1.0 } else { 0.0 };
                        g[[row, 3 * j + b]] =
                            scale * inv_d3 * (3.0 * rhat[a] * rhat[b] - identity);
                    }
                }
            }
        }
        row_offset += receiver.n_data();
    }

    Ok(g)
}
