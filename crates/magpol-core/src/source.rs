// ─────────────────────────────────────────────────────────────────────
// SCPN MagPol Core — Sources
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Magnetic excitation sources.
//!
//! A source produces the excitation field at the polarizable cells and
//! owns the receivers that observe the induced response. Two variants:
//! a controlled polygonal transmitter loop (Biot-Savart line current)
//! and a spatially uniform background field along one Cartesian axis.
//! Evaluation returns H flattened location-major: [x0, y0, z0, x1, ...].
//!
//! Each source memoizes its last evaluation. Identical location input
//! (same count, same values) returns the cached field without
//! recomputation; anything else recomputes and overwrites the cache
//! atomically.

use crate::line_current::LineCurrent;
use crate::receiver::Receiver;
use magpol_types::component::Component;
use magpol_types::error::MagResult;
use magpol_types::geometry::{flatten_vectors, validate_locations};
use ndarray::{Array1, Array2};

/// Per-coordinate tolerance when matching cached evaluation locations.
const LOCATION_MATCH_TOL: f64 = 1e-12;

/// Default transmitter current (A) and background amplitude (A/m).
const DEFAULT_CURRENT: f64 = 1.0;
const DEFAULT_AMPLITUDE: f64 = 1.0;

#[derive(Debug, Clone)]
struct EvalCache {
    locations: Array2<f64>,
    field: Array1<f64>,
}

fn same_locations(a: &Array2<f64>, b: &Array2<f64>) -> bool {
    a.dim() == b.dim()
        && a.iter()
            .zip(b.iter())
            .all(|(x, y)| (x - y).abs() <= LOCATION_MATCH_TOL)
}

/// Controlled source: a polygonal transmitter loop carrying a current.
#[derive(Debug, Clone)]
pub struct ControlledSource {
    receivers: Vec<Receiver>,
    loop_current: LineCurrent,
    cache: Option<EvalCache>,
    evaluations: usize,
}

impl ControlledSource {
    /// Build from a receiver list, an ordered (nnodes, 3) loop polygon
    /// and a scalar current (default 1 A). An unclosed polygon warns
    /// but does not fail.
    pub fn new(
        receivers: Vec<Receiver>,
        nodes: Array2<f64>,
        current: Option<f64>,
    ) -> MagResult<Self> {
        let loop_current = LineCurrent::new(nodes, current.unwrap_or(DEFAULT_CURRENT))?;
        Ok(ControlledSource {
            receivers,
            loop_current,
            cache: None,
            evaluations: 0,
        })
    }

    pub fn loop_current(&self) -> &LineCurrent {
        &self.loop_current
    }

    fn evaluate(&mut self, locations: &Array2<f64>) -> MagResult<Array1<f64>> {
        if let Some(cache) = &self.cache {
            if same_locations(&cache.locations, locations) {
                return Ok(cache.field.clone());
            }
        }
        let field = flatten_vectors(&self.loop_current.magnetic_field(locations)?);
        self.cache = Some(EvalCache {
            locations: locations.clone(),
            field: field.clone(),
        });
        self.evaluations += 1;
        Ok(field)
    }
}

/// Uniform source: a constant background field along one Cartesian axis.
#[derive(Debug, Clone)]
pub struct UniformSource {
    receivers: Vec<Receiver>,
    orientation: Component,
    amplitude: f64,
    cache: Option<EvalCache>,
    evaluations: usize,
}

impl UniformSource {
    pub fn new(receivers: Vec<Receiver>, orientation: Component, amplitude: Option<f64>) -> Self {
        UniformSource {
            receivers,
            orientation,
            amplitude: amplitude.unwrap_or(DEFAULT_AMPLITUDE),
            cache: None,
            evaluations: 0,
        }
    }

    pub fn orientation(&self) -> Component {
        self.orientation
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    fn evaluate(&mut self, locations: &Array2<f64>) -> MagResult<Array1<f64>> {
        validate_locations("evaluation locations", locations)?;
        if let Some(cache) = &self.cache {
            if same_locations(&cache.locations, locations) {
                return Ok(cache.field.clone());
            }
        }
        // Independent of the coordinates: amplitude in the orientation
        // slot of every location, zero elsewhere.
        let mut field_rows: Array2<f64> = Array2::zeros((locations.nrows(), 3));
        field_rows
            .column_mut(self.orientation.index())
            .fill(self.amplitude);
        let field = flatten_vectors(&field_rows);
        self.cache = Some(EvalCache {
            locations: locations.clone(),
            field: field.clone(),
        });
        self.evaluations += 1;
        Ok(field)
    }
}

/// Closed source variant exposing the single `evaluate` capability.
#[derive(Debug, Clone)]
pub enum Source {
    Controlled(ControlledSource),
    Uniform(UniformSource),
}

impl Source {
    /// Excitation field H at the given locations, flattened
    /// location-major to length 3 × nlocations.
    pub fn evaluate(&mut self, locations: &Array2<f64>) -> MagResult<Array1<f64>> {
        match self {
            Source::Controlled(src) => src.evaluate(locations),
            Source::Uniform(src) => src.evaluate(locations),
        }
    }

    pub fn receivers(&self) -> &[Receiver] {
        match self {
            Source::Controlled(src) => &src.receivers,
            Source::Uniform(src) => &src.receivers,
        }
    }

    /// Datum count: sum over the source's receivers. A source without
    /// receivers has zero associated data.
    pub fn n_data(&self) -> usize {
        self.receivers().iter().map(Receiver::n_data).sum()
    }

    /// Number of actual (cache-missing) evaluations performed.
    pub fn evaluation_count(&self) -> usize {
        match self {
            Source::Controlled(src) => src.evaluations,
            Source::Uniform(src) => src.evaluations,
        }
    }
}
