// ─────────────────────────────────────────────────────────────────────
// SCPN MagPol Core — Receiver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Magnetic field receivers.
//!
//! A receiver is an ordered set of measurement locations, the field
//! components sampled at each, and an effective sensor area. Locations
//! and components are immutable after construction, so the datum count
//! is computed once and can never go stale.

use magpol_types::component::Component;
use magpol_types::error::{MagError, MagResult};
use magpol_types::geometry::validate_locations;
use ndarray::Array2;

/// Default effective sensor/coil area.
const DEFAULT_AREA: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct Receiver {
    locations: Array2<f64>,
    components: Vec<Component>,
    area: f64,
    n_data: usize,
}

impl Receiver {
    /// Build a receiver from (nlocations, 3) positions.
    ///
    /// `components` defaults to all of x, y, z; duplicates are kept and
    /// each contributes its own data rows. `area` defaults to 1.
    pub fn new(
        locations: Array2<f64>,
        components: Option<Vec<Component>>,
        area: Option<f64>,
    ) -> MagResult<Self> {
        validate_locations("receiver locations", &locations)?;

        let components = components.unwrap_or_else(|| Component::ALL.to_vec());
        if components.is_empty() {
            return Err(MagError::ConfigError(
                "receiver needs at least one component".to_string(),
            ));
        }

        let area = area.unwrap_or(DEFAULT_AREA);
        if !area.is_finite() || area <= 0.0 {
            return Err(MagError::ConfigError(format!(
                "receiver area must be finite and > 0, got {area}"
            )));
        }

        let n_data = locations.nrows() * components.len();
        Ok(Receiver {
            locations,
            components,
            area,
            n_data,
        })
    }

    /// Build from string component labels ("x" | "y" | "z", any case).
    pub fn from_labels(
        locations: Array2<f64>,
        labels: &[&str],
        area: Option<f64>,
    ) -> MagResult<Self> {
        let components = labels
            .iter()
            .map(|label| Component::parse(label))
            .collect::<MagResult<Vec<_>>>()?;
        Receiver::new(locations, Some(components), area)
    }

    pub fn locations(&self) -> &Array2<f64> {
        &self.locations
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn n_locations(&self) -> usize {
        self.locations.nrows()
    }

    /// Datum count: locations × components.
    pub fn n_data(&self) -> usize {
        self.n_data
    }
}
