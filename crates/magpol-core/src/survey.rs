// ─────────────────────────────────────────────────────────────────────
// SCPN MagPol Core — Survey
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Survey: the ordered collection of sources defining a data vector.
//!
//! The total datum count is the sum over every (source, receiver) pair
//! and fixes the row count of the stacked sensitivity matrix. Sources
//! are immutable as a list after construction (their evaluation caches
//! are interior state), so the count is computed once.

use crate::source::Source;

#[derive(Debug, Clone)]
pub struct Survey {
    sources: Vec<Source>,
    n_data: usize,
}

impl Survey {
    pub fn new(sources: Vec<Source>) -> Self {
        let n_data = sources.iter().map(Source::n_data).sum();
        Survey { sources, n_data }
    }

    pub fn source_list(&self) -> &[Source] {
        &self.sources
    }

    /// Mutable access for evaluation (sources memoize their last field).
    pub fn source_list_mut(&mut self) -> &mut [Source] {
        &mut self.sources
    }

    pub fn n_sources(&self) -> usize {
        self.sources.len()
    }

    /// Total datum count across all sources and receivers.
    pub fn n_data(&self) -> usize {
        self.n_data
    }
}
