// ─────────────────────────────────────────────────────────────────────
// SCPN MagPol Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{MagError, MagResult};
use serde::{Deserialize, Serialize};

/// Top-level inversion configuration.
/// Maps 1:1 to the default_inversion.json schema at the workspace root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InversionConfig {
    pub survey_name: String,
    /// Assumed per-datum measurement uncertainty. Strictly positive.
    pub noise_floor: f64,
    #[serde(default)]
    pub solve: SolveSchedule,
}

/// Regularization trade-off schedule for a solve.
///
/// Exactly one of `beta` / `beta_factor` is normally set; when both are
/// absent the inversion falls back to the β it was constructed with.
/// `beta_cooling`, when present, enables the iterative cooling loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveSchedule {
    /// Explicit trade-off parameter β.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    /// Scale factor for the random-test-vector β estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta_factor: Option<f64>,
    /// Geometric cooling divisor (> 1). β is divided by this value each
    /// re-solve until the target misfit is reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta_cooling: Option<f64>,
    /// Bound on the number of cooling solves (default: 10).
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_max_iterations() -> usize {
    10
}

impl Default for SolveSchedule {
    fn default() -> Self {
        SolveSchedule {
            beta: None,
            beta_factor: None,
            beta_cooling: None,
            max_iterations: default_max_iterations(),
        }
    }
}

impl SolveSchedule {
    /// Validate schedule parameters before a solve.
    pub fn validate(&self) -> MagResult<()> {
        if let Some(beta) = self.beta {
            if !beta.is_finite() || beta <= 0.0 {
                return Err(MagError::ConfigError(format!(
                    "solve.beta must be finite and > 0, got {beta}"
                )));
            }
        }
        if let Some(factor) = self.beta_factor {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(MagError::ConfigError(format!(
                    "solve.beta_factor must be finite and > 0, got {factor}"
                )));
            }
        }
        if let Some(cooling) = self.beta_cooling {
            if !cooling.is_finite() || cooling <= 1.0 {
                return Err(MagError::ConfigError(format!(
                    "solve.beta_cooling must be finite and > 1, got {cooling}"
                )));
            }
        }
        if self.max_iterations == 0 {
            return Err(MagError::ConfigError(
                "solve.max_iterations must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl InversionConfig {
    /// Load from a JSON file.
    pub fn from_file(path: &str) -> MagResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Validate the loaded configuration.
    pub fn validate(&self) -> MagResult<()> {
        if !self.noise_floor.is_finite() || self.noise_floor <= 0.0 {
            return Err(MagError::ConfigError(format!(
                "noise_floor must be finite and > 0, got {}",
                self.noise_floor
            )));
        }
        self.solve.validate()
    }
}
