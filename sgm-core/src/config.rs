//! Tunable physical and numerical parameters.
//!
//! `PhysicsParams` carries everything a glacier needs beyond its geometry and
//! mass balance: the flow-law coefficients, the adaptive-timestep controls and
//! the equilibrium-detection settings. Parameters can be loaded from a TOML
//! file where any subset of keys overrides the defaults.

use crate::constants;
use crate::errors::{SgmError, SgmResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters of the ice-flow model and its numerics.
///
/// # Default Values
///
/// Defaults are the canonical values used throughout the glaciological
/// teaching literature: Glen `A = 2.4e-24`, no basal sliding, `n = 3`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    // Flow law
    /// Ice creep parameter (Glen A, Pa^-3 s^-1).
    /// Default: 2.4e-24
    pub creep: f64,

    /// Basal sliding parameter (Pa^-3 s^-1 m^2).
    /// Default: 0.0 (no sliding)
    pub basal_sliding: f64,

    /// Glen flow-law exponent.
    /// Default: 3.0
    pub glen_n: f64,

    /// Ice density (kg/m^3).
    /// Default: 900.0
    pub ice_density: f64,

    /// Gravitational acceleration (m/s^2).
    /// Default: 9.81
    pub gravity: f64,

    // Timestep control
    /// CFL number for the adaptive explicit timestep.
    /// Default: 0.02
    pub cfl_number: f64,

    /// Upper bound on the timestep (s).
    /// Default: 31 days
    pub dt_max: f64,

    /// A timestep below this (s) aborts the run as numerically unstable.
    /// Default: 0.1
    pub dt_min: f64,

    // Diagnostics
    /// Ice thicker than this (m) counts towards length, area and volume.
    /// Default: 0.01
    pub ice_thickness_epsilon: f64,

    /// Shift of the equilibrium line per degree of temperature bias (m/K).
    /// Default: 150.0
    pub ela_shift_per_degree: f64,

    // Equilibrium detection
    /// Relative volume tolerance between check blocks.
    /// Default: 1e-4
    pub equilibrium_rel_tol: f64,

    /// Years per equilibrium check block.
    /// Default: 10
    pub equilibrium_block_years: usize,

    /// Give up searching for an equilibrium after this many years.
    /// Default: 5000
    pub equilibrium_max_years: usize,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            creep: constants::GLEN_A,
            basal_sliding: 0.0,
            glen_n: constants::GLEN_N,
            ice_density: constants::RHO_ICE,
            gravity: constants::G,

            cfl_number: 0.02,
            dt_max: 31.0 * constants::SEC_IN_DAY,
            dt_min: 0.1,

            ice_thickness_epsilon: 0.01,
            ela_shift_per_degree: 150.0,

            equilibrium_rel_tol: 1e-4,
            equilibrium_block_years: 10,
            equilibrium_max_years: 5000,
        }
    }
}

impl PhysicsParams {
    /// Parse parameters from a TOML string.
    ///
    /// Keys not present fall back to their defaults.
    pub fn from_toml_str(raw: &str) -> SgmResult<Self> {
        let params: Self = toml::from_str(raw)?;
        params.validate()?;
        Ok(params)
    }

    /// Load parameters from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> SgmResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// The deformation factor of the flow law.
    ///
    /// $$f_d = \frac{2A}{n + 2}$$
    pub fn deformation_factor(&self) -> f64 {
        2.0 * self.creep / (self.glen_n + 2.0)
    }

    /// Check that the parameters are physically and numerically usable.
    pub fn validate(&self) -> SgmResult<()> {
        if !(self.creep > 0.0) {
            return Err(SgmError::Error(format!(
                "creep must be positive, got {}",
                self.creep
            )));
        }
        if self.basal_sliding < 0.0 {
            return Err(SgmError::Error(format!(
                "basal_sliding must be non-negative, got {}",
                self.basal_sliding
            )));
        }
        if !(self.cfl_number > 0.0 && self.cfl_number < 1.0) {
            return Err(SgmError::Error(format!(
                "cfl_number must be in (0, 1), got {}",
                self.cfl_number
            )));
        }
        if !(self.dt_min > 0.0 && self.dt_min < self.dt_max) {
            return Err(SgmError::Error(format!(
                "need 0 < dt_min < dt_max, got {} and {}",
                self.dt_min, self.dt_max
            )));
        }
        if self.equilibrium_block_years == 0 {
            return Err(SgmError::Error(
                "equilibrium_block_years must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters() {
        let params = PhysicsParams::default();

        assert!((params.creep - 2.4e-24).abs() < 1e-30);
        assert!((params.basal_sliding).abs() < 1e-30);
        assert!((params.glen_n - 3.0).abs() < 1e-10);
        assert_eq!(params.equilibrium_block_years, 10);
        params.validate().unwrap();
    }

    #[test]
    fn test_deformation_factor() {
        let params = PhysicsParams::default();

        // 2 * 2.4e-24 / 5 = 9.6e-25
        assert!((params.deformation_factor() - 9.6e-25).abs() < 1e-30);
    }

    #[test]
    fn test_partial_toml_override() {
        let params = PhysicsParams::from_toml_str("creep = 1.0e-23\ncfl_number = 0.01\n").unwrap();

        assert!((params.creep - 1.0e-23).abs() < 1e-30);
        assert!((params.cfl_number - 0.01).abs() < 1e-12);
        // Untouched keys keep their defaults
        assert!((params.ice_density - 900.0).abs() < 1e-10);
        assert!((params.ela_shift_per_degree - 150.0).abs() < 1e-10);
    }

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(PhysicsParams::from_toml_str("creep = \"fast\"").is_err());
        assert!(PhysicsParams::from_toml_str("creep = -1.0").is_err());
        assert!(PhysicsParams::from_toml_str("cfl_number = 2.0").is_err());
    }

    #[test]
    fn test_serialization() {
        let params = PhysicsParams::default();
        let json = serde_json::to_string(&params).expect("Serialization failed");
        let parsed: PhysicsParams = serde_json::from_str(&json).expect("Deserialization failed");

        assert!((params.creep - parsed.creep).abs() < 1e-30);
        assert_eq!(params.equilibrium_max_years, parsed.equilibrium_max_years);
    }
}
