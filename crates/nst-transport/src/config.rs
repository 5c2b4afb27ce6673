//! Transport model configuration.
//!
//! Every field has a default, so a JSON document only needs to name what it
//! changes:
//!
//! ```json
//! {
//!   "porosity": 0.35,
//!   "formula": { "kind": "meyer_peter_muller", "coefficient": 3.97 },
//!   "active_layer": { "kind": "wong_parker" }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use nst_core::{DomainError, DomainResult};

use crate::active_layer::ActiveLayerModel;
use crate::formula::Formula;
use crate::TransportResult;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransporterConfig {
    /// m/s².
    pub gravity:                f64,
    /// kg/m³.
    pub fluid_density:          f64,
    /// Bed porosity in `[0, 1)`.
    pub porosity:               f64,
    pub formula:                Formula,
    pub active_layer:           ActiveLayerModel,
    /// Relative residual above which a step's mass balance is reported.
    pub mass_balance_tolerance: f64,
}

impl Default for TransporterConfig {
    fn default() -> Self {
        Self {
            gravity:                9.81,
            fluid_density:          1000.0,
            porosity:               0.3,
            formula:                Formula::default(),
            active_layer:           ActiveLayerModel::default(),
            mass_balance_tolerance: 1e-9,
        }
    }
}

impl TransporterConfig {
    pub fn from_json_str(json: &str) -> TransportResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> TransportResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> DomainResult<()> {
        positive("gravity", self.gravity)?;
        positive("fluid_density", self.fluid_density)?;
        if !(0.0..1.0).contains(&self.porosity) {
            return Err(invalid("porosity", self.porosity, "must be in [0, 1)"));
        }
        if !(self.mass_balance_tolerance.is_finite() && self.mass_balance_tolerance >= 0.0) {
            return Err(invalid(
                "mass_balance_tolerance",
                self.mass_balance_tolerance,
                "must be finite and non-negative",
            ));
        }
        match self.active_layer {
            ActiveLayerModel::Constant { thickness_m } => positive("thickness_m", thickness_m)?,
            ActiveLayerModel::GrainSizeDependent { multiplier } => positive("multiplier", multiplier)?,
            ActiveLayerModel::WongParker => {}
        }
        if let Formula::MeyerPeterMuller(f) = self.formula {
            positive("coefficient", f.coefficient)?;
            positive("exponent", f.exponent)?;
            if !(f.critical_shields.is_finite() && f.critical_shields >= 0.0) {
                return Err(invalid("critical_shields", f.critical_shields, "must be finite and non-negative"));
            }
        }
        Ok(())
    }
}

fn invalid(name: &'static str, value: f64, reason: &'static str) -> DomainError {
    DomainError::InvalidParameter { name, value, reason }
}

fn positive(name: &'static str, value: f64) -> DomainResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, value, "must be finite and positive"))
    }
}
