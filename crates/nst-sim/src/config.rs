//! The JSON run document: stepping parameters plus transport parameters.
//!
//! ```json
//! {
//!   "run":       { "dt_secs": 3600, "total_steps": 240, "output_interval_steps": 24 },
//!   "transport": { "porosity": 0.35, "active_layer": { "kind": "wong_parker" } }
//! }
//! ```
//!
//! Either section may be omitted and takes its defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use nst_core::RunConfig;
use nst_transport::TransporterConfig;

use crate::{SimError, SimResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub run:       RunConfig,
    pub transport: TransporterConfig,
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> SimResult<()> {
        validate_run(&self.run)?;
        self.transport.validate()?;
        Ok(())
    }
}

pub(crate) fn validate_run(run: &RunConfig) -> SimResult<()> {
    if !(run.dt_secs.is_finite() && run.dt_secs >= 0.0) {
        return Err(SimError::Config(format!(
            "dt_secs must be finite and non-negative, got {}",
            run.dt_secs
        )));
    }
    Ok(())
}
