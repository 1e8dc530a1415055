//! Analysis configuration.
//!
//! Every key is optional; an empty file yields the defaults below.
//!
//! ```toml
//! interaction_radius_um = 35.0
//! immune_floor = 250
//! compartmentalized_below = 0.22
//! brute_force_limit = 2048
//! store_format = "gml"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::builder::{DEFAULT_BRUTE_FORCE_LIMIT, DEFAULT_INTERACTION_RADIUS_UM};
use crate::metrics::mixing::{COMPARTMENTALIZED_BELOW, IMMUNE_FLOOR};
use crate::storage::StoreFormat;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Edge threshold in micrometers; pairs strictly closer are connected.
    pub interaction_radius_um: f64,
    /// Minimum immune cell count for a mixing score.
    pub immune_floor: usize,
    /// Mixing scores below this are compartmentalized.
    pub compartmentalized_below: f64,
    pub brute_force_limit: usize,
    pub store_format: StoreFormat,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            interaction_radius_um: DEFAULT_INTERACTION_RADIUS_UM,
            immune_floor: IMMUNE_FLOOR,
            compartmentalized_below: COMPARTMENTALIZED_BELOW,
            brute_force_limit: DEFAULT_BRUTE_FORCE_LIMIT,
            store_format: StoreFormat::Gml,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.interaction_radius_um.is_finite() || self.interaction_radius_um <= 0.0 {
            return Err(Error::Config(format!(
                "interaction_radius_um must be positive, got {}",
                self.interaction_radius_um
            )));
        }
        if !self.compartmentalized_below.is_finite() || self.compartmentalized_below < 0.0 {
            return Err(Error::Config(format!(
                "compartmentalized_below must be a non-negative number, got {}",
                self.compartmentalized_below
            )));
        }
        Ok(())
    }
}
