//! Run configuration.
//!
//! [`AgendaConfig`] gathers every tunable of a run. All sections are optional
//! in TOML; missing keys take their defaults.
//!
//! ```toml
//! [ga]
//! population_size = 80
//! seed = 42
//!
//! [venue]
//! plenary_room = "AULA"
//! closed_on_day_two = ["ATTIC"]
//!
//! [placement]
//! over_provision = 1.3
//!
//! [weights]
//! unfilled_slot = 200.0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::capacity::VenueRules;
use crate::error::AgendaError;
use crate::ga::{FitnessWeights, GaConfig};
use crate::placement::PlacementConfig;

/// All tunables of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgendaConfig {
    /// Evolutionary loop.
    pub ga: GaConfig,
    /// Capacity exceptions.
    pub venue: VenueRules,
    /// Master schedule placement.
    pub placement: PlacementConfig,
    /// Fitness weights.
    pub weights: FitnessWeights,
}

impl AgendaConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, AgendaError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: &Path) -> Result<Self, AgendaError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Sets the GA section.
    pub fn with_ga(mut self, ga: GaConfig) -> Self {
        self.ga = ga;
        self
    }

    /// Sets the venue rules.
    pub fn with_venue(mut self, venue: VenueRules) -> Self {
        self.venue = venue;
        self
    }

    /// Sets the placement section.
    pub fn with_placement(mut self, placement: PlacementConfig) -> Self {
        self.placement = placement;
        self
    }

    /// Sets the fitness weights.
    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Checks every section.
    pub fn validate(&self) -> Result<(), AgendaError> {
        self.ga.validate().map_err(AgendaError::InvalidConfig)?;
        self.weights.validate().map_err(AgendaError::InvalidConfig)?;
        if self.placement.over_provision < 1.0 {
            return Err(AgendaError::InvalidConfig(
                "over_provision must be at least 1.0".into(),
            ));
        }
        Ok(())
    }
}
