//! Aggregated simulation configuration.
//!
//! `SimConfig` is what a host loads once at startup. Every section falls back
//! to its defaults when omitted, so a config file only lists overrides.

use std::path::Path;

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::combat::CombatConfig;
use crate::error::{CoreError, CoreResult};
use crate::generation::{GenerationConfig, LevelSeed};
use crate::monster::AiConfig;
use crate::session::SessionConfig;
use crate::steering::SteeringConfig;

#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub seed: LevelSeed,
    pub generation: GenerationConfig,
    pub steering: SteeringConfig,
    pub ai: AiConfig,
    pub combat: CombatConfig,
    pub session: SessionConfig,
}

impl SimConfig {
    pub fn validate(&self) -> CoreResult<()> {
        self.generation
            .validate_for(self.session.map_width, self.session.map_height)?;
        self.steering.validate()?;
        self.combat.validate()?;
        self.session.validate()?;
        if self.ai.attack_range < 0.0 || self.ai.attack_range > self.ai.detection_range {
            return Err(CoreError::InvalidConfiguration(format!(
                "attack_range {} must be within [0, detection_range {}]",
                self.ai.attack_range, self.ai.detection_range
            )));
        }
        Ok(())
    }

    pub fn from_ron(text: &str) -> CoreResult<Self> {
        let config: Self = ron::from_str(text)
            .map_err(|e| CoreError::InvalidConfiguration(format!("RON parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron(&self) -> CoreResult<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| CoreError::InvalidConfiguration(format!("RON write error: {e}")))
    }

    pub fn from_json(text: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| CoreError::InvalidConfiguration(format!("JSON parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::InvalidConfiguration(format!("JSON write error: {e}")))
    }

    /// Load from disk; `.json` files are JSON, anything else is RON
    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CoreError::InvalidConfiguration(format!("read error for {}: {e}", path.display()))
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&text),
            _ => Self::from_ron(&text),
        }
    }
}
