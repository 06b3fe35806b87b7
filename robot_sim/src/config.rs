use crate::contact::parameters::ContactParameters;
use ron::de::from_reader;
use serde::{Deserialize, Serialize};
use std::{fs::File, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigErrors {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("{0}")]
    RonSerialize(#[from] ron::Error),
    #[error("acceleration limit '{0}' must be positive")]
    InvalidAccelerationLimit(&'static str),
}

/// Tunables of the contact point based physics engine.
///
/// Every field has a default, so a RON file only needs the fields it changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsEngineConfig {
    pub contact: ContactParameters,
    /// rad/s², a joint above this aborts the tick.
    pub max_angular_acceleration: f64,
    /// m/s²
    pub max_linear_acceleration: f64,
    pub compute_soft_limits: bool,
    pub compute_joint_damping: bool,
}

impl Default for PhysicsEngineConfig {
    fn default() -> Self {
        Self {
            contact: ContactParameters::default(),
            max_angular_acceleration: 1.0e7,
            max_linear_acceleration: 1.0e12,
            compute_soft_limits: true,
            compute_joint_damping: true,
        }
    }
}

impl PhysicsEngineConfig {
    pub fn from_ron_str(s: &str) -> Result<Self, ConfigErrors> {
        let config: Self = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigErrors> {
        let file = File::open(path)?;
        let config: Self = from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigErrors> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::new(),
        )?)
    }

    fn validate(&self) -> Result<(), ConfigErrors> {
        if self.max_angular_acceleration.is_nan() || self.max_angular_acceleration <= 0.0 {
            return Err(ConfigErrors::InvalidAccelerationLimit(
                "max_angular_acceleration",
            ));
        }
        if self.max_linear_acceleration.is_nan() || self.max_linear_acceleration <= 0.0 {
            return Err(ConfigErrors::InvalidAccelerationLimit(
                "max_linear_acceleration",
            ));
        }
        Ok(())
    }
}
