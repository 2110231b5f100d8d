//! # Application Settings
//!
//! Top-level settings file for hosts and the demo binary. The rig
//! configuration nests under `[rig]`.
//!
//! ```toml
//! log_level = "debug"
//!
//! [demo]
//! model = "humanoid"
//! seed = 42
//!
//! [[demo.impacts]]
//! point = [0.0, 1.6, 0.0]
//! radius = 0.2
//!
//! [rig.voxel]
//! unit_scale = 0.1
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use voxrig_core::{RigConfig, RigError, RigResult};

/// Process-wide settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Demo run parameters.
    pub demo: DemoSettings,
    /// Rig configuration.
    pub rig: RigConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self { log_level: "info".to_string(), demo: DemoSettings::default(), rig: RigConfig::default() }
    }
}

/// What the demo binary builds and shoots at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoSettings {
    /// Procedural model name, used when `vox_path` is unset.
    pub model: String,
    /// MagicaVoxel file to import instead of a procedural model.
    pub vox_path: Option<PathBuf>,
    /// Debris seed.
    pub seed: u64,
    /// Impacts applied in order after generation.
    pub impacts: Vec<Impact>,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            model: "humanoid".to_string(),
            vox_path: None,
            seed: 0,
            impacts: vec![
                Impact { point: [0.0, 1.55, 0.0], radius: Some(0.2) },
                Impact { point: [-0.9, 1.25, 0.0], radius: None },
            ],
        }
    }
}

/// One scripted impact.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Impact {
    /// World-space impact point.
    pub point: [f32; 3],
    /// Radius; the rig's `impact_radius` when unset.
    #[serde(default)]
    pub radius: Option<f32>,
}

impl Settings {
    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or fails validation.
    pub fn from_toml_str(text: &str) -> RigResult<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> RigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::InvalidConfig`] for a negative impact radius or an
    /// invalid rig section.
    pub fn validate(&self) -> RigResult<()> {
        if let Some(impact) = self.demo.impacts.iter().find(|i| i.radius.is_some_and(|r| r < 0.0)) {
            return Err(RigError::InvalidConfig(format!("impact at {:?} has a negative radius", impact.point)));
        }
        self.rig.validate()
    }
}
