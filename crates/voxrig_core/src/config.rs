//! # Rig Configuration
//!
//! Loaded once from TOML. Every section has defaults, so an empty file is
//! a valid configuration.
//!
//! ```toml
//! [voxel]
//! unit_scale = 0.1
//!
//! [skeleton]
//! with_colliders = true
//!
//! [[skeleton.connection]]
//! bone = "Head"
//! x = "center"
//! y = "min"
//! z = "max"
//!
//! [damage]
//! impact_radius = 0.5
//!
//! [[palette]]
//! index = 12
//! bone = "Chest"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bones::CanonicalBone;
use crate::builder::{Anchor, ConnectionRule, ConnectionRules};
use crate::error::{RigError, RigResult};

/// Complete rig configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RigConfig {
    /// Voxel grid settings.
    pub voxel: VoxelConfig,
    /// Skeleton generation settings.
    pub skeleton: SkeletonConfig,
    /// Damage settings.
    pub damage: DamageConfig,
    /// Humanoid avatar tuning.
    pub avatar: AvatarConfig,
    /// Palette index to bone mapping for `.vox` imports.
    pub palette: Vec<PaletteEntry>,
}

/// Voxel grid settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VoxelConfig {
    /// World size of one voxel edge.
    pub unit_scale: f32,
}

impl Default for VoxelConfig {
    fn default() -> Self {
        Self { unit_scale: 0.1 }
    }
}

/// Skeleton generation settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SkeletonConfig {
    /// Attach a box collider sized to each bone's cluster.
    pub with_colliders: bool,
    /// Per-bone connection rule overrides.
    pub connection: Vec<ConnectionOverride>,
}

/// Override of one bone's connection rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionOverride {
    /// Bone whose rule is replaced.
    pub bone: CanonicalBone,
    /// Anchor along X.
    pub x: Anchor,
    /// Anchor along Y.
    pub y: Anchor,
    /// Anchor along Z.
    pub z: Anchor,
}

/// Damage settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DamageConfig {
    /// Radius used for impacts that carry no radius of their own.
    pub impact_radius: f32,
}

impl Default for DamageConfig {
    fn default() -> Self {
        Self { impact_radius: 0.5 }
    }
}

/// Humanoid avatar tuning, passed through to the retarget description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AvatarConfig {
    /// Twist distribution along the upper arm (0-1).
    pub upper_arm_twist: f32,
    /// Twist distribution along the forearm (0-1).
    pub lower_arm_twist: f32,
    /// Twist distribution along the thigh (0-1).
    pub upper_leg_twist: f32,
    /// Twist distribution along the shin (0-1).
    pub lower_leg_twist: f32,
    /// Allowed arm stretch when solving IK.
    pub arm_stretch: f32,
    /// Allowed leg stretch when solving IK.
    pub leg_stretch: f32,
    /// Extra spacing between the feet.
    pub feet_spacing: f32,
    /// Whether humanoid bones may translate as well as rotate.
    pub has_translation_dof: bool,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            upper_arm_twist: 0.5,
            lower_arm_twist: 0.5,
            upper_leg_twist: 0.5,
            lower_leg_twist: 0.5,
            arm_stretch: 0.05,
            leg_stretch: 0.05,
            feet_spacing: 0.0,
            has_translation_dof: false,
        }
    }
}

/// Maps a `.vox` palette index to a bone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaletteEntry {
    /// Palette index (1-255).
    pub index: u8,
    /// Bone voxels of this color follow.
    pub bone: CanonicalBone,
}

impl RigConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not parse or fails validation.
    pub fn from_toml_str(s: &str) -> RigResult<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> RigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::InvalidConfig`] describing the first bad value.
    pub fn validate(&self) -> RigResult<()> {
        let scale = self.voxel.unit_scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(RigError::InvalidConfig(format!("voxel.unit_scale must be > 0, got {scale}")));
        }
        let radius = self.damage.impact_radius;
        if !radius.is_finite() || radius < 0.0 {
            return Err(RigError::InvalidConfig(format!("damage.impact_radius must be >= 0, got {radius}")));
        }
        for entry in &self.palette {
            if entry.index == 0 {
                return Err(RigError::InvalidConfig("palette index 0 is the empty color".to_string()));
            }
        }
        Ok(())
    }

    /// Default connection rules with this config's overrides applied.
    #[must_use]
    pub fn connection_rules(&self) -> ConnectionRules {
        let mut rules = ConnectionRules::default();
        for o in &self.skeleton.connection {
            rules.set(o.bone, ConnectionRule::new(o.x, o.y, o.z));
        }
        rules
    }

    /// Bone mapped to a palette index, if any.
    #[must_use]
    pub fn bone_for_palette(&self, index: u8) -> Option<CanonicalBone> {
        self.palette.iter().rev().find(|e| e.index == index).map(|e| e.bone)
    }
}
