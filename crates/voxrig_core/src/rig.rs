//! Humanoid retarget description built from a generated skeleton.
//!
//! Joints are matched by name against the humanoid naming scheme. Names the
//! skeleton does not carry (toes, eyes, jaw, upper chest) are skipped.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::bones::CANONICAL_BONES;
use crate::config::AvatarConfig;
use crate::skeleton::{JointId, Skeleton};

/// Optional humanoid names in addition to the canonical bones.
pub const OPTIONAL_HUMAN_BONES: [&str; 6] = ["UpperChest", "LeftToes", "RightToes", "LeftEye", "RightEye", "Jaw"];

/// Maps one rig joint to one humanoid name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanBone {
    /// Joint name in the rig.
    pub bone_name: String,
    /// Humanoid name.
    pub human_name: String,
    /// Use the retargeter's default muscle limits.
    pub use_default_limits: bool,
}

/// Local rest pose of one rig joint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkeletonBone {
    /// Joint name.
    pub name: String,
    /// Local translation.
    pub position: Vec3,
    /// Local rotation.
    pub rotation: Quat,
    /// Local scale.
    pub scale: Vec3,
}

/// Complete retarget description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HumanDescription {
    /// Tuning passed through from configuration.
    pub tuning: AvatarConfig,
    /// Humanoid mapping.
    pub human: Vec<HumanBone>,
    /// Rest pose, matched joints first and the root last.
    pub skeleton: Vec<SkeletonBone>,
}

impl HumanDescription {
    /// Serializes the description as TOML.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if a value cannot be represented.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Joint name mapped to `human_name`, if any.
    #[must_use]
    pub fn bone_for(&self, human_name: &str) -> Option<&str> {
        self.human.iter().find(|h| h.human_name == human_name).map(|h| h.bone_name.as_str())
    }
}

/// Builds [`HumanDescription`]s.
pub struct RigExporter;

impl RigExporter {
    /// Describes `skeleton` for humanoid retargeting.
    #[must_use]
    pub fn export(skeleton: &Skeleton, tuning: &AvatarConfig) -> HumanDescription {
        let names = CANONICAL_BONES.iter().map(|b| b.name()).chain(OPTIONAL_HUMAN_BONES);
        let mut human = Vec::new();
        let mut rest = Vec::new();

        for name in names {
            let Some(id) = Self::find_under_root(skeleton, name) else {
                continue;
            };
            human.push(HumanBone { bone_name: name.to_string(), human_name: name.to_string(), use_default_limits: true });
            rest.push(Self::skeleton_bone(skeleton, id));
        }
        rest.push(Self::skeleton_bone(skeleton, skeleton.root()));

        tracing::debug!(mapped = human.len(), "humanoid description built");
        HumanDescription { tuning: tuning.clone(), human, skeleton: rest }
    }

    fn find_under_root(skeleton: &Skeleton, name: &str) -> Option<JointId> {
        skeleton.iter().find(|(id, j)| *id != skeleton.root() && j.name == name).map(|(id, _)| id)
    }

    fn skeleton_bone(skeleton: &Skeleton, id: JointId) -> SkeletonBone {
        let joint = skeleton.joint(id);
        SkeletonBone {
            name: joint.name.clone(),
            position: joint.local.translation,
            rotation: joint.local.rotation,
            scale: joint.local.scale,
        }
    }
}
