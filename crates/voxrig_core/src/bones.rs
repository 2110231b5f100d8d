//! Canonical humanoid bones and the fixed hierarchy table.
//!
//! The hierarchy is a tree rooted at the body root. The root is not a bone:
//! it is the explicit [`HierarchyParent::Root`] sentinel, and the joint that
//! stands for it is the skeleton's root joint.
//!
//! Body-local frame: +Y up, the character faces +Z, left limbs occupy -X.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RigError;

/// One of the fixed, named humanoid joints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CanonicalBone {
    /// Pelvis; parent of the spine and both legs.
    Hips,
    /// Lower torso.
    Spine,
    /// Upper torso.
    Chest,
    /// Neck.
    Neck,
    /// Head.
    Head,
    /// Left clavicle.
    LeftShoulder,
    /// Left upper arm.
    LeftUpperArm,
    /// Left lower arm.
    LeftLowerArm,
    /// Left hand.
    LeftHand,
    /// Right clavicle.
    RightShoulder,
    /// Right upper arm.
    RightUpperArm,
    /// Right lower arm.
    RightLowerArm,
    /// Right hand.
    RightHand,
    /// Left thigh.
    LeftUpperLeg,
    /// Left shin.
    LeftLowerLeg,
    /// Left foot.
    LeftFoot,
    /// Right thigh.
    RightUpperLeg,
    /// Right shin.
    RightLowerLeg,
    /// Right foot.
    RightFoot,
}

/// Number of canonical bones.
pub const CANONICAL_BONE_COUNT: usize = 19;

/// Every canonical bone, parents always before their children.
///
/// Joint lists, bind poses and weight indices are aligned with this order.
pub const CANONICAL_BONES: [CanonicalBone; CANONICAL_BONE_COUNT] = [
    CanonicalBone::Hips,
    CanonicalBone::Spine,
    CanonicalBone::Chest,
    CanonicalBone::Neck,
    CanonicalBone::Head,
    CanonicalBone::LeftShoulder,
    CanonicalBone::LeftUpperArm,
    CanonicalBone::LeftLowerArm,
    CanonicalBone::LeftHand,
    CanonicalBone::RightShoulder,
    CanonicalBone::RightUpperArm,
    CanonicalBone::RightLowerArm,
    CanonicalBone::RightHand,
    CanonicalBone::LeftUpperLeg,
    CanonicalBone::LeftLowerLeg,
    CanonicalBone::LeftFoot,
    CanonicalBone::RightUpperLeg,
    CanonicalBone::RightLowerLeg,
    CanonicalBone::RightFoot,
];

/// Parent entry of the hierarchy table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HierarchyParent {
    /// The body root (root sentinel).
    Root,
    /// Another canonical bone.
    Bone(CanonicalBone),
}

impl CanonicalBone {
    /// Parent of this bone in the fixed hierarchy.
    #[must_use]
    pub const fn parent(self) -> HierarchyParent {
        use CanonicalBone as B;
        use HierarchyParent::{Bone, Root};
        match self {
            B::Hips => Root,
            B::Spine => Bone(B::Hips),
            B::Chest => Bone(B::Spine),
            B::Neck | B::LeftShoulder | B::RightShoulder => Bone(B::Chest),
            B::Head => Bone(B::Neck),
            B::LeftUpperArm => Bone(B::LeftShoulder),
            B::LeftLowerArm => Bone(B::LeftUpperArm),
            B::LeftHand => Bone(B::LeftLowerArm),
            B::RightUpperArm => Bone(B::RightShoulder),
            B::RightLowerArm => Bone(B::RightUpperArm),
            B::RightHand => Bone(B::RightLowerArm),
            B::LeftUpperLeg | B::RightUpperLeg => Bone(B::Hips),
            B::LeftLowerLeg => Bone(B::LeftUpperLeg),
            B::LeftFoot => Bone(B::LeftLowerLeg),
            B::RightLowerLeg => Bone(B::RightUpperLeg),
            B::RightFoot => Bone(B::RightLowerLeg),
        }
    }

    /// Position of this bone in [`CANONICAL_BONES`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Joint name used for this bone.
    #[must_use]
    pub const fn name(self) -> &'static str {
        use CanonicalBone as B;
        match self {
            B::Hips => "Hips",
            B::Spine => "Spine",
            B::Chest => "Chest",
            B::Neck => "Neck",
            B::Head => "Head",
            B::LeftShoulder => "LeftShoulder",
            B::LeftUpperArm => "LeftUpperArm",
            B::LeftLowerArm => "LeftLowerArm",
            B::LeftHand => "LeftHand",
            B::RightShoulder => "RightShoulder",
            B::RightUpperArm => "RightUpperArm",
            B::RightLowerArm => "RightLowerArm",
            B::RightHand => "RightHand",
            B::LeftUpperLeg => "LeftUpperLeg",
            B::LeftLowerLeg => "LeftLowerLeg",
            B::LeftFoot => "LeftFoot",
            B::RightUpperLeg => "RightUpperLeg",
            B::RightLowerLeg => "RightLowerLeg",
            B::RightFoot => "RightFoot",
        }
    }
}

impl fmt::Display for CanonicalBone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CanonicalBone {
    type Err = RigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CANONICAL_BONES
            .iter()
            .copied()
            .find(|b| b.name() == s)
            .ok_or_else(|| RigError::UnknownBone(s.to_string()))
    }
}
