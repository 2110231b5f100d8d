//! Joint hierarchy and the transform-provider boundaries.
//!
//! A [`Skeleton`] is a flat arena of joints. Joint 0 is the body root: it
//! stands in for the root sentinel of the canonical hierarchy and supplies
//! the body's world transform. World matrices are composed on demand by
//! walking the parent chain; a humanoid rig is a couple of dozen joints
//! deep at most, so no cache is kept and pose edits are visible at once.

use std::collections::HashMap;

use glam::{Affine3A, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::bones::CanonicalBone;

/// Index of a joint inside its [`Skeleton`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JointId(u32);

impl JointId {
    /// The body root joint.
    pub const ROOT: Self = Self(0);

    /// Arena index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Local translation, rotation and scale relative to the parent joint.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointTransform {
    /// Translation.
    pub translation: Vec3,
    /// Rotation.
    pub rotation: Quat,
    /// Non-uniform scale.
    pub scale: Vec3,
}

impl Default for JointTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl JointTransform {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Pure translation.
    #[must_use]
    pub const fn from_translation(translation: Vec3) -> Self {
        Self { translation, rotation: Quat::IDENTITY, scale: Vec3::ONE }
    }

    /// Translation plus rotation.
    #[must_use]
    pub const fn from_translation_rotation(translation: Vec3, rotation: Quat) -> Self {
        Self { translation, rotation, scale: Vec3::ONE }
    }

    /// As an affine matrix.
    #[inline]
    #[must_use]
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Box collider in joint-local space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxCollider {
    /// Box center.
    pub center: Vec3,
    /// Box edge lengths.
    pub size: Vec3,
}

/// One node of the hierarchy.
#[derive(Clone, Debug)]
pub struct Joint {
    /// Joint name (canonical bones use their canonical name).
    pub name: String,
    /// Canonical bone this joint stands for, if any.
    pub bone: Option<CanonicalBone>,
    /// Local transform.
    pub local: JointTransform,
    /// Optional collider sized to the bone's voxel cluster.
    pub collider: Option<BoxCollider>,
    parent: Option<JointId>,
}

impl Joint {
    /// Parent joint (`None` for the root).
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<JointId> {
        self.parent
    }
}

/// Resolves canonical bones to joints of a live rig.
pub trait SkeletonProvider {
    /// Joint standing for `bone`, or `None` when the rig lacks it.
    fn joint_for_bone(&self, bone: CanonicalBone) -> Option<JointId>;
    /// Current local-to-world matrix of a joint.
    fn joint_to_world(&self, joint: JointId) -> Affine3A;
}

/// Supplies the body's current world transform.
pub trait RootTransformProvider {
    /// Current local-to-world matrix of the body root.
    fn root_to_world(&self) -> Affine3A;
}

/// Joint arena rooted at the body root.
#[derive(Clone, Debug)]
pub struct Skeleton {
    joints: Vec<Joint>,
    by_bone: HashMap<CanonicalBone, JointId>,
}

impl Skeleton {
    /// Creates a skeleton holding only the body root.
    #[must_use]
    pub fn new(root_name: impl Into<String>, root: JointTransform) -> Self {
        Self {
            joints: vec![Joint {
                name: root_name.into(),
                bone: None,
                local: root,
                collider: None,
                parent: None,
            }],
            by_bone: HashMap::new(),
        }
    }

    /// The body root joint.
    #[inline]
    #[must_use]
    pub fn root(&self) -> JointId {
        JointId::ROOT
    }

    /// Number of joints, root included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    /// Always false: the root joint always exists.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Appends a joint under `parent`.
    ///
    /// A joint carrying a canonical bone becomes the rig's joint for that bone.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this skeleton.
    pub fn add_joint(
        &mut self,
        name: impl Into<String>,
        bone: Option<CanonicalBone>,
        parent: JointId,
        local: JointTransform,
    ) -> JointId {
        assert!(parent.index() < self.joints.len(), "parent joint {parent:?} out of range");
        let id = JointId(self.joints.len() as u32);
        self.joints.push(Joint { name: name.into(), bone, local, collider: None, parent: Some(parent) });
        if let Some(bone) = bone {
            self.by_bone.insert(bone, id);
        }
        id
    }

    /// Joint by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this skeleton.
    #[inline]
    #[must_use]
    pub fn joint(&self, id: JointId) -> &Joint {
        &self.joints[id.index()]
    }

    /// Mutable joint by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this skeleton.
    #[inline]
    pub fn joint_mut(&mut self, id: JointId) -> &mut Joint {
        &mut self.joints[id.index()]
    }

    /// All joints with their ids, root first.
    pub fn iter(&self) -> impl Iterator<Item = (JointId, &Joint)> {
        self.joints.iter().enumerate().map(|(i, j)| (JointId(i as u32), j))
    }

    /// Local-to-world matrix of a joint.
    #[must_use]
    pub fn local_to_world(&self, id: JointId) -> Affine3A {
        let mut joint = self.joint(id);
        let mut m = joint.local.to_affine();
        while let Some(parent) = joint.parent {
            joint = self.joint(parent);
            m = joint.local.to_affine() * m;
        }
        m
    }

    /// World-to-local matrix of a joint.
    #[must_use]
    pub fn world_to_local(&self, id: JointId) -> Affine3A {
        self.local_to_world(id).inverse()
    }

    /// World-to-local matrix as a 4x4 matrix.
    #[must_use]
    pub fn world_to_local_matrix(&self, id: JointId) -> Mat4 {
        Mat4::from(self.world_to_local(id))
    }

    /// World position of a joint's origin.
    #[must_use]
    pub fn world_position(&self, id: JointId) -> Vec3 {
        self.local_to_world(id).translation.into()
    }

    /// Transforms a point from joint space to world space.
    #[must_use]
    pub fn transform_point(&self, id: JointId, p: Vec3) -> Vec3 {
        self.local_to_world(id).transform_point3(p)
    }

    /// Transforms a point from world space to joint space.
    #[must_use]
    pub fn inverse_transform_point(&self, id: JointId, p: Vec3) -> Vec3 {
        self.world_to_local(id).transform_point3(p)
    }

    /// Moves a joint so its origin lands on `world`, keeping its parent.
    pub fn set_world_position(&mut self, id: JointId, world: Vec3) {
        let local = match self.joint(id).parent {
            Some(parent) => self.inverse_transform_point(parent, world),
            None => world,
        };
        self.joint_mut(id).local.translation = local;
    }

    /// Sets a joint's local translation.
    pub fn set_local_translation(&mut self, id: JointId, translation: Vec3) {
        self.joint_mut(id).local.translation = translation;
    }

    /// Sets a joint's local rotation (animation pose).
    pub fn set_local_rotation(&mut self, id: JointId, rotation: Quat) {
        self.joint_mut(id).local.rotation = rotation;
    }

    /// Replaces the body root's transform.
    pub fn set_root_transform(&mut self, transform: JointTransform) {
        self.joints[0].local = transform;
    }
}

impl SkeletonProvider for Skeleton {
    fn joint_for_bone(&self, bone: CanonicalBone) -> Option<JointId> {
        self.by_bone.get(&bone).copied()
    }

    fn joint_to_world(&self, joint: JointId) -> Affine3A {
        self.local_to_world(joint)
    }
}

impl RootTransformProvider for Skeleton {
    fn root_to_world(&self) -> Affine3A {
        self.local_to_world(JointId::ROOT)
    }
}
