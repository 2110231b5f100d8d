//! # Skeleton Builder
//!
//! Places one joint per canonical bone from voxel occupancy alone.
//!
//! ```text
//!   cluster AABB (body-local)         connection rule (per bone)
//!   +-----------+                     x: min | center | max
//!   |           |   --- pick axis --> y: min | center | max   --> point
//!   |     .     |                     z: min | center | max
//!   +-----------+
//! ```
//!
//! The point is taken to world space through the body root and the joint is
//! moved there under its already-built parent. A bone with no voxels keeps
//! a zero local offset, so it sits on its parent's origin.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::bones::{CanonicalBone, HierarchyParent, CANONICAL_BONES, CANONICAL_BONE_COUNT};
use crate::bounds::Aabb;
use crate::error::{RigError, RigResult};
use crate::skeleton::{BoxCollider, JointId, JointTransform, Skeleton};
use crate::volume::BoneCluster;

/// Which side of a box an axis coordinate is taken from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    /// The box minimum on this axis.
    Min,
    /// Midpoint on this axis.
    Center,
    /// The box maximum on this axis.
    Max,
}

impl Anchor {
    #[inline]
    fn pick(self, min: f32, max: f32) -> f32 {
        match self {
            Self::Min => min,
            Self::Center => (min + max) * 0.5,
            Self::Max => max,
        }
    }
}

/// Per-axis anchor triple locating a joint on its cluster box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionRule {
    /// Anchor along X.
    pub x: Anchor,
    /// Anchor along Y.
    pub y: Anchor,
    /// Anchor along Z.
    pub z: Anchor,
}

impl ConnectionRule {
    /// Creates a rule.
    #[must_use]
    pub const fn new(x: Anchor, y: Anchor, z: Anchor) -> Self {
        Self { x, y, z }
    }

    /// Built-in rule for a bone.
    ///
    /// Torso and head joints sit on the bottom face where they meet the
    /// bone below, arm joints on the edge facing the body, leg joints on
    /// the top face, and the hips in the middle of the pelvis.
    #[must_use]
    pub const fn default_for(bone: CanonicalBone) -> Self {
        use Anchor::{Center, Max, Min};
        use CanonicalBone as B;
        match bone {
            B::Hips => Self::new(Center, Center, Center),
            B::Spine | B::Chest | B::Neck | B::Head => Self::new(Center, Min, Center),
            B::LeftShoulder | B::LeftUpperArm | B::LeftLowerArm | B::LeftHand => Self::new(Max, Center, Center),
            B::RightShoulder | B::RightUpperArm | B::RightLowerArm | B::RightHand => Self::new(Min, Center, Center),
            B::LeftUpperLeg
            | B::LeftLowerLeg
            | B::LeftFoot
            | B::RightUpperLeg
            | B::RightLowerLeg
            | B::RightFoot => Self::new(Center, Max, Center),
        }
    }

    /// Connection point on `bounds`.
    #[must_use]
    pub fn point(&self, bounds: &Aabb) -> Vec3 {
        Vec3::new(
            self.x.pick(bounds.min.x, bounds.max.x),
            self.y.pick(bounds.min.y, bounds.max.y),
            self.z.pick(bounds.min.z, bounds.max.z),
        )
    }
}

/// Connection rule for every canonical bone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionRules {
    rules: [ConnectionRule; CANONICAL_BONE_COUNT],
}

impl Default for ConnectionRules {
    fn default() -> Self {
        Self { rules: CANONICAL_BONES.map(ConnectionRule::default_for) }
    }
}

impl ConnectionRules {
    /// Rule for `bone`.
    #[inline]
    #[must_use]
    pub fn get(&self, bone: CanonicalBone) -> ConnectionRule {
        self.rules[bone.index()]
    }

    /// Replaces the rule for `bone`.
    pub fn set(&mut self, bone: CanonicalBone, rule: ConnectionRule) {
        self.rules[bone.index()] = rule;
    }
}

/// Options for one build.
#[derive(Clone, Debug)]
pub struct BuildOptions {
    /// Name given to the root joint.
    pub root_name: String,
    /// Body root transform at generation time.
    pub root: JointTransform,
    /// Attach a box collider sized to each cluster.
    pub with_colliders: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { root_name: "Root".to_string(), root: JointTransform::IDENTITY, with_colliders: false }
    }
}

/// Outcome of a skeleton build.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SkeletonReport {
    /// Bones that had no voxels and were placed on their parent's origin.
    pub missing_clusters: Vec<CanonicalBone>,
}

/// A freshly built skeleton and its canonical joint list.
#[derive(Clone, Debug)]
pub struct BuiltSkeleton {
    /// The joint arena.
    pub skeleton: Skeleton,
    /// One joint per canonical bone, in [`CANONICAL_BONES`] order.
    pub joints: Vec<JointId>,
    /// Recovered anomalies.
    pub report: SkeletonReport,
}

/// Derives the canonical hierarchy from bone clusters.
pub struct SkeletonBuilder;

impl SkeletonBuilder {
    /// Builds a skeleton rooted at `options.root`.
    #[must_use]
    pub fn build(
        clusters: &BTreeMap<CanonicalBone, BoneCluster>,
        rules: &ConnectionRules,
        options: &BuildOptions,
    ) -> BuiltSkeleton {
        let mut skeleton = Skeleton::new(options.root_name.clone(), options.root);
        let root = skeleton.root();
        let mut joints: Vec<JointId> = Vec::with_capacity(CANONICAL_BONE_COUNT);
        let mut report = SkeletonReport::default();

        for bone in CANONICAL_BONES {
            // Parents precede children in CANONICAL_BONES, so the parent's
            // joint is already in `joints`.
            let parent = match bone.parent() {
                HierarchyParent::Root => root,
                HierarchyParent::Bone(p) => joints[p.index()],
            };
            let joint = skeleton.add_joint(bone.name(), Some(bone), parent, JointTransform::IDENTITY);

            match clusters.get(&bone).filter(|c| !c.coords.is_empty()) {
                Some(cluster) => {
                    let local_point = rules.get(bone).point(&cluster.bounds);
                    let world = skeleton.transform_point(root, local_point);
                    skeleton.set_world_position(joint, world);

                    if options.with_colliders {
                        let center = skeleton.transform_point(root, cluster.bounds.center());
                        let collider = BoxCollider {
                            center: skeleton.inverse_transform_point(joint, center),
                            size: cluster.bounds.size(),
                        };
                        skeleton.joint_mut(joint).collider = Some(collider);
                    }
                }
                None => {
                    tracing::warn!(bone = %bone, "{bone} not found in volume");
                    report.missing_clusters.push(bone);
                }
            }
            joints.push(joint);
        }

        tracing::info!(
            joints = joints.len(),
            missing = report.missing_clusters.len(),
            "skeleton generated"
        );
        BuiltSkeleton { skeleton, joints, report }
    }
}

/// Fails unless `joints` lines up 1:1 with the canonical bone list.
///
/// # Errors
///
/// Returns [`RigError::StructuralMismatch`] on a length mismatch.
pub fn check_joint_list(joints: &[JointId]) -> RigResult<()> {
    if joints.len() == CANONICAL_BONE_COUNT {
        Ok(())
    } else {
        Err(RigError::StructuralMismatch { expected: CANONICAL_BONE_COUNT, actual: joints.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::{BoneBinding, GridSize, Voxel, VoxelCoord, VoxelGeometry};
    use crate::volume::VoxelVolume;
    use glam::Quat;

    fn voxel(x: u32, y: u32, z: u32, bone: CanonicalBone) -> Voxel {
        Voxel {
            coord: VoxelCoord::new(x, y, z),
            bone: BoneBinding::Bone(bone),
            position_from_center: VoxelCoord::new(x, y, z).center() - Vec3::new(2.0, 0.0, 2.0),
            color: [255; 4],
            geometry: VoxelGeometry::default(),
        }
    }

    fn head_corner_volume() -> VoxelVolume {
        let head = [(3, 3, 3), (2, 3, 3), (3, 2, 3), (3, 3, 2), (2, 3, 2)];
        let voxels = head.iter().map(|&(x, y, z)| voxel(x, y, z, CanonicalBone::Head)).collect();
        VoxelVolume::new(GridSize::new(4, 4, 4), 1.0, voxels)
    }

    #[test]
    fn test_head_at_corner_spine_missing() {
        let volume = head_corner_volume();
        let root = JointTransform::from_translation(Vec3::new(10.0, 0.0, 0.0));
        let options = BuildOptions { root, ..BuildOptions::default() };
        let built = SkeletonBuilder::build(&volume.bone_clusters(), &ConnectionRules::default(), &options);

        assert_eq!(built.joints.len(), CANONICAL_BONE_COUNT);
        assert!(built.report.missing_clusters.contains(&CanonicalBone::Spine));
        assert!(!built.report.missing_clusters.contains(&CanonicalBone::Head));

        let spine = built.joints[CanonicalBone::Spine.index()];
        assert_eq!(built.skeleton.joint(spine).local.translation, Vec3::ZERO);

        // Head cluster spans x,z in [0,2] and y in [2,4] body-local.
        let head = built.joints[CanonicalBone::Head.index()];
        let expected = Vec3::new(10.0 + 1.0, 2.0, 1.0);
        assert!(built.skeleton.world_position(head).abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_parents_follow_hierarchy() {
        let built = SkeletonBuilder::build(&BTreeMap::new(), &ConnectionRules::default(), &BuildOptions::default());
        for bone in CANONICAL_BONES {
            let joint = built.skeleton.joint(built.joints[bone.index()]);
            let expected = match bone.parent() {
                HierarchyParent::Root => built.skeleton.root(),
                HierarchyParent::Bone(p) => built.joints[p.index()],
            };
            assert_eq!(joint.parent(), Some(expected));
            assert_eq!(joint.name, bone.name());
        }
        assert_eq!(built.report.missing_clusters.len(), CANONICAL_BONE_COUNT);
    }

    #[test]
    fn test_colliders_cover_cluster() {
        let volume = head_corner_volume();
        let root = JointTransform::from_translation_rotation(Vec3::Y, Quat::from_rotation_y(0.4));
        let options = BuildOptions { root, with_colliders: true, ..BuildOptions::default() };
        let clusters = volume.bone_clusters();
        let built = SkeletonBuilder::build(&clusters, &ConnectionRules::default(), &options);

        let head = built.joints[CanonicalBone::Head.index()];
        let collider = built.skeleton.joint(head).collider.unwrap();
        let bounds = clusters[&CanonicalBone::Head].bounds;
        assert_eq!(collider.size, bounds.size());
        let world = built.skeleton.transform_point(head, collider.center);
        let expected = built.skeleton.transform_point(built.skeleton.root(), bounds.center());
        assert!(world.abs_diff_eq(expected, 1e-5));

        let spine = built.joints[CanonicalBone::Spine.index()];
        assert!(built.skeleton.joint(spine).collider.is_none());
    }

    #[test]
    fn test_rule_points() {
        let bounds = Aabb::new(Vec3::new(-1.0, 0.0, -2.0), Vec3::new(1.0, 4.0, 2.0));
        let left_arm = ConnectionRule::default_for(CanonicalBone::LeftUpperArm);
        assert_eq!(left_arm.point(&bounds), Vec3::new(1.0, 2.0, 0.0));
        let leg = ConnectionRule::default_for(CanonicalBone::RightLowerLeg);
        assert_eq!(leg.point(&bounds), Vec3::new(0.0, 4.0, 0.0));
    }

    #[test]
    fn test_joint_list_length_checked() {
        let built = SkeletonBuilder::build(&BTreeMap::new(), &ConnectionRules::default(), &BuildOptions::default());
        assert!(check_joint_list(&built.joints).is_ok());
        assert!(matches!(
            check_joint_list(&built.joints[..18]),
            Err(RigError::StructuralMismatch { expected: 19, actual: 18 })
        ));
    }
}
