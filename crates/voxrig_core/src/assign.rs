//! Bone assignment: resolves each voxel's canonical bone to a live joint
//! and caches the voxel's position in that joint's space.
//!
//! A bone the target rig does not have is logged once and skipped; every
//! resolvable bone still gets bound, so partial rigs proceed. Voxels with
//! no authored bone follow the hips, the same joint their skin weight uses.

use std::collections::BTreeMap;
use std::collections::HashMap;

use glam::Affine3A;

use crate::bones::CanonicalBone;
use crate::skeleton::{JointId, RootTransformProvider, SkeletonProvider};
use crate::volume::{VoxelBinding, VoxelVolume};
use crate::voxel::{BoneBinding, VoxelCoord};

/// Joint that carries voxels with no authored bone.
pub const UNASSIGNED_BONE: CanonicalBone = CanonicalBone::Hips;

/// Per-bone voxel membership produced by an assignment pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoneMembership {
    members: BTreeMap<CanonicalBone, Vec<VoxelCoord>>,
    unassigned: Vec<VoxelCoord>,
    unbound: Vec<VoxelCoord>,
}

impl BoneMembership {
    /// Voxels bound to `bone`, in generation order.
    #[must_use]
    pub fn members(&self, bone: CanonicalBone) -> &[VoxelCoord] {
        self.members.get(&bone).map_or(&[], Vec::as_slice)
    }

    /// Voxels authored without a bone. They are bound to
    /// [`UNASSIGNED_BONE`] when the rig has it.
    #[must_use]
    pub fn unassigned(&self) -> &[VoxelCoord] {
        &self.unassigned
    }

    /// Voxels whose bone has no joint in the rig.
    #[must_use]
    pub fn unbound(&self) -> &[VoxelCoord] {
        &self.unbound
    }
}

/// Outcome of an assignment pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssignmentReport {
    /// Voxels whose binding was cached, unassigned ones included.
    pub bound: usize,
    /// Voxels with no authored bone.
    pub unassigned: usize,
    /// Voxels skipped because their bone has no joint.
    pub skipped: usize,
    /// Bones that could not be resolved, in first-seen order.
    pub missing_bones: Vec<CanonicalBone>,
}

/// Computes voxel-to-joint bindings.
pub struct BoneAssigner;

impl BoneAssigner {
    /// Binds every voxel of `volume` against the rig.
    ///
    /// Previous bindings are discarded. For each voxel with a resolvable
    /// bone the body-local offset is taken to world space through the
    /// root's current transform, then re-expressed in the joint's space.
    pub fn assign<S, R>(volume: &mut VoxelVolume, skeleton: &S, root: &R) -> (BoneMembership, AssignmentReport)
    where
        S: SkeletonProvider + ?Sized,
        R: RootTransformProvider + ?Sized,
    {
        let root_to_world = root.root_to_world();
        let mut resolved: HashMap<CanonicalBone, Option<(JointId, Affine3A)>> = HashMap::new();
        let mut membership = BoneMembership::default();
        let mut report = AssignmentReport::default();
        let mut bindings = Vec::with_capacity(volume.voxels().len());

        for voxel in volume.voxels() {
            let bone = match voxel.bone {
                BoneBinding::Unassigned => {
                    report.unassigned += 1;
                    membership.unassigned.push(voxel.coord);
                    UNASSIGNED_BONE
                }
                BoneBinding::Bone(bone) => bone,
            };

            let joint = *resolved.entry(bone).or_insert_with(|| {
                let joint = skeleton.joint_for_bone(bone);
                if joint.is_none() {
                    tracing::error!(bone = %bone, "bone not found in target skeleton");
                    report.missing_bones.push(bone);
                }
                joint.map(|j| (j, skeleton.joint_to_world(j).inverse()))
            });

            match joint {
                Some((joint, world_to_joint)) => {
                    let world = root_to_world.transform_point3(voxel.position_from_center);
                    let local_position = world_to_joint.transform_point3(world);
                    bindings.push((voxel.coord, VoxelBinding { local_position, joint }));
                    if voxel.bone == BoneBinding::Bone(bone) {
                        membership.members.entry(bone).or_default().push(voxel.coord);
                    }
                    report.bound += 1;
                }
                None => {
                    report.skipped += 1;
                    if voxel.bone != BoneBinding::Unassigned {
                        membership.unbound.push(voxel.coord);
                    }
                }
            }
        }

        volume.clear_bindings();
        for (coord, binding) in bindings {
            volume.set_binding(coord, Some(binding));
        }

        tracing::debug!(
            bound = report.bound,
            unassigned = report.unassigned,
            skipped = report.skipped,
            "bone assignment complete"
        );
        (membership, report)
    }
}
