//! # Mesh Assembly
//!
//! Turns the voxel volume into renderable, skinned buffers.
//!
//! ```text
//! generate_all   vertices  weights  bind poses  triangles   (explicit only)
//! after damage                                  triangles   (active subset)
//! ```
//!
//! Vertices, weights and bind poses are laid out in full generation order
//! and never change on damage; destroying a voxel only removes its faces
//! from the index buffer.

use bytemuck::{Pod, Zeroable};
use glam::{Affine3A, Mat4};

use crate::assign::{BoneMembership, UNASSIGNED_BONE};
use crate::bones::{CanonicalBone, CANONICAL_BONES};
use crate::bounds::Aabb;
use crate::builder::check_joint_list;
use crate::error::RigResult;
use crate::skeleton::{JointId, Skeleton};
use crate::volume::VoxelVolume;
use crate::voxel::{VoxelCoord, VoxelVertex};

/// Single-bone skinning record for one vertex.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BoneWeight {
    /// Index into the joint list and the bind poses.
    pub joint: u32,
    /// Always 1.0.
    pub weight: f32,
}

impl BoneWeight {
    /// Full weight to one joint.
    #[inline]
    #[must_use]
    pub const fn single(joint: u32) -> Self {
        Self { joint, weight: 1.0 }
    }
}

/// Renderable buffers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    /// Every voxel's vertices, in generation order.
    pub vertices: Vec<VoxelVertex>,
    /// One weight per vertex (empty for a static mesh).
    pub weights: Vec<BoneWeight>,
    /// Triangle index list.
    pub triangles: Vec<u32>,
    /// One inverse bind matrix per joint (empty for a static mesh).
    pub bind_poses: Vec<Mat4>,
}

impl MeshBuffers {
    /// Box around every vertex, `None` for an empty mesh.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        let mut iter = self.vertices.iter().map(|v| glam::Vec3::from(v.position));
        let first = iter.next()?;
        let mut aabb = Aabb::new(first, first);
        iter.for_each(|p| aabb.encapsulate(p));
        Some(aabb)
    }

    /// Number of triangles in the index buffer.
    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// True when the mesh carries skinning data.
    #[must_use]
    pub fn is_skinned(&self) -> bool {
        !self.bind_poses.is_empty() && self.weights.len() == self.vertices.len()
    }
}

/// Builds mesh buffers from a volume.
pub struct MeshAssembler;

impl MeshAssembler {
    /// Static mesh from every voxel, regardless of activity.
    #[must_use]
    pub fn generate_mesh(volume: &VoxelVolume) -> MeshBuffers {
        let voxels = volume.voxels();
        let vertex_count: usize = voxels.iter().map(|v| v.vertex_points().len()).sum();
        let index_count: usize = voxels.iter().map(|v| v.triangle_indices().len()).sum();
        let mut mesh = MeshBuffers {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(index_count),
            ..MeshBuffers::default()
        };
        for voxel in voxels {
            mesh.vertices.extend_from_slice(voxel.vertex_points());
            mesh.triangles.extend_from_slice(voxel.triangle_indices());
        }
        mesh
    }

    /// Concatenated triangles of one bone's voxels.
    #[must_use]
    pub fn generate_active_triangles(
        volume: &VoxelVolume,
        membership: &BoneMembership,
        bone: CanonicalBone,
        only_active: bool,
    ) -> Vec<u32> {
        Self::collect(volume, membership.members(bone), only_active)
    }

    /// Concatenated triangles of the voxels authored without a bone.
    #[must_use]
    pub fn unassigned_triangles(volume: &VoxelVolume, membership: &BoneMembership, only_active: bool) -> Vec<u32> {
        Self::collect(volume, membership.unassigned(), only_active)
    }

    /// Concatenated triangles of the voxels whose bone has no joint.
    #[must_use]
    pub fn unbound_triangles(volume: &VoxelVolume, membership: &BoneMembership, only_active: bool) -> Vec<u32> {
        Self::collect(volume, membership.unbound(), only_active)
    }

    /// Triangles of every active voxel: bones in canonical order, then the
    /// unassigned group, then the unbound group.
    #[must_use]
    pub fn active_triangles(volume: &VoxelVolume, membership: &BoneMembership) -> Vec<u32> {
        let mut triangles = Vec::new();
        for bone in CANONICAL_BONES {
            triangles.extend(Self::generate_active_triangles(volume, membership, bone, true));
        }
        triangles.extend(Self::unassigned_triangles(volume, membership, true));
        triangles.extend(Self::unbound_triangles(volume, membership, true));
        triangles
    }

    fn collect(volume: &VoxelVolume, coords: &[VoxelCoord], only_active: bool) -> Vec<u32> {
        let mut out = Vec::new();
        for &c in coords {
            if only_active && !volume.is_active(c) {
                continue;
            }
            if let Some(voxel) = volume.get(c) {
                out.extend_from_slice(voxel.triangle_indices());
            }
        }
        out
    }

    /// One weight per vertex, bound to the voxel's bone in `joints`.
    ///
    /// Voxels without a bone are weighted to [`UNASSIGNED_BONE`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::RigError::StructuralMismatch`] unless `joints`
    /// has one entry per canonical bone.
    pub fn rebuild_weights(volume: &VoxelVolume, joints: &[JointId]) -> RigResult<Vec<BoneWeight>> {
        check_joint_list(joints)?;
        let mut weights = Vec::new();
        for voxel in volume.voxels() {
            let joint = voxel.bone.bone().unwrap_or(UNASSIGNED_BONE).index() as u32;
            weights.extend(std::iter::repeat(BoneWeight::single(joint)).take(voxel.vertex_points().len()));
        }
        Ok(weights)
    }

    /// Inverse bind matrix per joint: joint world-to-local times mesh root
    /// local-to-world.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RigError::StructuralMismatch`] unless `joints`
    /// has one entry per canonical bone.
    pub fn rebuild_bind_poses(skeleton: &Skeleton, joints: &[JointId], mesh_root: Affine3A) -> RigResult<Vec<Mat4>> {
        check_joint_list(joints)?;
        let mesh_to_world = Mat4::from(mesh_root);
        Ok(joints.iter().map(|&j| skeleton.world_to_local_matrix(j) * mesh_to_world).collect())
    }

    /// Full skinned buffers. Triangles reflect the current activity mask.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RigError::StructuralMismatch`] unless `joints`
    /// has one entry per canonical bone. Nothing is built in that case.
    pub fn generate_all(
        volume: &VoxelVolume,
        membership: &BoneMembership,
        skeleton: &Skeleton,
        joints: &[JointId],
        mesh_root: Affine3A,
    ) -> RigResult<MeshBuffers> {
        let weights = Self::rebuild_weights(volume, joints)?;
        let bind_poses = Self::rebuild_bind_poses(skeleton, joints, mesh_root)?;
        let mut mesh = Self::generate_mesh(volume);
        mesh.weights = weights;
        mesh.bind_poses = bind_poses;
        mesh.triangles = Self::active_triangles(volume, membership);
        tracing::info!(
            vertices = mesh.vertices.len(),
            triangles = mesh.triangle_count(),
            joints = joints.len(),
            "skinned mesh generated"
        );
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::assign::BoneAssigner;
    use crate::builder::{BuildOptions, ConnectionRules, SkeletonBuilder};
    use crate::error::RigError;
    use crate::voxel::{BoneBinding, GridSize, Voxel, VoxelGeometry};
    use glam::Vec3;

    // Each test voxel owns three vertices and one triangle.
    fn voxel(k: u32, bone: BoneBinding) -> Voxel {
        let base = k * 3;
        let p = [k as f32, 0.0, 0.0];
        Voxel {
            coord: VoxelCoord::new(k, 0, 0),
            bone,
            position_from_center: Vec3::from(p),
            color: [255; 4],
            geometry: VoxelGeometry {
                vertices: vec![VoxelVertex { position: p, ..VoxelVertex::default() }; 3],
                triangles: vec![base, base + 1, base + 2],
            },
        }
    }

    fn rigged() -> (VoxelVolume, BoneMembership, Skeleton, Vec<JointId>) {
        let mut volume = VoxelVolume::new(
            GridSize::new(5, 1, 1),
            1.0,
            vec![
                voxel(0, CanonicalBone::Hips.into()),
                voxel(1, CanonicalBone::Head.into()),
                voxel(2, CanonicalBone::Head.into()),
                voxel(3, BoneBinding::Unassigned),
                voxel(4, CanonicalBone::LeftFoot.into()),
            ],
        );
        let built = SkeletonBuilder::build(&volume.bone_clusters(), &ConnectionRules::default(), &BuildOptions::default());
        let (membership, _) = BoneAssigner::assign(&mut volume, &built.skeleton, &built.skeleton);
        (volume, membership, built.skeleton, built.joints)
    }

    fn as_set(tris: &[u32]) -> BTreeSet<u32> {
        tris.iter().copied().collect()
    }

    #[test]
    fn test_all_active_matches_full_mesh() {
        let (volume, membership, _, _) = rigged();
        let full = MeshAssembler::generate_mesh(&volume);
        let active = MeshAssembler::active_triangles(&volume, &membership);
        assert_eq!(as_set(&full.triangles), as_set(&active));
        assert_eq!(full.triangles.len(), active.len());
    }

    #[test]
    fn test_all_triangles_superset_of_active() {
        let (mut volume, membership, _, _) = rigged();
        volume.set_active(VoxelCoord::new(2, 0, 0), false);
        let all = MeshAssembler::generate_active_triangles(&volume, &membership, CanonicalBone::Head, false);
        let active = MeshAssembler::generate_active_triangles(&volume, &membership, CanonicalBone::Head, true);
        assert!(as_set(&active).is_subset(&as_set(&all)));
        assert_eq!(active, vec![3, 4, 5]);
        assert_eq!(all.len(), 6);
    }

    #[test]
    fn test_destroyed_unassigned_voxel_leaves_triangles() {
        let (mut volume, membership, _, _) = rigged();
        assert_eq!(MeshAssembler::unassigned_triangles(&volume, &membership, true), vec![9, 10, 11]);
        volume.set_active(VoxelCoord::new(3, 0, 0), false);
        assert!(MeshAssembler::unassigned_triangles(&volume, &membership, true).is_empty());
        let active = as_set(&MeshAssembler::active_triangles(&volume, &membership));
        assert!(!active.contains(&9));
        assert_eq!(active.len(), 12);
    }

    #[test]
    fn test_weights_follow_bone_index() {
        let (volume, _, _, joints) = rigged();
        let weights = MeshAssembler::rebuild_weights(&volume, &joints).unwrap();
        assert_eq!(weights.len(), 15);
        assert!(weights.iter().all(|w| (w.weight - 1.0).abs() < f32::EPSILON));
        assert_eq!(weights[3].joint, CanonicalBone::Head.index() as u32);
        assert_eq!(weights[9].joint, UNASSIGNED_BONE.index() as u32);
        assert_eq!(weights[12].joint, CanonicalBone::LeftFoot.index() as u32);
    }

    #[test]
    fn test_bind_pose_count_matches_joints() {
        let (volume, membership, skeleton, joints) = rigged();
        let mesh = MeshAssembler::generate_all(&volume, &membership, &skeleton, &joints, Affine3A::IDENTITY).unwrap();
        assert_eq!(mesh.bind_poses.len(), joints.len());
        assert_eq!(mesh.bind_poses.len(), CANONICAL_BONES.len());
        assert!(mesh.is_skinned());

        let head = joints[CanonicalBone::Head.index()];
        let origin = mesh.bind_poses[CanonicalBone::Head.index()].transform_point3(skeleton.world_position(head));
        assert!(origin.abs_diff_eq(Vec3::ZERO, 1e-5));
    }

    #[test]
    fn test_short_joint_list_aborts() {
        let (volume, membership, skeleton, joints) = rigged();
        let result = MeshAssembler::generate_all(&volume, &membership, &skeleton, &joints[1..], Affine3A::IDENTITY);
        assert!(matches!(result, Err(RigError::StructuralMismatch { .. })));
    }

    #[test]
    fn test_static_mesh_bounds() {
        let (volume, _, _, _) = rigged();
        let mesh = MeshAssembler::generate_mesh(&volume);
        assert!(!mesh.is_skinned());
        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(4.0, 0.0, 0.0));
        assert!(MeshBuffers::default().bounds().is_none());
    }
}
