//! # Damage Engine
//!
//! Sphere deactivation against the live pose. Every call scans all active
//! voxels linearly; humanoid grids are small enough that no spatial index
//! is kept.
//!
//! Destruction events are delivered synchronously to the registered
//! observers, on the caller's thread, before [`DamageEngine::damage`]
//! returns. Observers must not block.

use std::fmt;

use glam::Vec3;

use crate::skeleton::SkeletonProvider;
use crate::volume::VoxelVolume;
use crate::voxel::{BoneBinding, VoxelCoord};

/// One voxel going from active to inactive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoxelDestroyed {
    /// Destroyed voxel.
    pub coord: VoxelCoord,
    /// Authored bone of the voxel.
    pub bone: BoneBinding,
    /// Palette color.
    pub color: [u8; 4],
    /// Voxel world position at the moment of the impact.
    pub world_point: Vec3,
    /// Impact center.
    pub impact_center: Vec3,
}

/// Receives destruction events.
pub trait DestructionObserver: Send {
    /// Called once per destroyed voxel.
    fn on_voxel_destroyed(&mut self, event: &VoxelDestroyed);
}

impl<F> DestructionObserver for F
where
    F: FnMut(&VoxelDestroyed) + Send,
{
    fn on_voxel_destroyed(&mut self, event: &VoxelDestroyed) {
        self(event);
    }
}

/// Applies impacts to a volume and fans out destruction events.
#[derive(Default)]
pub struct DamageEngine {
    observers: Vec<Box<dyn DestructionObserver>>,
}

impl fmt::Debug for DamageEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DamageEngine").field("observers", &self.observers.len()).finish()
    }
}

impl DamageEngine {
    /// Creates an engine with the given observers.
    #[must_use]
    pub fn new(observers: Vec<Box<dyn DestructionObserver>>) -> Self {
        Self { observers }
    }

    /// Registers another observer.
    pub fn add_observer<O: DestructionObserver + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    /// Deactivates every active voxel with a cached binding within `radius` of `center`.
    ///
    /// Positions are recomputed from the cached joint-local offsets, so the
    /// test follows the current animation pose. A negative radius matches
    /// nothing. Returns the events in scan order.
    pub fn damage<P: SkeletonProvider + ?Sized>(
        &mut self,
        volume: &mut VoxelVolume,
        skeleton: &P,
        center: Vec3,
        radius: f32,
    ) -> Vec<VoxelDestroyed> {
        let mut hits = Vec::new();
        for voxel in volume.voxels() {
            if !volume.is_active(voxel.coord) {
                continue;
            }
            let Some(world_point) = volume.world_position(voxel.coord, skeleton) else {
                continue;
            };
            let distance = world_point.distance(center);
            if distance <= radius {
                tracing::trace!(coord = %voxel.coord, distance, "voxel inside impact");
                hits.push(VoxelDestroyed {
                    coord: voxel.coord,
                    bone: voxel.bone,
                    color: voxel.color,
                    world_point,
                    impact_center: center,
                });
            }
        }

        hits.retain(|event| volume.set_active(event.coord, false));
        for event in &hits {
            for observer in &mut self.observers {
                observer.on_voxel_destroyed(event);
            }
        }

        tracing::debug!(destroyed = hits.len(), ?center, radius, "impact applied");
        hits
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::assign::BoneAssigner;
    use crate::skeleton::{JointTransform, Skeleton};
    use crate::bones::CanonicalBone;
    use crate::voxel::{GridSize, Voxel, VoxelGeometry};
    use glam::Quat;

    fn setup() -> (VoxelVolume, Skeleton) {
        let voxels = (0..4)
            .map(|x| Voxel {
                coord: VoxelCoord::new(x, 0, 0),
                bone: if x == 3 { BoneBinding::Unassigned } else { CanonicalBone::Hips.into() },
                position_from_center: Vec3::new(x as f32, 0.0, 0.0),
                color: [200, 10, 10, 255],
                geometry: VoxelGeometry::default(),
            })
            .collect();
        let mut volume = VoxelVolume::new(GridSize::new(4, 1, 1), 1.0, voxels);
        let mut skeleton = Skeleton::new("Root", JointTransform::IDENTITY);
        skeleton.add_joint("Hips", Some(CanonicalBone::Hips), skeleton.root(), JointTransform::IDENTITY);
        let _ = BoneAssigner::assign(&mut volume, &skeleton, &skeleton);
        (volume, skeleton)
    }

    #[test]
    fn test_zero_radius_hits_exact_voxel() {
        let (mut volume, skeleton) = setup();
        let mut engine = DamageEngine::default();
        let hits = engine.damage(&mut volume, &skeleton, Vec3::new(1.0, 0.0, 0.0), 0.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].coord, VoxelCoord::new(1, 0, 0));
        assert!(!volume.is_active(VoxelCoord::new(1, 0, 0)));
        assert!(volume.is_active(VoxelCoord::new(0, 0, 0)));
    }

    #[test]
    fn test_negative_radius_hits_nothing() {
        let (mut volume, skeleton) = setup();
        let mut engine = DamageEngine::default();
        let hits = engine.damage(&mut volume, &skeleton, Vec3::new(1.0, 0.0, 0.0), -0.1);
        assert!(hits.is_empty());
        assert_eq!(volume.active_count(), 4);
    }

    #[test]
    fn test_repeat_impact_is_idempotent() {
        let (mut volume, skeleton) = setup();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let mut engine = DamageEngine::default();
        engine.add_observer(move |_: &VoxelDestroyed| {
            seen.fetch_add(1, Ordering::Relaxed);
        });

        let first = engine.damage(&mut volume, &skeleton, Vec3::ZERO, 1.5);
        let second = engine.damage(&mut volume, &skeleton, Vec3::ZERO, 1.5);
        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert_eq!(count.load(Ordering::Relaxed), 2);
        assert_eq!(volume.drain_changes().len(), 2);
    }

    #[test]
    fn test_unassigned_voxel_inside_radius_is_destroyed() {
        let (mut volume, skeleton) = setup();
        let mut engine = DamageEngine::default();
        let hits = engine.damage(&mut volume, &skeleton, Vec3::new(3.0, 0.0, 0.0), 0.1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].bone, BoneBinding::Unassigned);
        assert!(!volume.is_active(VoxelCoord::new(3, 0, 0)));
    }

    #[test]
    fn test_voxels_of_missing_joints_are_immune() {
        let voxels = vec![Voxel {
            coord: VoxelCoord::new(0, 0, 0),
            bone: CanonicalBone::Head.into(),
            position_from_center: Vec3::ZERO,
            color: [255; 4],
            geometry: VoxelGeometry::default(),
        }];
        let mut volume = VoxelVolume::new(GridSize::new(1, 1, 1), 1.0, voxels);
        let skeleton = Skeleton::new("Root", JointTransform::IDENTITY);
        let _ = BoneAssigner::assign(&mut volume, &skeleton, &skeleton);

        let hits = DamageEngine::default().damage(&mut volume, &skeleton, Vec3::ZERO, 1.0);
        assert!(hits.is_empty());
        assert!(volume.is_active(VoxelCoord::new(0, 0, 0)));
    }

    #[test]
    fn test_damage_tracks_pose() {
        let (mut volume, mut skeleton) = setup();
        let hips = skeleton.joint_for_bone(CanonicalBone::Hips).unwrap();
        skeleton.set_local_rotation(hips, Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));

        let mut engine = DamageEngine::default();
        let center = Vec3::new(0.0, 2.0, 0.0);
        let hits = engine.damage(&mut volume, &skeleton, center, 0.01);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].coord, VoxelCoord::new(2, 0, 0));
        for v in volume.voxels() {
            if let Some(p) = volume.world_position(v.coord, &skeleton) {
                assert_eq!(volume.is_active(v.coord), p.distance(center) > 0.01);
            }
        }
    }
}
