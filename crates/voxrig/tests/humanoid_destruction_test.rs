//! End-to-end destruction: a generated humanoid is posed, shot, and the
//! events reach both the channel sink and a debris emitter.

use std::sync::Arc;

use glam::{Quat, Vec3};
use parking_lot::Mutex;
use voxrig::{destruction_channel, DebrisEmitter, Settings, VoxelHumanoid};
use voxrig_assets::ProceduralHumanoids;
use voxrig_core::{BoneBinding, CanonicalBone, SkeletonProvider, VoxelDestroyed};

fn generated(settings: &Settings) -> VoxelHumanoid {
    let set = ProceduralHumanoids::humanoid().build(settings.rig.voxel.unit_scale).unwrap();
    let mut humanoid = VoxelHumanoid::new(settings.rig.clone(), &set).unwrap();
    humanoid.generate_all().unwrap();
    humanoid
}

#[test]
fn test_events_reach_every_sink() {
    let settings = Settings::default();
    let mut humanoid = generated(&settings);

    let (sink, receiver) = destruction_channel(4096);
    let debris = Arc::new(Mutex::new(DebrisEmitter::new(3)));
    humanoid.add_observer(sink);
    humanoid.add_observer({
        let debris = Arc::clone(&debris);
        move |event: &VoxelDestroyed| debris.lock().emit(event)
    });

    let chest = humanoid.skeleton().joint_for_bone(CanonicalBone::Chest).unwrap();
    let center = humanoid.skeleton().world_position(chest);
    let destroyed = humanoid.on_impact(center, Some(0.25));
    assert!(!destroyed.is_empty());

    let events = receiver.drain();
    assert_eq!(events, destroyed);
    assert_eq!(debris.lock().particles().len(), destroyed.len());
    for event in &events {
        assert!(event.world_point.distance(center) <= 0.25);
        assert!(!humanoid.volume().is_active(event.coord));
    }
}

#[test]
fn test_no_active_bound_voxel_left_in_radius() {
    let settings = Settings::default();
    let mut humanoid = generated(&settings);
    let center = Vec3::new(0.0, 1.2, 0.0);
    let radius = 0.3;
    humanoid.on_impact(center, Some(radius));

    for voxel in humanoid.volume().voxels() {
        let Some(p) = humanoid.volume().world_position(voxel.coord, humanoid.skeleton()) else {
            continue;
        };
        if humanoid.volume().is_active(voxel.coord) {
            assert!(p.distance(center) > radius, "{} survived inside the impact", voxel.coord);
        }
    }
}

#[test]
fn test_damage_follows_posed_limb() {
    let settings = Settings::default();
    let mut humanoid = generated(&settings);

    // Swing the left arm down by rotating the shoulder.
    let shoulder = humanoid.skeleton().joint_for_bone(CanonicalBone::LeftShoulder).unwrap();
    let rest = humanoid.skeleton().world_position(humanoid.skeleton().joint_for_bone(CanonicalBone::LeftHand).unwrap());
    humanoid.skeleton_mut().set_local_rotation(shoulder, Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
    let hand = humanoid.skeleton().joint_for_bone(CanonicalBone::LeftHand).unwrap();
    let posed = humanoid.skeleton().world_position(hand);
    assert!(posed.distance(rest) > 0.1);

    assert!(humanoid.on_impact(rest, Some(0.05)).is_empty());
    let hits = humanoid.on_impact(posed, Some(0.2));
    assert!(hits.iter().any(|e| e.bone == BoneBinding::Bone(CanonicalBone::LeftHand)));
}

#[test]
fn test_regeneration_keeps_destroyed_voxels() {
    let settings = Settings::default();
    let mut humanoid = generated(&settings);
    let before = humanoid.volume().active_count();
    let destroyed = humanoid.on_impact(Vec3::new(0.0, 1.65, 0.0), Some(0.2)).len();
    assert!(destroyed > 0);

    let report = humanoid.generate_all().unwrap();
    assert_eq!(humanoid.volume().active_count(), before - destroyed);
    assert_eq!(report.triangles * 3, humanoid.mesh().unwrap().triangles.len());
}
