//! Procedural humanoids defined in code.
//!
//! Models are built from boxes, each tagged with the bone it belongs to.
//! The figure faces +Z with its left side at low X and stands on y = 0.

use std::collections::HashMap;

use voxrig_core::{BoneBinding, CanonicalBone, GridSize, VoxelCoord, VoxelSet};

use crate::error::AssetResult;
use crate::generator::{VoxelMeshGenerator, VoxelSeed};

/// Model colors (RGBA8).
pub mod colors {
    /// Skin tone.
    pub const SKIN: [u8; 4] = [224, 172, 105, 255];
    /// Shirt.
    pub const SHIRT: [u8; 4] = [178, 34, 34, 255];
    /// Trousers.
    pub const TROUSERS: [u8; 4] = [40, 60, 140, 255];
    /// Boots and belt.
    pub const LEATHER: [u8; 4] = [101, 67, 33, 255];
    /// Hair.
    pub const HAIR: [u8; 4] = [50, 35, 20, 255];
    /// Backpack (not rigged).
    pub const PACK: [u8; 4] = [85, 107, 47, 255];
}

/// Builder for bone-tagged voxel models.
///
/// A later voxel at an occupied coordinate replaces the earlier one but
/// keeps its place in generation order.
#[derive(Clone, Debug)]
pub struct HumanoidBuilder {
    name: &'static str,
    size: GridSize,
    seeds: Vec<VoxelSeed>,
    index: HashMap<VoxelCoord, usize>,
}

impl HumanoidBuilder {
    /// Creates a builder for a grid of `size`.
    #[must_use]
    pub fn new(name: &'static str, size: GridSize) -> Self {
        Self { name, size, seeds: Vec::new(), index: HashMap::new() }
    }

    /// Adds a single voxel.
    pub fn add_voxel(&mut self, x: u32, y: u32, z: u32, bone: impl Into<BoneBinding>, color: [u8; 4]) {
        let seed = VoxelSeed::new(VoxelCoord::new(x, y, z), bone, color);
        match self.index.get(&seed.coord) {
            Some(&i) => self.seeds[i] = seed,
            None => {
                self.index.insert(seed.coord, self.seeds.len());
                self.seeds.push(seed);
            }
        }
    }

    /// Fills an inclusive box.
    pub fn fill_box(
        &mut self,
        (x1, y1, z1): (u32, u32, u32),
        (x2, y2, z2): (u32, u32, u32),
        bone: impl Into<BoneBinding> + Copy,
        color: [u8; 4],
    ) {
        for z in z1.min(z2)..=z1.max(z2) {
            for y in y1.min(y2)..=y1.max(y2) {
                for x in x1.min(x2)..=x1.max(x2) {
                    self.add_voxel(x, y, z, bone, color);
                }
            }
        }
    }

    /// Seeds in generation order.
    #[must_use]
    pub fn seeds(&self) -> &[VoxelSeed] {
        &self.seeds
    }

    /// Grid dimensions.
    #[must_use]
    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Generates the voxel set.
    ///
    /// # Errors
    ///
    /// Returns an error if a voxel lies outside the grid.
    pub fn build(&self, unit_scale: f32) -> AssetResult<VoxelSet> {
        tracing::debug!(model = self.name, seeds = self.seeds.len(), "building procedural model");
        VoxelMeshGenerator::new(self.size, unit_scale)?.generate(&self.seeds)
    }
}

/// Library of code-defined humanoids.
pub struct ProceduralHumanoids;

impl ProceduralHumanoids {
    /// Full T-pose figure with every canonical bone and an unrigged
    /// backpack.
    ///
    /// ```text
    /// x:  0  1-2   3-5    6-7   8 ........ 13  14-15  16-18  19-20  21
    ///     H  LA    UA     SH    torso / legs   SH     UA     LA     H
    /// y:  0 feet   1-3 lower legs   4-6 upper legs   7-8 hips
    ///     9-10 spine   11-13 chest   14 neck   15-18 head
    /// ```
    #[must_use]
    pub fn humanoid() -> HumanoidBuilder {
        use colors::{HAIR, LEATHER, PACK, SHIRT, SKIN, TROUSERS};
        use CanonicalBone as B;

        let mut b = HumanoidBuilder::new("humanoid", GridSize::new(22, 19, 5));

        // Legs and feet; feet reach forward (+Z).
        let legs = [
            (B::LeftFoot, B::LeftLowerLeg, B::LeftUpperLeg, 8),
            (B::RightFoot, B::RightLowerLeg, B::RightUpperLeg, 12),
        ];
        for (foot, lower, upper, x) in legs {
            b.fill_box((x, 0, 1), (x + 1, 0, 4), foot, LEATHER);
            b.fill_box((x, 1, 2), (x + 1, 3, 3), lower, TROUSERS);
            b.fill_box((x, 4, 2), (x + 1, 6, 3), upper, TROUSERS);
        }

        // Torso.
        b.fill_box((8, 7, 1), (13, 8, 4), B::Hips, LEATHER);
        b.fill_box((8, 9, 1), (13, 10, 4), B::Spine, SHIRT);
        b.fill_box((8, 11, 1), (13, 13, 4), B::Chest, SHIRT);
        b.fill_box((10, 14, 2), (11, 14, 3), B::Neck, SKIN);
        b.fill_box((9, 15, 1), (12, 18, 4), B::Head, SKIN);
        b.fill_box((9, 18, 1), (12, 18, 2), B::Head, HAIR);

        // Arms, stretched out along X.
        b.fill_box((6, 12, 2), (7, 13, 3), B::LeftShoulder, SHIRT);
        b.fill_box((3, 12, 2), (5, 13, 3), B::LeftUpperArm, SHIRT);
        b.fill_box((1, 12, 2), (2, 13, 3), B::LeftLowerArm, SKIN);
        b.fill_box((0, 12, 2), (0, 13, 3), B::LeftHand, SKIN);
        b.fill_box((14, 12, 2), (15, 13, 3), B::RightShoulder, SHIRT);
        b.fill_box((16, 12, 2), (18, 13, 3), B::RightUpperArm, SHIRT);
        b.fill_box((19, 12, 2), (20, 13, 3), B::RightLowerArm, SKIN);
        b.fill_box((21, 12, 2), (21, 13, 3), B::RightHand, SKIN);

        // Backpack behind the spine, bound to no bone.
        b.fill_box((9, 9, 0), (12, 12, 0), BoneBinding::Unassigned, PACK);

        b
    }

    /// Head and torso only: limbs are absent.
    #[must_use]
    pub fn bust() -> HumanoidBuilder {
        use colors::{SHIRT, SKIN};
        use CanonicalBone as B;

        let mut b = HumanoidBuilder::new("bust", GridSize::new(6, 10, 4));
        b.fill_box((0, 0, 0), (5, 1, 3), B::Hips, SHIRT);
        b.fill_box((0, 2, 0), (5, 5, 3), B::Chest, SHIRT);
        b.fill_box((1, 6, 0), (4, 9, 3), B::Head, SKIN);
        b
    }

    /// Looks a model up by name.
    #[must_use]
    pub fn by_name(name: &str) -> Option<HumanoidBuilder> {
        match name {
            "humanoid" => Some(Self::humanoid()),
            "bust" => Some(Self::bust()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxrig_core::{VoxelSource, CANONICAL_BONES};

    #[test]
    fn test_humanoid_covers_every_bone() {
        let model = ProceduralHumanoids::humanoid();
        for bone in CANONICAL_BONES {
            assert!(
                model.seeds().iter().any(|s| s.bone == BoneBinding::Bone(bone)),
                "{bone} has no voxels"
            );
        }
        assert!(model.seeds().iter().any(|s| s.bone == BoneBinding::Unassigned));
    }

    #[test]
    fn test_humanoid_is_mirror_symmetric() {
        let model = ProceduralHumanoids::humanoid();
        let width = model.size().x;
        for seed in model.seeds() {
            let mirrored = VoxelCoord::new(width - 1 - seed.coord.x, seed.coord.y, seed.coord.z);
            assert!(model.seeds().iter().any(|s| s.coord == mirrored), "{} has no mirror", seed.coord);
        }
    }

    #[test]
    fn test_later_voxel_replaces_earlier() {
        let model = ProceduralHumanoids::humanoid();
        let hair = model.seeds().iter().find(|s| s.coord == VoxelCoord::new(9, 18, 1)).unwrap();
        assert_eq!(hair.color, colors::HAIR);
        assert_eq!(hair.bone, BoneBinding::Bone(CanonicalBone::Head));
    }

    #[test]
    fn test_models_generate() {
        for name in ["humanoid", "bust"] {
            let set = ProceduralHumanoids::by_name(name).unwrap().build(0.1).unwrap();
            assert!(!set.voxels().is_empty());
        }
        assert!(ProceduralHumanoids::by_name("dragon").is_none());
    }
}
