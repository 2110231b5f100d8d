//! # Voxel Mesh Generator
//!
//! Turns tagged voxel seeds into core [`Voxel`]s carrying a full cube of
//! geometry each.
//!
//! ```text
//! voxel k  ──►  vertices [24k, 24k + 24)    6 faces x 4 corners
//!               triangles 36 absolute indices into the full vertex buffer
//! ```
//!
//! Every face is emitted, interior ones included, so removing a neighbour
//! never opens a hole in the surface.

use std::collections::HashSet;

use glam::Vec3;
use voxrig_core::{BoneBinding, GridSize, RigConfig, Voxel, VoxelCoord, VoxelGeometry, VoxelSet, VoxelVertex};

use crate::error::{AssetError, AssetResult};
use crate::vox::VoxFile;

/// Vertices contributed by one voxel.
pub const VERTICES_PER_VOXEL: usize = 24;

/// Triangle indices contributed by one voxel.
pub const INDICES_PER_VOXEL: usize = 36;

/// Outward normal and counter-clockwise corners (unit cube in [-1, 1]).
const FACES: [([f32; 3], [[f32; 3]; 4]); 6] = [
    ([1.0, 0.0, 0.0], [[1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0], [1.0, -1.0, 1.0]]),
    ([-1.0, 0.0, 0.0], [[-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, 1.0, -1.0], [-1.0, -1.0, -1.0]]),
    ([0.0, 1.0, 0.0], [[-1.0, 1.0, -1.0], [-1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, -1.0]]),
    ([0.0, -1.0, 0.0], [[-1.0, -1.0, 1.0], [-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0]]),
    ([0.0, 0.0, 1.0], [[1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, -1.0, 1.0]]),
    ([0.0, 0.0, -1.0], [[-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [1.0, 1.0, -1.0], [1.0, -1.0, -1.0]]),
];

/// One voxel to generate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoxelSeed {
    /// Grid coordinate.
    pub coord: VoxelCoord,
    /// Bone assignment.
    pub bone: BoneBinding,
    /// RGBA8 color.
    pub color: [u8; 4],
}

impl VoxelSeed {
    /// Creates a seed.
    #[must_use]
    pub fn new(coord: VoxelCoord, bone: impl Into<BoneBinding>, color: [u8; 4]) -> Self {
        Self { coord, bone: bone.into(), color }
    }
}

/// Builds voxel sets for a fixed grid.
#[derive(Clone, Debug)]
pub struct VoxelMeshGenerator {
    size: GridSize,
    unit_scale: f32,
    origin: Vec3,
}

impl VoxelMeshGenerator {
    /// Generator for `size` with the body-center origin at the middle of
    /// the floor: `(sx / 2, 0, sz / 2)`.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero-sized or oversized grid, or a
    /// non-positive scale.
    pub fn new(size: GridSize, unit_scale: f32) -> AssetResult<Self> {
        match size.checked_cells() {
            Some(0) => return Err(AssetError::EmptyGrid(size)),
            None => return Err(AssetError::GridTooLarge(size)),
            Some(_) => {}
        }
        if !unit_scale.is_finite() || unit_scale <= 0.0 {
            return Err(AssetError::InvalidUnitScale(unit_scale));
        }
        let origin = Vec3::new(size.x as f32 / 2.0, 0.0, size.z as f32 / 2.0);
        Ok(Self { size, unit_scale, origin })
    }

    /// Body-local center of the cell at `coord`.
    #[inline]
    #[must_use]
    pub fn position_from_center(&self, coord: VoxelCoord) -> Vec3 {
        (coord.center() - self.origin) * self.unit_scale
    }

    /// Generates voxels in seed order.
    ///
    /// # Errors
    ///
    /// Returns an error if a seed is outside the grid or two seeds share a
    /// coordinate.
    pub fn generate(&self, seeds: &[VoxelSeed]) -> AssetResult<VoxelSet> {
        let mut seen = HashSet::with_capacity(seeds.len());
        let mut voxels = Vec::with_capacity(seeds.len());

        for (k, seed) in seeds.iter().enumerate() {
            if !self.size.contains(seed.coord) {
                return Err(AssetError::OutOfGrid { coord: seed.coord, size: self.size });
            }
            if !seen.insert(seed.coord) {
                return Err(AssetError::DuplicateCoordinate(seed.coord));
            }
            let position_from_center = self.position_from_center(seed.coord);
            voxels.push(Voxel {
                coord: seed.coord,
                bone: seed.bone,
                position_from_center,
                color: seed.color,
                geometry: self.cube(k, position_from_center, seed.color),
            });
        }

        tracing::debug!(voxels = voxels.len(), size = ?self.size, "voxel set generated");
        Ok(VoxelSet { size: self.size, unit_scale: self.unit_scale, voxels })
    }

    fn cube(&self, k: usize, center: Vec3, color: [u8; 4]) -> VoxelGeometry {
        let half = self.unit_scale * 0.5;
        let color = color.map(|c| f32::from(c) / 255.0);
        let base = (k * VERTICES_PER_VOXEL) as u32;

        let mut vertices = Vec::with_capacity(VERTICES_PER_VOXEL);
        let mut triangles = Vec::with_capacity(INDICES_PER_VOXEL);
        for (face, (normal, corners)) in FACES.iter().enumerate() {
            for corner in corners {
                let position = center + Vec3::from(*corner) * half;
                vertices.push(VoxelVertex { position: position.to_array(), normal: *normal, color });
            }
            let f = base + face as u32 * 4;
            triangles.extend_from_slice(&[f, f + 1, f + 2, f, f + 2, f + 3]);
        }
        VoxelGeometry { vertices, triangles }
    }

    /// Imports a `.vox` model, mapping palette indices to bones through
    /// `config.palette` and using `config.voxel.unit_scale`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file declares an empty grid or repeats a
    /// coordinate.
    pub fn from_vox(file: &VoxFile, config: &RigConfig) -> AssetResult<VoxelSet> {
        let generator = Self::new(file.grid_size(), config.voxel.unit_scale)?;
        let seeds: Vec<VoxelSeed> = file
            .voxels
            .iter()
            .map(|v| VoxelSeed {
                coord: VoxFile::to_grid(v),
                bone: config.bone_for_palette(v.color_index).map_or(BoneBinding::Unassigned, BoneBinding::Bone),
                color: file.palette.get(v.color_index).to_rgba8(),
            })
            .collect();
        let unassigned = seeds.iter().filter(|s| s.bone == BoneBinding::Unassigned).count();
        if unassigned > 0 {
            tracing::info!(name = %file.name, unassigned, "palette indices without a bone");
        }
        generator.generate(&seeds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxrig_core::{CanonicalBone, VoxelSource};

    fn generator() -> VoxelMeshGenerator {
        VoxelMeshGenerator::new(GridSize::new(4, 4, 2), 0.5).unwrap()
    }

    #[test]
    fn test_cube_layout() {
        let seeds = [
            VoxelSeed::new(VoxelCoord::new(0, 0, 0), CanonicalBone::Hips, [255; 4]),
            VoxelSeed::new(VoxelCoord::new(1, 0, 0), BoneBinding::Unassigned, [0, 0, 0, 255]),
        ];
        let set = generator().generate(&seeds).unwrap();
        let second = &set.voxels()[1];
        assert_eq!(second.vertex_points().len(), VERTICES_PER_VOXEL);
        assert_eq!(second.triangle_indices().len(), INDICES_PER_VOXEL);
        let min = second.triangle_indices().iter().min().copied().unwrap();
        let max = second.triangle_indices().iter().max().copied().unwrap();
        assert_eq!((min, max), (24, 47));
    }

    #[test]
    fn test_position_from_center() {
        let g = generator();
        assert_eq!(g.position_from_center(VoxelCoord::new(2, 0, 1)), Vec3::new(0.25, 0.25, 0.25));
        assert_eq!(g.position_from_center(VoxelCoord::new(0, 3, 0)), Vec3::new(-0.75, 1.75, -0.25));
    }

    #[test]
    fn test_faces_point_outward() {
        let set = generator().generate(&[VoxelSeed::new(VoxelCoord::new(1, 1, 1), CanonicalBone::Head, [255; 4])]).unwrap();
        let voxel = &set.voxels()[0];
        let center = voxel.position_from_center;
        for tri in voxel.triangle_indices().chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(voxel.vertex_points()[i as usize].position));
            let normal = Vec3::from(voxel.vertex_points()[tri[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(normal) > 0.0);
            assert!((a - center).dot(normal) > 0.0);
        }
    }

    #[test]
    fn test_rejects_bad_seeds() {
        let g = generator();
        let outside = VoxelSeed::new(VoxelCoord::new(0, 0, 2), CanonicalBone::Hips, [255; 4]);
        assert!(matches!(g.generate(&[outside]), Err(AssetError::OutOfGrid { .. })));

        let a = VoxelSeed::new(VoxelCoord::new(0, 0, 0), CanonicalBone::Hips, [255; 4]);
        assert!(matches!(g.generate(&[a, a]), Err(AssetError::DuplicateCoordinate(_))));

        assert!(matches!(VoxelMeshGenerator::new(GridSize::new(0, 1, 1), 1.0), Err(AssetError::EmptyGrid(_))));
        assert!(matches!(VoxelMeshGenerator::new(GridSize::new(1, 1, 1), 0.0), Err(AssetError::InvalidUnitScale(_))));
        assert!(matches!(
            VoxelMeshGenerator::new(GridSize::new(2048, 2048, 2048), 1.0),
            Err(AssetError::GridTooLarge(_))
        ));
    }
}
