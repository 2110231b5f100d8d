//! Voxel records and the voxel source boundary.
//!
//! A [`Voxel`] is authored content: it is produced once by a voxel source
//! (see `voxrig_assets`) and never changes afterwards. Its identity is its
//! grid coordinate.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::bones::CanonicalBone;
use crate::bounds::Aabb;

/// Integer grid coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VoxelCoord {
    /// X coordinate.
    pub x: u32,
    /// Y coordinate.
    pub y: u32,
    /// Z coordinate.
    pub z: u32,
}

impl VoxelCoord {
    /// Creates a new coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Coordinate as an array, in ndshape order.
    #[inline]
    #[must_use]
    pub const fn to_array(self) -> [u32; 3] {
        [self.x, self.y, self.z]
    }

    /// Cell center in grid units.
    #[inline]
    #[must_use]
    pub fn center(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32) + Vec3::splat(0.5)
    }
}

impl fmt::Display for VoxelCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Grid dimensions in voxels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    /// Width (X).
    pub x: u32,
    /// Height (Y).
    pub y: u32,
    /// Depth (Z).
    pub z: u32,
}

impl GridSize {
    /// Creates new grid dimensions.
    #[inline]
    #[must_use]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Total cell count.
    #[inline]
    #[must_use]
    pub const fn volume(&self) -> usize {
        self.x as usize * self.y as usize * self.z as usize
    }

    /// Total cell count, or `None` when it does not fit the `u32` grid
    /// index.
    #[inline]
    #[must_use]
    pub const fn checked_cells(&self) -> Option<u32> {
        match self.x.checked_mul(self.y) {
            Some(xy) => xy.checked_mul(self.z),
            None => None,
        }
    }

    /// True when the coordinate lies inside `[0,x) x [0,y) x [0,z)`.
    #[inline]
    #[must_use]
    pub const fn contains(&self, c: VoxelCoord) -> bool {
        c.x < self.x && c.y < self.y && c.z < self.z
    }
}

/// The single bone controlling a voxel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BoneBinding {
    /// No bone was authored for this voxel.
    #[default]
    Unassigned,
    /// The voxel follows this bone.
    Bone(CanonicalBone),
}

impl BoneBinding {
    /// The bone, if any.
    #[inline]
    #[must_use]
    pub const fn bone(self) -> Option<CanonicalBone> {
        match self {
            Self::Unassigned => None,
            Self::Bone(b) => Some(b),
        }
    }
}

impl fmt::Display for BoneBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unassigned => f.write_str("Unassigned"),
            Self::Bone(bone) => bone.fmt(f),
        }
    }
}

impl From<CanonicalBone> for BoneBinding {
    fn from(bone: CanonicalBone) -> Self {
        Self::Bone(bone)
    }
}

/// Vertex contributed by a voxel, in body-local space.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct VoxelVertex {
    /// Position [x, y, z].
    pub position: [f32; 3],
    /// Face normal [nx, ny, nz].
    pub normal: [f32; 3],
    /// Linear RGBA color.
    pub color: [f32; 4],
}

/// Geometry payload of one voxel.
///
/// Triangle indices are absolute indices into the full mesh vertex buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VoxelGeometry {
    /// Vertex points this voxel contributes.
    pub vertices: Vec<VoxelVertex>,
    /// Triangle indices this voxel contributes.
    pub triangles: Vec<u32>,
}

/// A single occupied cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Voxel {
    /// Grid coordinate (identity).
    pub coord: VoxelCoord,
    /// Authored bone assignment.
    pub bone: BoneBinding,
    /// Cell center relative to the body-center frame.
    pub position_from_center: Vec3,
    /// Palette color (RGBA8).
    pub color: [u8; 4],
    /// Mesh contribution.
    pub geometry: VoxelGeometry,
}

impl Voxel {
    /// Vertex points contributed to the mesh.
    #[inline]
    #[must_use]
    pub fn vertex_points(&self) -> &[VoxelVertex] {
        &self.geometry.vertices
    }

    /// Triangle indices contributed to the mesh.
    #[inline]
    #[must_use]
    pub fn triangle_indices(&self) -> &[u32] {
        &self.geometry.triangles
    }

    /// Cube occupied by this voxel in body-local space.
    #[must_use]
    pub fn bounds(&self, unit_scale: f32) -> Aabb {
        Aabb::from_center_size(self.position_from_center, Vec3::splat(unit_scale))
    }
}

/// Supplies the static voxel list and grid dimensions.
pub trait VoxelSource {
    /// Grid dimensions.
    fn grid_size(&self) -> GridSize;
    /// World size of one voxel edge.
    fn unit_scale(&self) -> f32;
    /// Occupied voxels in generation order.
    fn voxels(&self) -> &[Voxel];
}

/// Plain owned voxel source.
#[derive(Clone, Debug)]
pub struct VoxelSet {
    /// Grid dimensions.
    pub size: GridSize,
    /// World size of one voxel edge.
    pub unit_scale: f32,
    /// Occupied voxels in generation order.
    pub voxels: Vec<Voxel>,
}

impl VoxelSource for VoxelSet {
    fn grid_size(&self) -> GridSize {
        self.size
    }

    fn unit_scale(&self) -> f32 {
        self.unit_scale
    }

    fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }
}
