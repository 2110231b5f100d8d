//! The voxel volume: a bounded grid of voxel records plus parallel state.
//!
//! Four grids are kept in lockstep and indexed by coordinate:
//!
//! ```text
//! active[c]    bool           cleared by damage, never re-set by the core
//! voxel_map[c] Option<voxel>  authored voxel at c
//! bindings[c]  Option<(local position, joint)>   written by BoneAssigner
//! ```
//!
//! Invariant: `active[c]` implies `voxel_map[c].is_some()`.
//!
//! Coordinates are not validated here. Callers guarantee that every
//! coordinate lies inside the grid and appears at most once; an
//! out-of-range or repeated coordinate panics.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec3;
use ndshape::{RuntimeShape, Shape};

use crate::bones::CanonicalBone;
use crate::bounds::Aabb;
use crate::skeleton::{JointId, SkeletonProvider};
use crate::voxel::{GridSize, Voxel, VoxelCoord, VoxelSource};

/// Cached pair used to recompute a voxel's live world position in O(1).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoxelBinding {
    /// Voxel center in the controlling joint's space.
    pub local_position: Vec3,
    /// Controlling joint.
    pub joint: JointId,
}

/// One recorded activity flip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActivityChange {
    /// Voxel that flipped.
    pub coord: VoxelCoord,
    /// New state.
    pub active: bool,
}

/// Voxels authored for one canonical bone, with their body-local bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct BoneCluster {
    /// The bone.
    pub bone: CanonicalBone,
    /// Member coordinates in generation order.
    pub coords: Vec<VoxelCoord>,
    /// Union of the members' cubes in body-local space.
    pub bounds: Aabb,
}

/// Fixed-size grid of voxel records.
pub struct VoxelVolume {
    size: GridSize,
    shape: RuntimeShape<u32, 3>,
    unit_scale: f32,
    voxels: Vec<Voxel>,
    active: Vec<bool>,
    voxel_map: Vec<Option<u32>>,
    bindings: Vec<Option<VoxelBinding>>,
    changes: Vec<ActivityChange>,
}

impl VoxelVolume {
    /// Allocates the grids and marks every voxel of the source active.
    ///
    /// # Panics
    ///
    /// Panics if a voxel lies outside the source's grid.
    #[must_use]
    pub fn init<S: VoxelSource + ?Sized>(source: &S) -> Self {
        Self::new(source.grid_size(), source.unit_scale(), source.voxels().to_vec())
    }

    /// Builds a volume from owned voxels.
    ///
    /// # Panics
    ///
    /// Panics if the cell count overflows `u32`, if a voxel lies outside
    /// `size`, or if two voxels share a coordinate.
    #[must_use]
    pub fn new(size: GridSize, unit_scale: f32, voxels: Vec<Voxel>) -> Self {
        assert!(size.checked_cells().is_some(), "grid {size:?} has too many cells");
        let cells = size.volume();
        let mut volume = Self {
            size,
            shape: RuntimeShape::<u32, 3>::new([size.x, size.y, size.z]),
            unit_scale,
            voxels: Vec::new(),
            active: vec![false; cells],
            voxel_map: vec![None; cells],
            bindings: vec![None; cells],
            changes: Vec::new(),
        };
        for (i, voxel) in voxels.iter().enumerate() {
            let idx = volume.index(voxel.coord);
            assert!(volume.voxel_map[idx].is_none(), "duplicate voxel at {}", voxel.coord);
            volume.active[idx] = true;
            volume.voxel_map[idx] = Some(i as u32);
        }
        volume.voxels = voxels;
        volume
    }

    #[inline]
    fn index(&self, c: VoxelCoord) -> usize {
        assert!(self.size.contains(c), "voxel coordinate {c} outside grid {:?}", self.size);
        self.shape.linearize(c.to_array()) as usize
    }

    /// Grid dimensions.
    #[inline]
    #[must_use]
    pub fn size(&self) -> GridSize {
        self.size
    }

    /// World size of one voxel edge.
    #[inline]
    #[must_use]
    pub fn unit_scale(&self) -> f32 {
        self.unit_scale
    }

    /// All voxels in generation order.
    #[inline]
    #[must_use]
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    /// Whether the voxel at `c` is active.
    #[inline]
    #[must_use]
    pub fn is_active(&self, c: VoxelCoord) -> bool {
        self.active[self.index(c)]
    }

    /// Voxel at `c`, if the cell is occupied.
    #[must_use]
    pub fn get(&self, c: VoxelCoord) -> Option<&Voxel> {
        self.voxel_map[self.index(c)].map(|i| &self.voxels[i as usize])
    }

    /// Sets the activity flag at `c`.
    ///
    /// Returns `true` and records an [`ActivityChange`] only when the flag
    /// actually flips; redundant calls are no-ops.
    ///
    /// # Panics
    ///
    /// Panics when activating an empty cell.
    pub fn set_active(&mut self, c: VoxelCoord, active: bool) -> bool {
        let idx = self.index(c);
        if self.active[idx] == active {
            return false;
        }
        assert!(!active || self.voxel_map[idx].is_some(), "cannot activate empty cell {c}");
        self.active[idx] = active;
        self.changes.push(ActivityChange { coord: c, active });
        true
    }

    /// Takes every flip recorded since the last drain.
    pub fn drain_changes(&mut self) -> Vec<ActivityChange> {
        std::mem::take(&mut self.changes)
    }

    /// Number of active voxels.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.voxels.iter().filter(|v| self.is_active(v.coord)).count()
    }

    /// Cached binding of the voxel at `c`.
    #[inline]
    #[must_use]
    pub fn binding(&self, c: VoxelCoord) -> Option<VoxelBinding> {
        self.bindings[self.index(c)]
    }

    /// Stores (or clears) the cached binding at `c`.
    pub fn set_binding(&mut self, c: VoxelCoord, binding: Option<VoxelBinding>) {
        let idx = self.index(c);
        self.bindings[idx] = binding;
    }

    /// Forgets every cached binding.
    pub fn clear_bindings(&mut self) {
        self.bindings.fill(None);
    }

    /// Live world position of the voxel at `c` under the current pose.
    ///
    /// `None` when the voxel has no cached binding.
    #[must_use]
    pub fn world_position<P: SkeletonProvider + ?Sized>(&self, c: VoxelCoord, skeleton: &P) -> Option<Vec3> {
        self.binding(c)
            .map(|b| skeleton.joint_to_world(b.joint).transform_point3(b.local_position))
    }

    /// Groups voxels by authored bone and computes each group's bounds.
    ///
    /// Unassigned voxels belong to no cluster.
    #[must_use]
    pub fn bone_clusters(&self) -> BTreeMap<CanonicalBone, BoneCluster> {
        let mut clusters: BTreeMap<CanonicalBone, BoneCluster> = BTreeMap::new();
        for voxel in &self.voxels {
            let Some(bone) = voxel.bone.bone() else { continue };
            let cube = voxel.bounds(self.unit_scale);
            clusters
                .entry(bone)
                .and_modify(|c| {
                    c.coords.push(voxel.coord);
                    c.bounds = c.bounds.union(&cube);
                })
                .or_insert_with(|| BoneCluster { bone, coords: vec![voxel.coord], bounds: cube });
        }
        clusters
    }
}

impl fmt::Debug for VoxelVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoxelVolume")
            .field("size", &self.size)
            .field("unit_scale", &self.unit_scale)
            .field("voxels", &self.voxels.len())
            .field("active", &self.active_count())
            .finish()
    }
}
