//! # VOXRIG Assets
//!
//! Voxel sources for the rig core: MagicaVoxel import, the cube mesh
//! generator and code-defined humanoids.
//!
//! ```rust,ignore
//! use voxrig_assets::{ProceduralHumanoids, VoxLoader, VoxelMeshGenerator};
//!
//! let set = ProceduralHumanoids::humanoid().build(0.1)?;
//! let file = VoxLoader::load("assets/knight.vox")?;
//! let imported = VoxelMeshGenerator::from_vox(&file, &config)?;
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod generator;
pub mod procedural;
pub mod vox;

pub use error::{AssetError, AssetResult, VoxError, VoxResult};
pub use generator::{VoxelMeshGenerator, VoxelSeed, INDICES_PER_VOXEL, VERTICES_PER_VOXEL};
pub use procedural::{HumanoidBuilder, ProceduralHumanoids};
pub use vox::{VoxColor, VoxFile, VoxLoader, VoxPalette, VoxVoxel};
