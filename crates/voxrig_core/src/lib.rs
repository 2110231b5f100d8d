//! # VOXRIG Core
//!
//! Turns a voxel humanoid into a skinned, destructible rig.
//!
//! ```text
//! VoxelSource ──► VoxelVolume ──► SkeletonBuilder ──► BoneAssigner
//!                      │                                   │
//!                      │          ┌────────────────────────┘
//!                      ▼          ▼
//!                 MeshAssembler ◄── DamageEngine (triangles only)
//!                      │
//!                      ▼
//!                 RigExporter
//! ```
//!
//! ## Design Principles
//!
//! 1. **One bone per voxel**: skinning weights are always 1.0 to a single joint
//! 2. **Partial rigs proceed**: missing bones and clusters are logged, not fatal
//! 3. **Structural violations abort**: index-aligned buffers never go out corrupt
//! 4. **Single owner**: a volume and its skeleton are mutated by one caller at a time

#![deny(unsafe_code)]
#![deny(missing_docs)]

pub mod assign;
pub mod bones;
pub mod bounds;
pub mod builder;
pub mod config;
pub mod damage;
pub mod error;
pub mod mesh;
pub mod rig;
pub mod skeleton;
pub mod volume;
pub mod voxel;

pub use assign::{AssignmentReport, BoneAssigner, BoneMembership, UNASSIGNED_BONE};
pub use bones::{CanonicalBone, HierarchyParent, CANONICAL_BONES, CANONICAL_BONE_COUNT};
pub use bounds::Aabb;
pub use builder::{Anchor, BuildOptions, BuiltSkeleton, ConnectionRule, ConnectionRules, SkeletonBuilder, SkeletonReport};
pub use config::RigConfig;
pub use damage::{DamageEngine, DestructionObserver, VoxelDestroyed};
pub use error::{RigError, RigResult};
pub use mesh::{BoneWeight, MeshAssembler, MeshBuffers};
pub use rig::{HumanBone, HumanDescription, RigExporter, SkeletonBone};
pub use skeleton::{JointId, JointTransform, RootTransformProvider, Skeleton, SkeletonProvider};
pub use volume::{ActivityChange, BoneCluster, VoxelBinding, VoxelVolume};
pub use voxel::{BoneBinding, GridSize, Voxel, VoxelCoord, VoxelGeometry, VoxelSet, VoxelSource, VoxelVertex};
