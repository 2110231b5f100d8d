//! # Asset Error Types
//!
//! Errors raised while reading or generating voxel sources.

use std::io;

use thiserror::Error;
use voxrig_core::{GridSize, VoxelCoord};

/// Errors that can occur while reading a `.vox` file.
#[derive(Error, Debug)]
pub enum VoxError {
    /// File I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Invalid VOX file format.
    #[error("invalid VOX format: {0}")]
    InvalidFormat(String),

    /// Unsupported VOX version.
    #[error("unsupported VOX version: {0}")]
    UnsupportedVersion(u32),

    /// Missing required chunk.
    #[error("missing required chunk: {0}")]
    MissingChunk(&'static str),

    /// A voxel lies outside the declared model size.
    #[error("voxel ({x}, {y}, {z}) outside model size {size:?}")]
    VoxelOutOfBounds {
        /// X in file axes.
        x: u8,
        /// Y in file axes.
        y: u8,
        /// Z in file axes.
        z: u8,
        /// Declared size in file axes.
        size: [u32; 3],
    },
}

/// Errors that can occur while generating a voxel set.
#[derive(Error, Debug)]
pub enum AssetError {
    /// The `.vox` source could not be read.
    #[error(transparent)]
    Vox(#[from] VoxError),

    /// A seed lies outside the grid.
    #[error("voxel {coord} outside grid {size:?}")]
    OutOfGrid {
        /// Offending coordinate.
        coord: VoxelCoord,
        /// Grid dimensions.
        size: GridSize,
    },

    /// Two seeds share a coordinate.
    #[error("duplicate voxel at {0}")]
    DuplicateCoordinate(VoxelCoord),

    /// Grid has a zero dimension.
    #[error("empty grid {0:?}")]
    EmptyGrid(GridSize),

    /// Grid has more cells than a `u32` index can address.
    #[error("grid {0:?} is too large")]
    GridTooLarge(GridSize),

    /// Voxel edge length is not positive.
    #[error("unit scale must be > 0, got {0}")]
    InvalidUnitScale(f32),
}

/// Result type for `.vox` reading.
pub type VoxResult<T> = Result<T, VoxError>;

/// Result type for voxel set generation.
pub type AssetResult<T> = Result<T, AssetError>;
