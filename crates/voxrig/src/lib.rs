//! # VOXRIG
//!
//! Destructible voxel humanoids with generated skeletons.
//!
//! ```text
//!   voxrig_assets                voxrig_core                  host
//! ┌──────────────┐   VoxelSet  ┌──────────────┐  MeshBuffers ┌──────────┐
//! │ .vox import  │ ──────────► │ VoxelHumanoid│ ───────────► │ renderer │
//! │ procedural   │             │  skeleton    │  triangles   └──────────┘
//! └──────────────┘             │  damage      │ ──────────► ChannelSink
//!                              └──────────────┘             DebrisEmitter
//! ```
//!
//! The library never installs a tracing subscriber. The `voxrig_demo`
//! binary does.

#![deny(unsafe_code)]
#![deny(missing_docs)]

pub mod effects;
pub mod events;
pub mod humanoid;
pub mod settings;

pub use effects::{DebrisEmitter, Particle};
pub use events::{destruction_channel, ChannelSink, DestructionReceiver};
pub use humanoid::{GenerationReport, RendererSink, SharedHumanoid, VoxelHumanoid, ROOT_JOINT_NAME};
pub use settings::{DemoSettings, Impact, Settings};
