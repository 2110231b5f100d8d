//! # VOXRIG Demo
//!
//! Headless run of the whole pipeline: build a humanoid, generate its rig,
//! shoot it a few times and report what broke.
//!
//! ```bash
//! # Built-in procedural humanoid with default impacts
//! ./voxrig_demo
//!
//! # Custom settings, print the humanoid description as TOML
//! ./voxrig_demo settings.toml --avatar
//!
//! # More detail
//! RUST_LOG=voxrig=debug ./voxrig_demo
//! ```

use std::sync::Arc;

use anyhow::{bail, Context};
use glam::Vec3;
use parking_lot::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use voxrig::{destruction_channel, events::DEFAULT_CAPACITY, DebrisEmitter, Settings, VoxelHumanoid};
use voxrig_assets::{ProceduralHumanoids, VoxLoader, VoxelMeshGenerator};
use voxrig_core::{VoxelDestroyed, VoxelSet};

/// Simulated seconds of debris after the last impact.
const DEBRIS_SECONDS: f32 = 1.0;
const DEBRIS_STEP: f32 = 1.0 / 60.0;

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}

fn load_voxels(settings: &Settings) -> anyhow::Result<VoxelSet> {
    if let Some(path) = &settings.demo.vox_path {
        let file = VoxLoader::load(path).with_context(|| format!("loading {}", path.display()))?;
        return Ok(VoxelMeshGenerator::from_vox(&file, &settings.rig)?);
    }
    let Some(model) = ProceduralHumanoids::by_name(&settings.demo.model) else {
        bail!("unknown model '{}' (expected 'humanoid' or 'bust')", settings.demo.model);
    };
    Ok(model.build(settings.rig.voxel.unit_scale)?)
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let print_avatar = args.iter().any(|a| a == "--avatar");
    let settings = match args.iter().find(|a| !a.starts_with("--")) {
        Some(path) => Settings::load(path).with_context(|| format!("reading settings from {path}"))?,
        None => Settings::default(),
    };
    init_tracing(&settings.log_level);

    let voxels = load_voxels(&settings)?;
    let mut humanoid = VoxelHumanoid::new(settings.rig.clone(), &voxels)?;

    let (sink, receiver) = destruction_channel(DEFAULT_CAPACITY);
    let debris = Arc::new(Mutex::new(DebrisEmitter::new(settings.demo.seed)));
    humanoid.add_observer(sink.clone());
    humanoid.add_observer({
        let debris = Arc::clone(&debris);
        move |event: &VoxelDestroyed| debris.lock().emit(event)
    });

    let report = humanoid.generate_all()?;
    println!(
        "generated {} joints, {} vertices, {} triangles ({} voxels unassigned, {} bones missing)",
        report.joints,
        report.vertices,
        report.triangles,
        report.assignment.unassigned,
        report.skeleton.missing_clusters.len()
    );

    for impact in &settings.demo.impacts {
        let destroyed = humanoid.on_impact(Vec3::from(impact.point), impact.radius);
        println!("impact at {:?}: {} voxels destroyed", impact.point, destroyed.len());
    }

    let events = receiver.drain();
    let mut per_bone = std::collections::BTreeMap::new();
    for event in &events {
        *per_bone.entry(event.bone).or_insert(0usize) += 1;
    }
    for (bone, count) in &per_bone {
        println!("  {bone}: {count}");
    }
    if sink.dropped() > 0 {
        println!("  ({} events dropped)", sink.dropped());
    }

    let mut debris = debris.lock();
    let spawned = debris.particles().len();
    let steps = (DEBRIS_SECONDS / DEBRIS_STEP).round() as usize;
    for _ in 0..steps {
        debris.update(DEBRIS_STEP);
    }
    println!(
        "{} active voxels remain, {spawned} debris particles spawned, {} still airborne",
        humanoid.volume().active_count(),
        debris.particles().len()
    );

    if print_avatar {
        if let Some(avatar) = humanoid.avatar() {
            println!("{}", avatar.to_toml()?);
        }
    }
    Ok(())
}
