//! Benchmarks for rig generation and local destruction.
//!
//! Run with: cargo bench --package voxrig --bench rig_benchmark

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use glam::Vec3;
use voxrig::VoxelHumanoid;
use voxrig_assets::ProceduralHumanoids;
use voxrig_core::{RigConfig, VoxelSet};

fn humanoid_voxels() -> VoxelSet {
    ProceduralHumanoids::humanoid().build(0.1).unwrap()
}

fn generated() -> VoxelHumanoid {
    let set = humanoid_voxels();
    let mut humanoid = VoxelHumanoid::new(RigConfig::default(), &set).unwrap();
    humanoid.generate_all().unwrap();
    humanoid
}

fn benchmark_generate_all(c: &mut Criterion) {
    let set = humanoid_voxels();
    let mut group = c.benchmark_group("generate_all");
    group.throughput(Throughput::Elements(set.voxels.len() as u64));

    group.bench_function("procedural_humanoid", |b| {
        b.iter_batched(
            || VoxelHumanoid::new(RigConfig::default(), &set).unwrap(),
            |mut humanoid| black_box(humanoid.generate_all().unwrap()),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn benchmark_damage(c: &mut Criterion) {
    let mut group = c.benchmark_group("damage");

    // Head shot: destroys voxels and rebuilds the triangle buffer.
    group.bench_function("head_impact", |b| {
        b.iter_batched(
            generated,
            |mut humanoid| black_box(humanoid.on_impact(black_box(Vec3::new(0.0, 1.6, 0.0)), Some(0.2))),
            BatchSize::SmallInput,
        );
    });

    // Miss: pure scan with no rebuild.
    let mut humanoid = generated();
    group.bench_function("miss", |b| {
        b.iter(|| black_box(humanoid.on_impact(black_box(Vec3::new(5.0, 0.0, 0.0)), Some(0.2))));
    });

    group.finish();
}

criterion_group!(benches, benchmark_generate_all, benchmark_damage);
criterion_main!(benches);
