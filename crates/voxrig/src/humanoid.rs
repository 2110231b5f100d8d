//! # Voxel Humanoid
//!
//! The host-facing entity. It owns one volume, one skeleton and the mesh
//! built from them, and is driven by explicit calls:
//!
//! ```text
//! initialize ──► generate_all ──► on_impact / damage ──► on_impact ...
//!   volume        skeleton          deactivate voxels
//!   bindings      bindings          rebuild triangle buffer
//!                 mesh, avatar      push triangles to the renderer
//! ```
//!
//! One instance is mutated by one caller at a time. Hosts that share an
//! instance across threads wrap it in a [`SharedHumanoid`].

use std::sync::Arc;

use glam::Vec3;
use parking_lot::Mutex;
use voxrig_core::builder::check_joint_list;
use voxrig_core::{
    AssignmentReport, BoneAssigner, BoneMembership, BuildOptions, DamageEngine, DestructionObserver, HumanDescription,
    JointId, JointTransform, MeshAssembler, MeshBuffers, RigConfig, RigExporter, RigResult, RootTransformProvider,
    Skeleton, SkeletonBuilder, SkeletonReport, VoxelDestroyed, VoxelSource, VoxelVolume,
};

/// Name of the body root joint of generated skeletons.
pub const ROOT_JOINT_NAME: &str = "VoxelRoot";

/// Receives generated meshes for display.
pub trait RendererSink: Send {
    /// Called after every full generation.
    fn upload_mesh(&mut self, mesh: &MeshBuffers, joints: &[JointId], skeleton: &Skeleton);
    /// Called when damage changed the visible triangle set.
    fn update_triangles(&mut self, triangles: &[u32]);
}

/// Summary of one `generate_all` call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Bone assignment against the new skeleton.
    pub assignment: AssignmentReport,
    /// Skeleton anomalies.
    pub skeleton: SkeletonReport,
    /// Vertex count of the mesh.
    pub vertices: usize,
    /// Triangle count of the mesh.
    pub triangles: usize,
    /// Joint count (canonical bones).
    pub joints: usize,
}

/// A humanoid instance shared behind one lock.
pub type SharedHumanoid = Arc<Mutex<VoxelHumanoid>>;

/// A destructible voxel humanoid.
pub struct VoxelHumanoid {
    config: RigConfig,
    volume: VoxelVolume,
    skeleton: Skeleton,
    joints: Vec<JointId>,
    membership: BoneMembership,
    mesh: Option<MeshBuffers>,
    avatar: Option<HumanDescription>,
    engine: DamageEngine,
    renderer: Option<Box<dyn RendererSink>>,
}

impl VoxelHumanoid {
    /// Builds the volume from `source` and binds it against `rig`.
    ///
    /// With `rig` set to `None` the humanoid starts with a bare root at
    /// `root` and bindings are deferred to [`Self::generate_all`]. A
    /// supplied rig carries its own root and `root` is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn initialize<S: VoxelSource + ?Sized>(
        config: RigConfig,
        source: &S,
        rig: Option<Skeleton>,
        root: JointTransform,
        observers: Vec<Box<dyn DestructionObserver>>,
    ) -> RigResult<Self> {
        config.validate()?;
        let mut volume = VoxelVolume::init(source);
        let (skeleton, membership) = match rig {
            Some(rig) => {
                let (membership, report) = BoneAssigner::assign(&mut volume, &rig, &rig);
                tracing::info!(bound = report.bound, missing = report.missing_bones.len(), "bound to supplied rig");
                (rig, membership)
            }
            None => (Skeleton::new(ROOT_JOINT_NAME, root), BoneMembership::default()),
        };
        tracing::info!(voxels = volume.voxels().len(), size = ?volume.size(), "humanoid initialized");

        Ok(Self {
            config,
            volume,
            skeleton,
            joints: Vec::new(),
            membership,
            mesh: None,
            avatar: None,
            engine: DamageEngine::new(observers),
            renderer: None,
        })
    }

    /// Initializes with no external rig, no observers and the root at the origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new<S: VoxelSource + ?Sized>(config: RigConfig, source: &S) -> RigResult<Self> {
        Self::initialize(config, source, None, JointTransform::IDENTITY, Vec::new())
    }

    /// Rebinds the volume against an externally supplied rig.
    ///
    /// The generated mesh, if any, is dropped: its joint list no longer
    /// matches.
    pub fn attach_skeleton(&mut self, rig: Skeleton) -> AssignmentReport {
        let (membership, report) = BoneAssigner::assign(&mut self.volume, &rig, &rig);
        self.skeleton = rig;
        self.membership = membership;
        self.joints.clear();
        self.mesh = None;
        self.avatar = None;
        report
    }

    /// Sets the renderer that receives meshes and triangle updates.
    pub fn set_renderer(&mut self, renderer: Box<dyn RendererSink>) {
        self.renderer = Some(renderer);
    }

    /// Registers a destruction observer.
    pub fn add_observer<O: DestructionObserver + 'static>(&mut self, observer: O) {
        self.engine.add_observer(observer);
    }

    /// Rebuilds skeleton, bindings, mesh and avatar from the volume.
    ///
    /// The new skeleton keeps the current root transform. On error nothing
    /// is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`voxrig_core::RigError::StructuralMismatch`] if the joint
    /// list does not line up with the canonical bones.
    pub fn generate_all(&mut self) -> RigResult<GenerationReport> {
        let root = self.skeleton.joint(self.skeleton.root());
        let options = BuildOptions {
            root_name: root.name.clone(),
            root: root.local,
            with_colliders: self.config.skeleton.with_colliders,
        };
        let built = SkeletonBuilder::build(&self.volume.bone_clusters(), &self.config.connection_rules(), &options);
        check_joint_list(&built.joints)?;

        let (membership, assignment) = BoneAssigner::assign(&mut self.volume, &built.skeleton, &built.skeleton);
        let mesh_root = built.skeleton.root_to_world();
        let mesh = MeshAssembler::generate_all(&self.volume, &membership, &built.skeleton, &built.joints, mesh_root)?;
        let avatar = RigExporter::export(&built.skeleton, &self.config.avatar);

        let report = GenerationReport {
            assignment,
            skeleton: built.report,
            vertices: mesh.vertices.len(),
            triangles: mesh.triangle_count(),
            joints: built.joints.len(),
        };

        if let Some(renderer) = self.renderer.as_mut() {
            renderer.upload_mesh(&mesh, &built.joints, &built.skeleton);
        }
        self.skeleton = built.skeleton;
        self.joints = built.joints;
        self.membership = membership;
        self.mesh = Some(mesh);
        self.avatar = Some(avatar);

        tracing::info!(
            vertices = report.vertices,
            triangles = report.triangles,
            missing_clusters = report.skeleton.missing_clusters.len(),
            "humanoid generated"
        );
        Ok(report)
    }

    /// Destroys every rigged voxel within `radius` of `center`.
    ///
    /// When anything changed the triangle buffer is rebuilt and pushed to
    /// the renderer. Vertices, weights and bind poses are left untouched.
    pub fn damage(&mut self, center: Vec3, radius: f32) -> Vec<VoxelDestroyed> {
        let destroyed = self.engine.damage(&mut self.volume, &self.skeleton, center, radius);
        let changes = self.volume.drain_changes();
        if changes.is_empty() {
            return destroyed;
        }

        if let Some(mesh) = self.mesh.as_mut() {
            mesh.triangles = MeshAssembler::active_triangles(&self.volume, &self.membership);
            if let Some(renderer) = self.renderer.as_mut() {
                renderer.update_triangles(&mesh.triangles);
            }
        }
        destroyed
    }

    /// Impact entry point. `radius` defaults to `damage.impact_radius`.
    pub fn on_impact(&mut self, point: Vec3, radius: Option<f32>) -> Vec<VoxelDestroyed> {
        let radius = radius.unwrap_or(self.config.damage.impact_radius);
        self.damage(point, radius)
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &RigConfig {
        &self.config
    }

    /// The voxel volume.
    #[must_use]
    pub fn volume(&self) -> &VoxelVolume {
        &self.volume
    }

    /// Current skeleton.
    #[must_use]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Current skeleton, for posing. Damage follows the new pose.
    pub fn skeleton_mut(&mut self) -> &mut Skeleton {
        &mut self.skeleton
    }

    /// Canonical joint list (empty before the first generation).
    #[must_use]
    pub fn joints(&self) -> &[JointId] {
        &self.joints
    }

    /// Per-bone voxel membership of the last binding pass.
    #[must_use]
    pub fn membership(&self) -> &BoneMembership {
        &self.membership
    }

    /// Generated mesh.
    #[must_use]
    pub fn mesh(&self) -> Option<&MeshBuffers> {
        self.mesh.as_ref()
    }

    /// Generated humanoid description.
    #[must_use]
    pub fn avatar(&self) -> Option<&HumanDescription> {
        self.avatar.as_ref()
    }

    /// Wraps the instance for sharing across threads.
    #[must_use]
    pub fn into_shared(self) -> SharedHumanoid {
        Arc::new(Mutex::new(self))
    }
}

impl std::fmt::Debug for VoxelHumanoid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoxelHumanoid")
            .field("volume", &self.volume)
            .field("joints", &self.joints.len())
            .field("generated", &self.mesh.is_some())
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxrig_assets::ProceduralHumanoids;
    use voxrig_core::{BoneBinding, CanonicalBone, SkeletonProvider, VoxelCoord, CANONICAL_BONE_COUNT};

    #[derive(Default)]
    struct Recorder {
        uploads: Arc<Mutex<usize>>,
        updates: Arc<Mutex<Vec<usize>>>,
    }

    impl RendererSink for Recorder {
        fn upload_mesh(&mut self, mesh: &MeshBuffers, joints: &[JointId], _skeleton: &Skeleton) {
            assert_eq!(mesh.bind_poses.len(), joints.len());
            *self.uploads.lock() += 1;
        }

        fn update_triangles(&mut self, triangles: &[u32]) {
            self.updates.lock().push(triangles.len());
        }
    }

    fn humanoid() -> VoxelHumanoid {
        let set = ProceduralHumanoids::humanoid().build(0.1).unwrap();
        VoxelHumanoid::new(RigConfig::default(), &set).unwrap()
    }

    #[test]
    fn test_generate_all_builds_everything() {
        let mut h = humanoid();
        let report = h.generate_all().unwrap();
        assert_eq!(report.joints, CANONICAL_BONE_COUNT);
        assert!(report.skeleton.missing_clusters.is_empty());
        assert_eq!(report.assignment.skipped, 0);
        assert!(report.assignment.unassigned > 0);
        assert_eq!(report.vertices, h.volume().voxels().len() * 24);
        assert_eq!(report.triangles, h.volume().voxels().len() * 12);
        assert_eq!(h.skeleton().joint(h.skeleton().root()).name, ROOT_JOINT_NAME);
        assert!(h.avatar().is_some());
    }

    #[test]
    fn test_damage_updates_renderer_only_on_change() {
        let mut h = humanoid();
        let recorder = Recorder::default();
        let (uploads, updates) = (Arc::clone(&recorder.uploads), Arc::clone(&recorder.updates));
        h.set_renderer(Box::new(recorder));
        h.generate_all().unwrap();
        assert_eq!(*uploads.lock(), 1);

        let head = h.skeleton().joint_for_bone(CanonicalBone::Head).unwrap();
        let target = h.skeleton().world_position(head);
        let destroyed = h.on_impact(target, Some(0.15));
        assert!(!destroyed.is_empty());
        let again = h.on_impact(target, Some(0.15));
        assert!(again.is_empty());

        let updates = updates.lock();
        assert_eq!(updates.len(), 1);
        let full = h.volume().voxels().len() * 36;
        assert_eq!(updates[0], full - destroyed.len() * 36);
        assert_eq!(h.mesh().unwrap().vertices.len(), h.volume().voxels().len() * 24);
    }

    #[test]
    fn test_damage_before_generation_uses_supplied_rig() {
        let set = ProceduralHumanoids::humanoid().build(0.1).unwrap();
        let mut generated = VoxelHumanoid::new(RigConfig::default(), &set).unwrap();
        generated.generate_all().unwrap();
        let rig = generated.skeleton().clone();

        let mut h = VoxelHumanoid::initialize(RigConfig::default(), &set, Some(rig), JointTransform::IDENTITY, Vec::new())
            .unwrap();
        assert!(h.mesh().is_none());
        let c = VoxelCoord::new(0, 12, 2);
        let p = h.volume().world_position(c, h.skeleton()).unwrap();
        let destroyed = h.damage(p, 0.0);
        assert_eq!(destroyed.len(), 1);
        assert!(!h.volume().is_active(c));
    }

    #[test]
    fn test_attach_skeleton_drops_mesh_and_rebinds() {
        let mut h = humanoid();
        h.generate_all().unwrap();
        let mut rig = h.skeleton().clone();
        let hips = rig.joint_for_bone(CanonicalBone::Hips).unwrap();
        rig.set_local_translation(hips, Vec3::new(5.0, 0.0, 0.0));

        let report = h.attach_skeleton(rig);
        assert!(report.missing_bones.is_empty());
        assert_eq!(report.bound, h.volume().voxels().len());
        assert!(h.mesh().is_none());
        assert!(h.joints().is_empty());

        let c = VoxelCoord::new(10, 10, 0);
        let p = h.volume().world_position(c, h.skeleton()).unwrap();
        assert!(p.x > 4.0);
        assert_eq!(h.damage(p, 0.0).len(), 1);
    }

    #[test]
    fn test_unrigged_backpack_takes_damage() {
        let mut h = humanoid();
        h.generate_all().unwrap();
        let c = VoxelCoord::new(10, 10, 0);
        assert_eq!(h.volume().get(c).unwrap().bone, BoneBinding::Unassigned);

        let point = h.volume().get(c).unwrap().position_from_center;
        let destroyed = h.on_impact(point, Some(0.05));
        assert_eq!(destroyed.len(), 1);
        assert_eq!(destroyed[0].coord, c);
        assert!(!h.volume().is_active(c));
    }

    #[test]
    fn test_default_impact_radius() {
        let mut h = humanoid();
        h.generate_all().unwrap();
        let far = Vec3::new(100.0, 0.0, 0.0);
        assert!(h.on_impact(far, None).is_empty());
        assert!((h.config().damage.impact_radius - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_shared_instance() {
        let shared = humanoid().into_shared();
        let worker = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || shared.lock().generate_all().map(|r| r.joints))
        };
        assert_eq!(worker.join().unwrap().unwrap(), CANONICAL_BONE_COUNT);
        assert_eq!(shared.lock().joints().len(), CANONICAL_BONE_COUNT);
    }
}
