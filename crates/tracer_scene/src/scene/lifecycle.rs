//! # Scene
//!
//! The scene owns every entity of a loaded description and every device
//! buffer created for it. Loading happens in two phases:
//!
//! 1. **Parse**: the loader builds a [`SceneDescription`] off to the side and
//!    hands it over with [`Scene::commit`]. A failing parse never reaches the
//!    scene, so it stays [`SceneState::Empty`].
//! 2. **Submit**: [`Scene::submit`] uploads mesh buffers in id order, then the
//!    instance table, computes [`Dimensions`], synthesizes a fitted shot when
//!    the description had none and activates shot 0. A failing submit releases
//!    whatever it created and leaves the scene [`SceneState::Parsed`].
//!
//! Queries are meant for a [`SceneState::Submitted`] scene; on other states
//! they return empty or `None` values.

use crate::config::LoaderConfig;
use crate::device::{BufferHandle, DeviceAllocator, InstancesAlloc, MeshAlloc};
use crate::error::{SceneError, SceneResult};
use crate::foundation::math::{Mat4, Vec3};
use crate::scene::bounds::{Aabb, Dimensions};
use crate::scene::camera::{camera_fit, Camera, CameraShot, CameraType, GpuCamera, GpuCameraPair};
use crate::scene::instance::Instance;
use crate::scene::mesh::{Mesh, MeshId};
use crate::scene::registry::{MeshRegistry, Pair};

/// Lifecycle state of a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneState {
    /// No entities, no device resources
    Empty,
    /// CPU entities present, nothing on the device
    Parsed,
    /// Device resources and derived state ready for rendering
    Submitted,
}

/// CPU-side entities produced by parsing a description
#[derive(Debug, Clone)]
pub struct SceneDescription {
    /// The scene camera
    pub camera: Camera,
    /// Meshes in declaration order
    pub meshes: MeshRegistry,
    /// Instance table
    pub instances: Vec<Instance>,
    /// Supplied shots, possibly none
    pub shots: Vec<CameraShot>,
    /// Multiview pairs
    pub pairs: Vec<Pair>,
}

/// A loaded scene and its device resources
pub struct Scene<A: DeviceAllocator> {
    allocator: A,
    config: LoaderConfig,
    state: SceneState,

    camera: Option<Camera>,
    meshes: MeshRegistry,
    instances: Vec<Instance>,
    shots: Vec<CameraShot>,
    pairs: Vec<Pair>,

    mesh_allocs: Vec<MeshAlloc>,
    instances_alloc: Option<InstancesAlloc>,
    dimensions: Option<Dimensions>,
    current_shot: Option<usize>,
}

impl<A: DeviceAllocator> Scene<A> {
    /// Create an empty scene that allocates through `allocator`
    pub fn new(allocator: A, config: LoaderConfig) -> Self {
        Self {
            allocator,
            config,
            state: SceneState::Empty,
            camera: None,
            meshes: MeshRegistry::new(),
            instances: Vec::new(),
            shots: Vec::new(),
            pairs: Vec::new(),
            mesh_allocs: Vec::new(),
            instances_alloc: None,
            dimensions: None,
            current_shot: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SceneState {
        self.state
    }

    /// Loader settings this scene was created with
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// The allocator owning the scene's buffers
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Release device resources, then drop every entity
    ///
    /// Safe to call in any state, any number of times.
    pub fn reset(&mut self) {
        if self.state != SceneState::Empty {
            log::debug!("Resetting scene ({:?})", self.state);
        }
        self.release_device_resources();

        self.camera = None;
        self.meshes.clear();
        self.instances.clear();
        self.shots.clear();
        self.pairs.clear();
        self.dimensions = None;
        self.current_shot = None;
        self.state = SceneState::Empty;
    }

    /// Take ownership of parsed entities
    ///
    /// Anything the scene held before is reset first.
    pub fn commit(&mut self, description: SceneDescription) {
        if self.state != SceneState::Empty {
            self.reset();
        }

        let SceneDescription {
            camera,
            meshes,
            instances,
            shots,
            pairs,
        } = description;

        log::debug!(
            "Scene parsed: {} meshes, {} instances, {} shots, {} pairs",
            meshes.len(),
            instances.len(),
            shots.len(),
            pairs.len()
        );

        self.camera = Some(camera);
        self.meshes = meshes;
        self.instances = instances;
        self.shots = shots;
        self.pairs = pairs;
        self.state = SceneState::Parsed;
    }

    /// Materialize device resources and derived state
    pub fn submit(&mut self) -> SceneResult<()> {
        match self.state {
            SceneState::Parsed => {}
            SceneState::Submitted => return Ok(()),
            SceneState::Empty => {
                return Err(SceneError::Config("Cannot submit a scene that has not been parsed".to_string()))
            }
        }

        if let Err(err) = self.materialize() {
            log::error!("Scene submit failed, releasing device resources: {}", err);
            self.release_device_resources();
            return Err(err);
        }

        let dimensions = self.compute_dimensions();
        self.dimensions = Some(dimensions);

        if self.shots.is_empty() {
            let shot = self.fit_shot(&dimensions.bounds());
            log::info!("No shots supplied, fitted default shot at {:?}", shot.eye);
            self.shots.push(shot);
        }

        self.state = SceneState::Submitted;
        self.set_shot(0)?;
        Ok(())
    }

    fn materialize(&mut self) -> SceneResult<()> {
        for (id, name, mesh) in self.meshes.iter() {
            log::trace!("Materializing {} '{}'", id, name);
            let alloc = MeshAlloc::create(&mut self.allocator, name, &mesh.data)?;
            self.mesh_allocs.push(alloc);
        }

        let instances = InstancesAlloc::create(&mut self.allocator, &self.instances, &self.mesh_allocs)?;
        self.instances_alloc = Some(instances);
        Ok(())
    }

    fn release_device_resources(&mut self) {
        if let Some(instances) = self.instances_alloc.take() {
            instances.destroy(&mut self.allocator);
        }
        for alloc in self.mesh_allocs.drain(..).rev() {
            alloc.destroy(&mut self.allocator);
        }
    }

    fn compute_dimensions(&self) -> Dimensions {
        let mut bbox = Aabb::empty();
        for inst in &self.instances {
            if let Some(alloc) = self.mesh_allocs.get(inst.mesh_id.index()) {
                let local = Aabb::new(alloc.pos_min, alloc.pos_max);
                bbox.insert(&local.transformed(&inst.transform));
            }
        }

        if bbox.is_empty() || !bbox.is_volume() {
            let fallback = &self.config.fallback_bounds;
            log::warn!(
                "Scene bounding box invalid, setting to: {:?}, {:?}",
                fallback.min,
                fallback.max
            );
            bbox = Aabb::new(Vec3::from(fallback.min), Vec3::from(fallback.max));
        }

        Dimensions::from(&bbox)
    }

    fn fit_shot(&self, bounds: &Aabb) -> CameraShot {
        let (aspect, fov) = self.camera.as_ref().map_or(
            (1.0, self.config.fit.fov_degrees),
            |camera| (camera.film_resolution().aspect(), camera.vertical_fov()),
        );
        camera_fit(bounds, aspect, fov, &self.config.fit)
    }

    /// Make shot `index` the active camera pose
    pub fn set_shot(&mut self, index: usize) -> SceneResult<()> {
        let shot = *self
            .shots
            .get(index)
            .ok_or_else(|| SceneError::Reference(format!("Shot {index} out of range ({} shots)", self.shots.len())))?;
        let camera = self
            .camera
            .as_mut()
            .ok_or_else(|| SceneError::Config("Scene has no camera".to_string()))?;

        camera.set_to_world(&shot);
        self.current_shot = Some(index);
        Ok(())
    }

    /// Snapshot the camera at the reference and then the source shot of a pair
    ///
    /// The source shot stays active afterwards.
    pub fn set_current_pair(&mut self, pair_id: usize) -> SceneResult<GpuCameraPair> {
        let pair = *self
            .pairs
            .get(pair_id)
            .ok_or_else(|| SceneError::Reference(format!("Pair {pair_id} out of range ({} pairs)", self.pairs.len())))?;

        self.set_shot(pair.reference)?;
        let reference = self.gpu_camera()?;
        self.set_shot(pair.source)?;
        let source = self.gpu_camera()?;

        Ok(GpuCameraPair { reference, source })
    }

    fn gpu_camera(&self) -> SceneResult<GpuCamera> {
        self.camera
            .as_ref()
            .map(Camera::gpu_camera)
            .ok_or_else(|| SceneError::Config("Scene has no camera".to_string()))
    }

    /// Number of meshes
    pub fn meshes_num(&self) -> usize {
        self.meshes.len()
    }

    /// Number of instances
    pub fn instances_num(&self) -> usize {
        self.instances.len()
    }

    /// Number of shots, including a synthesized one
    pub fn shots_num(&self) -> usize {
        self.shots.len()
    }

    /// Number of pairs
    pub fn pairs_num(&self) -> usize {
        self.pairs.len()
    }

    /// The scene camera
    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    /// Model of the scene camera
    pub fn camera_type(&self) -> Option<CameraType> {
        self.camera.as_ref().map(Camera::camera_type)
    }

    /// Shot by index
    pub fn shot(&self, index: usize) -> Option<&CameraShot> {
        self.shots.get(index)
    }

    /// Camera-to-world matrix of a shot
    pub fn get_shot(&self, index: usize) -> Option<Mat4> {
        self.shots.get(index).map(CameraShot::to_world_matrix)
    }

    /// All shots
    pub fn shots(&self) -> &[CameraShot] {
        &self.shots
    }

    /// Index of the active shot
    pub fn current_shot(&self) -> Option<usize> {
        self.current_shot
    }

    /// Pair by index
    pub fn pair(&self, index: usize) -> Option<&Pair> {
        self.pairs.get(index)
    }

    /// All pairs
    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    /// The mesh registry
    pub fn meshes(&self) -> &MeshRegistry {
        &self.meshes
    }

    /// Mesh by id
    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id)
    }

    /// Instance table
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Device buffers of a mesh
    pub fn mesh_alloc(&self, id: MeshId) -> Option<&MeshAlloc> {
        self.mesh_allocs.get(id.index())
    }

    /// Device buffers of every mesh in id order
    pub fn mesh_allocs(&self) -> &[MeshAlloc] {
        &self.mesh_allocs
    }

    /// Device record of the instance table
    pub fn instances_alloc(&self) -> Option<&InstancesAlloc> {
        self.instances_alloc.as_ref()
    }

    /// Buffer holding the instance table
    pub fn instances_descriptor(&self) -> Option<BufferHandle> {
        self.instances_alloc.as_ref().map(|alloc| alloc.buffer)
    }

    /// Extent of the scene, available once submitted
    pub fn dimensions(&self) -> Option<&Dimensions> {
        self.dimensions.as_ref()
    }
}

impl<A: DeviceAllocator> Drop for Scene<A> {
    fn drop(&mut self) {
        self.release_device_resources();
    }
}
