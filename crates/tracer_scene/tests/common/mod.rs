//! Shared fixtures for the integration tests.
//!
//! Each test writes its description and mesh files into its own scratch
//! directory under the system temp dir, removed again on drop.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use tracer_scene::accel::{AccelerationBuilder, BlasGeometry, ResolvedInstance};
use tracer_scene::batch::PairRenderer;
use tracer_scene::device::DeviceError;
use tracer_scene::scene::{GpuCameraPair, MeshId};

/// Axis-aligned cube spanning [-1, 1] with quad faces and normals.
pub const CUBE_OBJ: &str = "\
v -1 -1 -1
v 1 -1 -1
v 1 1 -1
v -1 1 -1
v -1 -1 1
v 1 -1 1
v 1 1 1
v -1 1 1
vn 0 0 -1
vn 0 0 1
vn -1 0 0
vn 1 0 0
vn 0 -1 0
vn 0 1 0
f 1//1 4//1 3//1 2//1
f 5//2 6//2 7//2 8//2
f 1//3 5//3 8//3 4//3
f 2//4 3//4 7//4 6//4
f 1//5 2//5 6//5 5//5
f 4//6 8//6 7//6 3//6
";

/// Single triangle in the z = 0 plane, no normals.
pub const TRIANGLE_OBJ: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
";

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// Per-test directory under the system temp dir.
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn new(name: &str) -> Self {
        tracer_scene::foundation::logging::init_for_tests();
        let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!("tracer_scene_it_{}_{}_{}", name, std::process::id(), id));
        let _ = std::fs::remove_dir_all(&path);
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let file = self.path.join(relative);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&file, contents).unwrap();
        file
    }

    /// Write a JSON description to `scene.json`.
    pub fn write_scene(&self, scene: &serde_json::Value) -> PathBuf {
        self.write("scene.json", &serde_json::to_string_pretty(scene).unwrap())
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Perspective camera block used by most descriptions.
pub fn perspective_camera() -> serde_json::Value {
    serde_json::json!({
        "type": "perspective",
        "film": { "resolution": [320, 240] },
        "fov": 45.0
    })
}

/// Acceleration builder that records what it was asked to build.
#[derive(Default)]
pub struct RecordingBuilder {
    pub blas: Vec<BlasGeometry>,
    pub tlas: Vec<ResolvedInstance>,
    pub addresses: HashMap<MeshId, u64>,
    pub calls: Vec<&'static str>,
}

impl AccelerationBuilder for RecordingBuilder {
    fn build_blas(&mut self, geometries: &[BlasGeometry]) -> Result<(), DeviceError> {
        self.calls.push("blas");
        for (i, geometry) in geometries.iter().enumerate() {
            self.addresses.insert(geometry.mesh_id, 0xA000_0000 + (i as u64) * 0x1000);
        }
        self.blas = geometries.to_vec();
        Ok(())
    }

    fn blas_address(&self, mesh_id: MeshId) -> Result<u64, DeviceError> {
        self.addresses
            .get(&mesh_id)
            .copied()
            .ok_or_else(|| DeviceError::Build(format!("no bottom-level structure for {mesh_id}")))
    }

    fn build_tlas(&mut self, instances: &[ResolvedInstance]) -> Result<(), DeviceError> {
        self.calls.push("tlas");
        self.tlas = instances.to_vec();
        Ok(())
    }
}

/// Pair renderer that keeps every camera pair it receives.
#[derive(Default)]
pub struct RecordingRenderer {
    pub rendered: Vec<(usize, GpuCameraPair)>,
    pub fail_on: Option<usize>,
}

impl PairRenderer for RecordingRenderer {
    fn render_pair(&mut self, pair_id: usize, cameras: &GpuCameraPair) -> Result<(), DeviceError> {
        if self.fail_on == Some(pair_id) {
            return Err(DeviceError::Render(format!("pair {pair_id} refused")));
        }
        self.rendered.push((pair_id, *cameras));
        Ok(())
    }
}
