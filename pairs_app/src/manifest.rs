//! Per-pair camera manifests
//!
//! Headless stand-in for the path tracer's pair pass: instead of an EXR image
//! it writes the two camera uniforms of every pair as JSON next to where the
//! image would go.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracer_scene::batch::{pair_output_name, PairRenderer};
use tracer_scene::device::DeviceError;
use tracer_scene::scene::{GpuCamera, GpuCameraPair};

#[derive(Debug, Serialize)]
struct CameraRecord {
    camera_type: u32,
    camera_to_world: [[f32; 4]; 4],
    world_to_camera: [[f32; 4]; 4],
    world_to_raster: [[f32; 4]; 4],
    fxfycxcy: [f32; 4],
}

impl From<&GpuCamera> for CameraRecord {
    fn from(camera: &GpuCamera) -> Self {
        Self {
            camera_type: camera.camera_type,
            camera_to_world: camera.camera_to_world,
            world_to_camera: camera.world_to_camera,
            world_to_raster: camera.world_to_raster,
            fxfycxcy: camera.fxfycxcy,
        }
    }
}

#[derive(Debug, Serialize)]
struct PairManifest {
    pair: usize,
    image: String,
    reference: CameraRecord,
    source: CameraRecord,
}

/// Writes `{prefix}_pair_NNNN.json` for every rendered pair
pub struct ManifestWriter {
    prefix: String,
    written: Vec<PathBuf>,
}

impl ManifestWriter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            written: Vec::new(),
        }
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn write(&self, path: &Path, manifest: &PairManifest) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(manifest)?;
        std::fs::write(path, json)
    }
}

impl PairRenderer for ManifestWriter {
    fn render_pair(&mut self, pair_id: usize, cameras: &GpuCameraPair) -> Result<(), DeviceError> {
        let image = pair_output_name(&self.prefix, pair_id);
        let path = Path::new(&image).with_extension("json");
        let manifest = PairManifest {
            pair: pair_id,
            image,
            reference: CameraRecord::from(&cameras.reference),
            source: CameraRecord::from(&cameras.source),
        };

        self.write(&path, &manifest)
            .map_err(|e| DeviceError::Render(format!("{}: {}", path.display(), e)))?;
        log::info!("Wrote {}", path.display());
        self.written.push(path);
        Ok(())
    }
}
