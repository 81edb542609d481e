//! # Tracer Scene
//!
//! Scene loading for a multiview path tracer: reads a declarative JSON scene
//! description, owns the resulting entities, materializes them into device
//! buffers and exports the acceleration structure topology a ray tracing
//! back end builds from.
//!
//! ## Features
//!
//! - **Two-phase loading**: parse into CPU entities, then submit to the device
//! - **Stable identities**: mesh ids follow declaration order
//! - **Camera shots and pairs**: several poses per scene for multiview batches
//! - **Pluggable device seam**: any [`device::DeviceAllocator`] and
//!   [`accel::AccelerationBuilder`] implementation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tracer_scene::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LoaderConfig::default();
//!     let size = Loader::load_size_first("scene.json", &config)?;
//!     println!("film: {}x{}", size.width, size.height);
//!
//!     let mut scene = Scene::new(HostAllocator::new(), config);
//!     Loader::load_scene("scene.json", &mut scene)?;
//!     let topology = accel::export(&scene)?;
//!     println!("{} geometries", topology.geometries.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod accel;
pub mod assets;
pub mod batch;
pub mod config;
pub mod device;
pub mod foundation;
pub mod loader;
pub mod scene;

mod error;

pub use error::{SceneError, SceneResult};

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        accel::{self, AccelerationBuilder, AccelerationTopology, BlasGeometry, ResolvedInstance, TlasInstance},
        batch::{pair_output_name, run_pairs, PairRenderer},
        config::{Config, LoaderConfig},
        device::{BufferHandle, BufferUsage, DeviceAllocator, DeviceError, HostAllocator},
        foundation::math::{Mat4, Vec3},
        loader::Loader,
        scene::{
            Camera, CameraShot, CameraType, Extent2D, GpuCamera, GpuCameraPair, Instance, MeshId, Scene, SceneState,
        },
        SceneError, SceneResult,
    };
}
