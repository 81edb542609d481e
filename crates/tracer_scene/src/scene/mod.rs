//! Scene entities and the scene lifecycle

pub mod bounds;
pub mod camera;
pub mod instance;
pub mod lifecycle;
pub mod mesh;
pub mod registry;
pub mod transform;

pub use bounds::{Aabb, Dimensions};
pub use camera::{camera_fit, Camera, CameraModel, CameraShot, CameraType, Extent2D, GpuCamera, GpuCameraPair};
pub use instance::{GpuInstance, Instance};
pub use lifecycle::{Scene, SceneDescription, SceneState};
pub use mesh::{Mesh, MeshData, MeshId, MeshOptions, Vertex, VERTEX_STRIDE};
pub use registry::{MeshRegistry, Pair};
pub use transform::{compose, TransformOp};
