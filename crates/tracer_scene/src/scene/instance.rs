//! Mesh instances

use crate::foundation::math::Mat4;
use crate::scene::mesh::MeshId;
use bytemuck::{Pod, Zeroable};

/// One placement of a mesh in the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instance {
    /// Object-to-world transform
    pub transform: Mat4,
    /// Mesh this instance draws
    pub mesh_id: MeshId,
}

impl Instance {
    /// Create an instance
    pub fn new(mesh_id: MeshId, transform: Mat4) -> Self {
        Self { transform, mesh_id }
    }
}

/// Per-instance record read by shaders to fetch geometry
///
/// Indexed by the instance id reported by the ray tracing hardware.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct GpuInstance {
    /// Device address of the mesh vertex buffer
    pub vertex_address: u64,
    /// Device address of the mesh index buffer
    pub index_address: u64,
}
