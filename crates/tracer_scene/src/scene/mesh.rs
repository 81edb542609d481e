//! Mesh geometry and mesh identities
//!
//! A [`Mesh`] is the CPU-side record of one geometry file named by the scene
//! description. Its [`MeshId`] is assigned when the name is first registered
//! and is the index every instance, device buffer and bottom-level structure
//! uses to refer back to it.

use crate::foundation::math::Vec3;
use bytemuck::{Pod, Zeroable};
use std::fmt;
use std::path::PathBuf;

/// Vertex layout shared with the device
///
/// `#[repr(C)]` keeps the layout identical to what the shaders read through
/// the vertex buffer address.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in object space
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

/// Byte stride of [`Vertex`]
pub const VERTEX_STRIDE: u64 = std::mem::size_of::<Vertex>() as u64;

/// Load-time options of a mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshOptions {
    /// Discard file normals and regenerate smooth ones
    pub recompute_normal: bool,
    /// Component-wise texture coordinate multiplier
    pub uv_scale: [f32; 2],
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            recompute_normal: false,
            uv_scale: [1.0, 1.0],
        }
    }
}

/// Triangulated geometry with object-space bounds
#[derive(Debug, Clone)]
pub struct MeshData {
    /// Vertex data
    pub vertices: Vec<Vertex>,

    /// Triangle list indices
    pub indices: Vec<u32>,

    /// Minimum object-space position
    pub pos_min: Vec3,

    /// Maximum object-space position
    pub pos_max: Vec3,
}

impl MeshData {
    /// Create mesh data, computing position bounds
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let mut pos_min = Vec3::repeat(f32::INFINITY);
        let mut pos_max = Vec3::repeat(f32::NEG_INFINITY);
        for v in &vertices {
            let p = Vec3::from(v.position);
            pos_min = pos_min.inf(&p);
            pos_max = pos_max.sup(&p);
        }

        Self {
            vertices,
            indices,
            pos_min,
            pos_max,
        }
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> u32 {
        (self.indices.len() / 3) as u32
    }

    /// Unit cube centered at the origin, for tests and placeholder geometry
    pub fn cube() -> Self {
        let n = [0.0, 1.0, 0.0];
        let t = [0.0, 0.0];
        let vertices = vec![
            Vertex::new([-1.0, -1.0, 1.0], n, t),
            Vertex::new([1.0, -1.0, 1.0], n, t),
            Vertex::new([1.0, 1.0, 1.0], n, t),
            Vertex::new([-1.0, 1.0, 1.0], n, t),
            Vertex::new([-1.0, -1.0, -1.0], n, t),
            Vertex::new([-1.0, 1.0, -1.0], n, t),
            Vertex::new([1.0, 1.0, -1.0], n, t),
            Vertex::new([1.0, -1.0, -1.0], n, t),
        ];

        let indices = vec![
            0, 1, 2, 2, 3, 0, // Front
            4, 5, 6, 6, 7, 4, // Back
            4, 0, 3, 3, 5, 4, // Left
            1, 7, 6, 6, 2, 1, // Right
            3, 2, 6, 6, 5, 3, // Top
            4, 7, 1, 1, 0, 4, // Bottom
        ];

        Self::new(vertices, indices)
    }
}

/// Stable identity of a registered mesh (its declaration order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u32);

impl MeshId {
    /// Index into id-ordered tables
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mesh#{}", self.0)
    }
}

/// A loaded mesh and where it came from
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Resolved file path
    pub path: PathBuf,
    /// Options the geometry was loaded with
    pub options: MeshOptions,
    /// Loaded geometry
    pub data: MeshData,
}
