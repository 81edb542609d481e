//! Device-resident records of meshes and the instance table

use super::{BufferHandle, BufferUsage, DeviceAllocator, DeviceError};
use crate::error::{SceneError, SceneResult};
use crate::foundation::math::Vec3;
use crate::scene::instance::{GpuInstance, Instance};
use crate::scene::mesh::MeshData;

/// Vertex and index buffers of one mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MeshAlloc {
    /// Vertex buffer
    pub vertex_buffer: BufferHandle,
    /// Index buffer
    pub index_buffer: BufferHandle,
    /// Device address of the vertex buffer
    pub vertex_address: u64,
    /// Device address of the index buffer
    pub index_address: u64,
    /// Number of vertices uploaded
    pub vertex_count: u32,
    /// Number of indices uploaded
    pub index_count: u32,
    /// Object-space minimum position
    pub pos_min: Vec3,
    /// Object-space maximum position
    pub pos_max: Vec3,
}

impl MeshAlloc {
    /// Upload a mesh, naming the buffers after the mesh
    ///
    /// Nothing stays allocated if any step fails.
    pub fn create<A: DeviceAllocator + ?Sized>(
        allocator: &mut A,
        mesh_name: &str,
        data: &MeshData,
    ) -> Result<Self, DeviceError> {
        let vertex_buffer = allocator.create_buffer(
            bytemuck::cast_slice(&data.vertices),
            BufferUsage::geometry(BufferUsage::VERTEX),
            &format!("{mesh_name}_vertexBuffer"),
        )?;

        let index_buffer = match allocator.create_buffer(
            bytemuck::cast_slice(&data.indices),
            BufferUsage::geometry(BufferUsage::INDEX),
            &format!("{mesh_name}_indexBuffer"),
        ) {
            Ok(handle) => handle,
            Err(err) => {
                allocator.destroy(vertex_buffer);
                return Err(err);
            }
        };

        let addresses = allocator
            .buffer_address(vertex_buffer)
            .and_then(|v| allocator.buffer_address(index_buffer).map(|i| (v, i)));
        let (vertex_address, index_address) = match addresses {
            Ok(pair) => pair,
            Err(err) => {
                allocator.destroy(index_buffer);
                allocator.destroy(vertex_buffer);
                return Err(err);
            }
        };

        log::debug!(
            "Mesh '{}' uploaded: {} vertices, {} triangles",
            mesh_name,
            data.vertex_count(),
            data.triangle_count()
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            vertex_address,
            index_address,
            vertex_count: data.vertex_count(),
            index_count: data.indices.len() as u32,
            pos_min: data.pos_min,
            pos_max: data.pos_max,
        })
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }

    /// Release both buffers
    pub fn destroy<A: DeviceAllocator + ?Sized>(self, allocator: &mut A) {
        allocator.destroy(self.index_buffer);
        allocator.destroy(self.vertex_buffer);
    }
}

/// Storage buffer of [`GpuInstance`] records in instance table order
#[derive(Debug, Clone, PartialEq)]
pub struct InstancesAlloc {
    /// The storage buffer
    pub buffer: BufferHandle,
    /// Device address of the buffer
    pub address: u64,
    /// Records as uploaded
    pub records: Vec<GpuInstance>,
}

impl InstancesAlloc {
    /// Upload the instance table
    ///
    /// `meshes` must hold the allocation of every mesh id an instance
    /// refers to.
    pub fn create<A: DeviceAllocator + ?Sized>(
        allocator: &mut A,
        instances: &[Instance],
        meshes: &[MeshAlloc],
    ) -> SceneResult<Self> {
        let records = instances
            .iter()
            .enumerate()
            .map(|(i, inst)| {
                meshes
                    .get(inst.mesh_id.index())
                    .map(|mesh| GpuInstance {
                        vertex_address: mesh.vertex_address,
                        index_address: mesh.index_address,
                    })
                    .ok_or_else(|| {
                        SceneError::Reference(format!("Instance {i} uses {} which has no device buffers", inst.mesh_id))
                    })
            })
            .collect::<SceneResult<Vec<_>>>()?;

        let buffer = allocator.create_buffer(
            bytemuck::cast_slice(&records),
            BufferUsage::STORAGE | BufferUsage::SHADER_DEVICE_ADDRESS,
            "instancesBuffer",
        )?;
        let address = match allocator.buffer_address(buffer) {
            Ok(address) => address,
            Err(err) => {
                allocator.destroy(buffer);
                return Err(err.into());
            }
        };

        log::debug!("Instance table uploaded: {} records", records.len());
        Ok(Self {
            buffer,
            address,
            records,
        })
    }

    /// Release the buffer
    pub fn destroy<A: DeviceAllocator + ?Sized>(self, allocator: &mut A) {
        allocator.destroy(self.buffer);
    }
}
