//! Acceleration structure topology
//!
//! Maps a submitted [`Scene`] onto the inputs of a bottom-level (one per
//! mesh) and top-level (one entry per instance) acceleration structure build.
//! Nothing here builds anything; an [`AccelerationBuilder`] supplied by the
//! renderer does the work.

use crate::device::{DeviceAllocator, DeviceError, MeshAlloc};
use crate::error::{SceneError, SceneResult};
use crate::foundation::math::Mat4;
use crate::scene::lifecycle::{Scene, SceneState};
use crate::scene::mesh::{MeshId, VERTEX_STRIDE};
use ash::vk;

/// Visibility mask hit by every ray
pub const INSTANCE_MASK_ALL: u8 = 0xFF;

/// Bottom-level build input for one mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlasGeometry {
    /// Mesh the geometry belongs to
    pub mesh_id: MeshId,
    /// Device address of the vertex buffer
    pub vertex_address: u64,
    /// Device address of the index buffer
    pub index_address: u64,
    /// Number of vertices
    pub vertex_count: u32,
    /// Byte stride between vertices
    pub vertex_stride: u64,
    /// Highest vertex index referenced
    pub max_vertex: u32,
    /// Number of indices
    pub index_count: u32,
    /// Number of triangles
    pub triangle_count: u32,
}

impl BlasGeometry {
    /// Geometry of an uploaded mesh
    pub fn from_alloc(mesh_id: MeshId, alloc: &MeshAlloc) -> Self {
        Self {
            mesh_id,
            vertex_address: alloc.vertex_address,
            index_address: alloc.index_address,
            vertex_count: alloc.vertex_count,
            vertex_stride: VERTEX_STRIDE,
            max_vertex: alloc.vertex_count.saturating_sub(1),
            index_count: alloc.index_count,
            triangle_count: alloc.triangle_count(),
        }
    }

    /// Opaque triangle geometry with `R32G32B32_SFLOAT` positions and `u32` indices
    pub fn to_vk_geometry(&self) -> vk::AccelerationStructureGeometryKHR {
        let triangles = vk::AccelerationStructureGeometryTrianglesDataKHR::builder()
            .vertex_format(vk::Format::R32G32B32_SFLOAT)
            .vertex_data(vk::DeviceOrHostAddressConstKHR {
                device_address: self.vertex_address,
            })
            .vertex_stride(self.vertex_stride)
            .max_vertex(self.max_vertex)
            .index_type(vk::IndexType::UINT32)
            .index_data(vk::DeviceOrHostAddressConstKHR {
                device_address: self.index_address,
            })
            .build();

        vk::AccelerationStructureGeometryKHR::builder()
            .geometry_type(vk::GeometryTypeKHR::TRIANGLES)
            .geometry(vk::AccelerationStructureGeometryDataKHR { triangles })
            .flags(vk::GeometryFlagsKHR::OPAQUE)
            .build()
    }

    /// Build range covering every triangle
    pub fn to_vk_range(&self) -> vk::AccelerationStructureBuildRangeInfoKHR {
        vk::AccelerationStructureBuildRangeInfoKHR {
            primitive_count: self.triangle_count,
            primitive_offset: 0,
            first_vertex: 0,
            transform_offset: 0,
        }
    }
}

/// Top-level entry for one instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TlasInstance {
    /// Upper three rows of the object-to-world matrix, row-major
    pub transform: [f32; 12],
    /// Mesh whose bottom-level structure this instance references
    pub mesh_id: MeshId,
    /// Visibility mask
    pub mask: u8,
    /// Value reported as the custom instance index
    pub custom_index: u32,
    /// Shader binding table record offset
    pub sbt_record_offset: u32,
    /// Instance flags
    pub flags: vk::GeometryInstanceFlagsKHR,
}

impl TlasInstance {
    /// Entry for an instance of `mesh_id` placed by `transform`
    pub fn new(mesh_id: MeshId, transform: &Mat4) -> Self {
        let mut rows = [0.0; 12];
        for r in 0..3 {
            for c in 0..4 {
                rows[r * 4 + c] = transform[(r, c)];
            }
        }

        Self {
            transform: rows,
            mesh_id,
            mask: INSTANCE_MASK_ALL,
            custom_index: 0,
            sbt_record_offset: 0,
            flags: vk::GeometryInstanceFlagsKHR::TRIANGLE_FACING_CULL_DISABLE,
        }
    }

    /// Vulkan instance record referencing the bottom-level structure at `blas_address`
    pub fn to_vk_instance(&self, blas_address: u64) -> vk::AccelerationStructureInstanceKHR {
        vk::AccelerationStructureInstanceKHR {
            transform: vk::TransformMatrixKHR { matrix: self.transform },
            instance_custom_index_and_mask: vk::Packed24_8::new(self.custom_index, self.mask),
            instance_shader_binding_table_record_offset_and_flags: vk::Packed24_8::new(
                self.sbt_record_offset,
                self.flags.as_raw() as u8,
            ),
            acceleration_structure_reference: vk::AccelerationStructureReferenceKHR {
                device_handle: blas_address,
            },
        }
    }
}

/// A top-level entry with its bottom-level reference resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedInstance {
    /// The entry
    pub instance: TlasInstance,
    /// Device address of the referenced bottom-level structure
    pub blas_address: u64,
}

impl ResolvedInstance {
    /// Vulkan instance record
    pub fn to_vk(&self) -> vk::AccelerationStructureInstanceKHR {
        self.instance.to_vk_instance(self.blas_address)
    }
}

/// Build inputs of a whole scene
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccelerationTopology {
    /// One geometry per mesh in id order
    pub geometries: Vec<BlasGeometry>,
    /// One entry per instance in table order
    pub instances: Vec<TlasInstance>,
}

impl AccelerationTopology {
    /// Total triangle count over all instances
    pub fn instanced_triangles(&self) -> u64 {
        self.instances
            .iter()
            .filter_map(|inst| self.geometries.get(inst.mesh_id.index()))
            .map(|geometry| u64::from(geometry.triangle_count))
            .sum()
    }
}

/// Builds acceleration structures from exported topology
pub trait AccelerationBuilder {
    /// Build one bottom-level structure per geometry, in the given order
    fn build_blas(&mut self, geometries: &[BlasGeometry]) -> Result<(), DeviceError>;

    /// Device address of the bottom-level structure built for `mesh_id`
    fn blas_address(&self, mesh_id: MeshId) -> Result<u64, DeviceError>;

    /// Build the top-level structure
    fn build_tlas(&mut self, instances: &[ResolvedInstance]) -> Result<(), DeviceError>;
}

/// Export the build inputs of a submitted scene
pub fn export<A: DeviceAllocator>(scene: &Scene<A>) -> SceneResult<AccelerationTopology> {
    if scene.state() != SceneState::Submitted {
        return Err(SceneError::Config(format!(
            "Acceleration export needs a submitted scene, scene is {:?}",
            scene.state()
        )));
    }

    let geometries = scene
        .meshes()
        .iter()
        .map(|(id, name, _)| {
            scene
                .mesh_alloc(id)
                .map(|alloc| BlasGeometry::from_alloc(id, alloc))
                .ok_or_else(|| SceneError::Reference(format!("Mesh '{name}' ({id}) has no device buffers")))
        })
        .collect::<SceneResult<Vec<_>>>()?;

    let instances = scene
        .instances()
        .iter()
        .map(|inst| TlasInstance::new(inst.mesh_id, &inst.transform))
        .collect();

    Ok(AccelerationTopology { geometries, instances })
}

/// Export `scene` and drive `builder` through the bottom then top level build
pub fn build<A: DeviceAllocator, B: AccelerationBuilder + ?Sized>(
    scene: &Scene<A>,
    builder: &mut B,
) -> SceneResult<AccelerationTopology> {
    let topology = export(scene)?;

    builder.build_blas(&topology.geometries)?;
    log::debug!("Built {} bottom-level structures", topology.geometries.len());

    let resolved = topology
        .instances
        .iter()
        .map(|instance| {
            builder.blas_address(instance.mesh_id).map(|blas_address| ResolvedInstance {
                instance: *instance,
                blas_address,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    builder.build_tlas(&resolved)?;
    log::debug!("Built top-level structure over {} instances", resolved.len());

    Ok(topology)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_tlas_transform_is_row_major_3x4() {
        let m = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        let inst = TlasInstance::new(MeshId(4), &m);
        assert_eq!(
            inst.transform,
            [1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 2.0, 0.0, 0.0, 1.0, 3.0]
        );
        assert_eq!(inst.mask, 0xFF);
        assert_eq!(inst.custom_index, 0);
        assert_eq!(inst.sbt_record_offset, 0);
        assert_eq!(inst.flags, vk::GeometryInstanceFlagsKHR::TRIANGLE_FACING_CULL_DISABLE);
    }

    #[test]
    fn test_vk_instance_packs_mask_and_flags() {
        let inst = TlasInstance::new(MeshId(0), &Mat4::identity());
        let record = inst.to_vk_instance(0x4000);
        assert_eq!(record.instance_custom_index_and_mask.low_24(), 0);
        assert_eq!(record.instance_custom_index_and_mask.high_8(), 0xFF);
        assert_eq!(record.instance_shader_binding_table_record_offset_and_flags.low_24(), 0);
        assert_eq!(
            u32::from(record.instance_shader_binding_table_record_offset_and_flags.high_8()),
            vk::GeometryInstanceFlagsKHR::TRIANGLE_FACING_CULL_DISABLE.as_raw()
        );
    }

    #[test]
    fn test_range_covers_all_triangles() {
        let geometry = BlasGeometry {
            mesh_id: MeshId(0),
            vertex_address: 0x100,
            index_address: 0x200,
            vertex_count: 8,
            vertex_stride: VERTEX_STRIDE,
            max_vertex: 7,
            index_count: 36,
            triangle_count: 12,
        };
        let range = geometry.to_vk_range();
        assert_eq!(range.primitive_count, 12);
        assert_eq!(range.primitive_offset, 0);

        let vk_geometry = geometry.to_vk_geometry();
        assert_eq!(vk_geometry.geometry_type, vk::GeometryTypeKHR::TRIANGLES);
        assert_eq!(vk_geometry.flags, vk::GeometryFlagsKHR::OPAQUE);
    }
}
