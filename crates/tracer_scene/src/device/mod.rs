//! Device resource seam
//!
//! The scene never talks to a graphics API directly. Buffers are created
//! through a [`DeviceAllocator`] supplied by the embedding renderer, and the
//! scene only keeps the opaque [`BufferHandle`]s and device addresses it gets
//! back. [`HostAllocator`] is a CPU implementation used for headless runs.

pub mod host;
pub mod materialize;

pub use host::HostAllocator;
pub use materialize::{InstancesAlloc, MeshAlloc};

use ash::vk;
use bitflags::bitflags;
use thiserror::Error;

/// Failure reported by a device collaborator
#[derive(Error, Debug)]
pub enum DeviceError {
    /// Buffer creation failed
    #[error("Allocation of '{name}' ({size} bytes) failed: {reason}")]
    Allocation {
        /// Debug name of the buffer
        name: String,
        /// Requested size in bytes
        size: usize,
        /// Backend-specific reason
        reason: String,
    },

    /// Handle does not name a live buffer
    #[error("Unknown buffer handle {0:?}")]
    InvalidHandle(BufferHandle),

    /// Acceleration structure build failed
    #[error("Acceleration structure build failed: {0}")]
    Build(String),

    /// Renderer failure during a batch run
    #[error("Render failed: {0}")]
    Render(String),
}

/// Opaque buffer identity handed out by an allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u64);

bitflags! {
    /// How a buffer will be consumed on the device
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Vertex data
        const VERTEX = 1 << 0;
        /// Index data
        const INDEX = 1 << 1;
        /// Shader storage buffer
        const STORAGE = 1 << 2;
        /// Queryable through `buffer_address`
        const SHADER_DEVICE_ADDRESS = 1 << 3;
        /// Read by acceleration structure builds
        const ACCELERATION_STRUCTURE_BUILD_INPUT = 1 << 4;
    }
}

impl BufferUsage {
    /// Usage of per-mesh vertex and index buffers
    pub fn geometry(base: BufferUsage) -> Self {
        base | Self::STORAGE | Self::SHADER_DEVICE_ADDRESS | Self::ACCELERATION_STRUCTURE_BUILD_INPUT
    }

    /// Equivalent Vulkan usage flags
    pub fn to_vk(self) -> vk::BufferUsageFlags {
        let mut flags = vk::BufferUsageFlags::TRANSFER_DST;
        if self.contains(Self::VERTEX) {
            flags |= vk::BufferUsageFlags::VERTEX_BUFFER;
        }
        if self.contains(Self::INDEX) {
            flags |= vk::BufferUsageFlags::INDEX_BUFFER;
        }
        if self.contains(Self::STORAGE) {
            flags |= vk::BufferUsageFlags::STORAGE_BUFFER;
        }
        if self.contains(Self::SHADER_DEVICE_ADDRESS) {
            flags |= vk::BufferUsageFlags::SHADER_DEVICE_ADDRESS;
        }
        if self.contains(Self::ACCELERATION_STRUCTURE_BUILD_INPUT) {
            flags |= vk::BufferUsageFlags::ACCELERATION_STRUCTURE_BUILD_INPUT_READ_ONLY_KHR;
        }
        flags
    }
}

/// Creates and destroys device buffers on behalf of the scene
///
/// Calls are synchronous; an implementation may block on uploads.
pub trait DeviceAllocator {
    /// Upload `data` into a new buffer
    fn create_buffer(&mut self, data: &[u8], usage: BufferUsage, name: &str) -> Result<BufferHandle, DeviceError>;

    /// Release a buffer; unknown handles are ignored
    fn destroy(&mut self, handle: BufferHandle);

    /// Device address of a live buffer
    fn buffer_address(&self, handle: BufferHandle) -> Result<u64, DeviceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_usage_maps_to_vulkan_flags() {
        let flags = BufferUsage::geometry(BufferUsage::VERTEX).to_vk();
        assert!(flags.contains(vk::BufferUsageFlags::VERTEX_BUFFER));
        assert!(flags.contains(vk::BufferUsageFlags::SHADER_DEVICE_ADDRESS));
        assert!(flags.contains(vk::BufferUsageFlags::ACCELERATION_STRUCTURE_BUILD_INPUT_READ_ONLY_KHR));
        assert!(!flags.contains(vk::BufferUsageFlags::INDEX_BUFFER));
    }
}
