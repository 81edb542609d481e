//! CPU-side allocator
//!
//! Keeps buffer contents in host memory and hands out fake, monotonically
//! increasing device addresses. Used for headless validation runs and as the
//! allocator in tests, where [`HostAllocator::fail_after`] injects failures.

use super::{BufferHandle, BufferUsage, DeviceAllocator, DeviceError};
use crate::foundation::collections::{new_key_type, SlotMap};
use slotmap::{Key, KeyData};

/// Alignment of every fake device address
pub const ADDRESS_ALIGNMENT: u64 = 256;

const BASE_ADDRESS: u64 = 0x1000_0000;

new_key_type! {
    struct HostBufferKey;
}

#[derive(Debug)]
struct HostBuffer {
    name: String,
    usage: BufferUsage,
    address: u64,
    bytes: Vec<u8>,
}

/// Allocator that keeps buffers in host memory
#[derive(Debug)]
pub struct HostAllocator {
    buffers: SlotMap<HostBufferKey, HostBuffer>,
    next_address: u64,
    allocations: usize,
    fail_after: Option<usize>,
}

impl HostAllocator {
    /// Create an allocator that never fails
    pub fn new() -> Self {
        Self {
            buffers: SlotMap::with_key(),
            next_address: BASE_ADDRESS,
            allocations: 0,
            fail_after: None,
        }
    }

    /// Create an allocator whose allocation number `count + 1` and later fail
    pub fn fail_after(count: usize) -> Self {
        Self {
            fail_after: Some(count),
            ..Self::new()
        }
    }

    /// Change or clear the failure threshold, counting from now
    pub fn set_fail_after(&mut self, count: Option<usize>) {
        self.allocations = 0;
        self.fail_after = count;
    }

    /// Number of buffers created and not yet destroyed
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Contents of a live buffer
    pub fn contents(&self, handle: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(Self::key(handle)).map(|b| b.bytes.as_slice())
    }

    /// Debug name of a live buffer
    pub fn name(&self, handle: BufferHandle) -> Option<&str> {
        self.buffers.get(Self::key(handle)).map(|b| b.name.as_str())
    }

    /// Usage a live buffer was created with
    pub fn usage(&self, handle: BufferHandle) -> Option<BufferUsage> {
        self.buffers.get(Self::key(handle)).map(|b| b.usage)
    }

    fn key(handle: BufferHandle) -> HostBufferKey {
        KeyData::from_ffi(handle.0).into()
    }
}

impl Default for HostAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceAllocator for HostAllocator {
    fn create_buffer(&mut self, data: &[u8], usage: BufferUsage, name: &str) -> Result<BufferHandle, DeviceError> {
        if self.fail_after.is_some_and(|limit| self.allocations >= limit) {
            return Err(DeviceError::Allocation {
                name: name.to_string(),
                size: data.len(),
                reason: "injected failure".to_string(),
            });
        }
        self.allocations += 1;

        let address = self.next_address;
        let span = (data.len().max(1) as u64).div_ceil(ADDRESS_ALIGNMENT) * ADDRESS_ALIGNMENT;
        self.next_address += span;

        let key = self.buffers.insert(HostBuffer {
            name: name.to_string(),
            usage,
            address,
            bytes: data.to_vec(),
        });

        log::trace!("Host buffer '{}' ({} bytes) at {:#x}", name, data.len(), address);
        Ok(BufferHandle(key.data().as_ffi()))
    }

    fn destroy(&mut self, handle: BufferHandle) {
        if let Some(buffer) = self.buffers.remove(Self::key(handle)) {
            log::trace!("Host buffer '{}' released", buffer.name);
        }
    }

    fn buffer_address(&self, handle: BufferHandle) -> Result<u64, DeviceError> {
        self.buffers
            .get(Self::key(handle))
            .map(|b| b.address)
            .ok_or(DeviceError::InvalidHandle(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses_are_aligned_and_increasing() {
        let mut alloc = HostAllocator::new();
        let a = alloc.create_buffer(&[0u8; 10], BufferUsage::VERTEX, "a").unwrap();
        let b = alloc.create_buffer(&[0u8; 300], BufferUsage::INDEX, "b").unwrap();
        let c = alloc.create_buffer(&[], BufferUsage::STORAGE, "c").unwrap();

        let (a, b, c) = (
            alloc.buffer_address(a).unwrap(),
            alloc.buffer_address(b).unwrap(),
            alloc.buffer_address(c).unwrap(),
        );
        assert_eq!(a % ADDRESS_ALIGNMENT, 0);
        assert_eq!(b, a + 256);
        assert_eq!(c, b + 512);
    }

    #[test]
    fn test_destroy_releases_buffer() {
        let mut alloc = HostAllocator::new();
        let handle = alloc.create_buffer(&[1, 2, 3], BufferUsage::STORAGE, "data").unwrap();
        assert_eq!(alloc.live_buffers(), 1);
        assert_eq!(alloc.contents(handle), Some(&[1u8, 2, 3][..]));
        assert_eq!(alloc.name(handle), Some("data"));

        alloc.destroy(handle);
        assert_eq!(alloc.live_buffers(), 0);
        assert!(matches!(alloc.buffer_address(handle), Err(DeviceError::InvalidHandle(_))));
        // Double destroy is a no-op
        alloc.destroy(handle);
    }

    #[test]
    fn test_fail_after_injects_failure() {
        let mut alloc = HostAllocator::fail_after(2);
        assert!(alloc.create_buffer(&[0], BufferUsage::VERTEX, "one").is_ok());
        assert!(alloc.create_buffer(&[0], BufferUsage::VERTEX, "two").is_ok());
        let err = alloc.create_buffer(&[0], BufferUsage::VERTEX, "three").unwrap_err();
        assert!(err.to_string().contains("three"));

        alloc.set_fail_after(None);
        assert!(alloc.create_buffer(&[0], BufferUsage::VERTEX, "four").is_ok());
    }
}
