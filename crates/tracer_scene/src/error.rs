//! Error types for scene loading and materialization
//!
//! Every fallible operation in the crate returns [`SceneResult`]. The variants
//! mirror the phase in which a failure can occur:
//!
//! - [`SceneError::Config`]: the description is missing a required key or uses
//!   an unrecognized enum-like value
//! - [`SceneError::Reference`]: an instance or pair points at a mesh name or
//!   shot index that does not exist
//! - [`SceneError::Resource`]: a file could not be found, read or decoded
//! - [`SceneError::Device`]: the external allocator or acceleration builder
//!   reported a failure

use crate::assets::ObjError;
use crate::device::DeviceError;
use thiserror::Error;

/// Result alias used throughout the crate
pub type SceneResult<T> = Result<T, SceneError>;

/// Scene loading and materialization errors
#[derive(Error, Debug)]
pub enum SceneError {
    /// Missing required key or unrecognized value in the description
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dangling mesh-name or shot-index reference
    #[error("Reference error: {0}")]
    Reference(String),

    /// File not found, unreadable or malformed
    #[error("Resource error: {0}")]
    Resource(String),

    /// Failure surfaced by a device collaborator
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
}

impl SceneError {
    /// Whether this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Whether this is a reference error
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }

    /// Whether this is a resource error
    pub fn is_resource(&self) -> bool {
        matches!(self, Self::Resource(_))
    }

    /// Whether this is a device error
    pub fn is_device(&self) -> bool {
        matches!(self, Self::Device(_))
    }
}

impl From<ObjError> for SceneError {
    fn from(err: ObjError) -> Self {
        Self::Resource(err.to_string())
    }
}
