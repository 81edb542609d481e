//! Mesh name table and shot pairs

use crate::foundation::collections::NamedRegistry;
use crate::scene::mesh::{Mesh, MeshId};

/// Meshes addressable by name and by [`MeshId`]
///
/// Ids follow first-declaration order and never depend on how names sort.
#[derive(Debug, Clone, Default)]
pub struct MeshRegistry {
    meshes: NamedRegistry<Mesh>,
}

impl MeshRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mesh under `name`
    ///
    /// A name that is already present keeps its id; the new mesh replaces the
    /// old one.
    pub fn register(&mut self, name: impl Into<String>, mesh: Mesh) -> MeshId {
        let name = name.into();
        let (idx, replaced) = self.meshes.insert(name.clone(), mesh);
        if replaced.is_some() {
            log::warn!("Mesh '{}' declared twice, keeping the last definition", name);
        }
        MeshId(idx as u32)
    }

    /// Id registered for `name`
    pub fn id_of(&self, name: &str) -> Option<MeshId> {
        self.meshes.index_of(name).map(|idx| MeshId(idx as u32))
    }

    /// Mesh by id
    pub fn get(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.index())
    }

    /// Name by id
    pub fn name(&self, id: MeshId) -> Option<&str> {
        self.meshes.name(id.index())
    }

    /// Number of meshes
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Whether no mesh is registered
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Iterate in id order
    pub fn iter(&self) -> impl Iterator<Item = (MeshId, &str, &Mesh)> {
        self.meshes
            .iter()
            .map(|(idx, name, mesh)| (MeshId(idx as u32), name, mesh))
    }

    /// Drop every mesh
    pub fn clear(&mut self) {
        self.meshes.clear();
    }
}

/// Reference and source shot indices of one multiview pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pair {
    /// Shot rendered as the reference view
    pub reference: usize,
    /// Shot rendered as the source view
    pub source: usize,
}

impl Pair {
    /// Create a pair
    pub fn new(reference: usize, source: usize) -> Self {
        Self { reference, source }
    }
}
