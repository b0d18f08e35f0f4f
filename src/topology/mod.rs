pub mod edge;
pub mod face;
pub mod mesh;
pub mod vertex;

#[cfg(test)]
pub(crate) mod fixtures;

pub use edge::{EdgeData, EdgeId};
pub use face::{FaceData, FaceId};
pub use mesh::{MeshData, MeshId};
pub use vertex::{VertexData, VertexId};

use crate::error::TopologyError;
use slotmap::SlotMap;

/// Central arena that owns all topological entities.
///
/// Entities reference each other via typed IDs (generational indices),
/// so `next`/`prev`/`rev`/`vert` links can never dangle into freed memory.
/// Keys are handed out in insertion order on a fresh store, which makes
/// key comparisons a deterministic tie-break.
#[derive(Debug, Default, Clone)]
pub struct TopologyStore {
    vertices: SlotMap<VertexId, VertexData>,
    edges: SlotMap<EdgeId, EdgeData>,
    faces: SlotMap<FaceId, FaceData>,
    meshes: SlotMap<MeshId, MeshData>,
}

impl TopologyStore {
    /// Creates a new, empty topology store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Vertex operations ---

    /// Inserts a vertex and returns its ID.
    pub fn add_vertex(&mut self, data: VertexData) -> VertexId {
        self.vertices.insert(data)
    }

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData, TopologyError> {
        self.vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Returns a mutable reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn vertex_mut(&mut self, id: VertexId) -> Result<&mut VertexData, TopologyError> {
        self.vertices
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Iterates over all vertices in key order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &VertexData)> {
        self.vertices.iter()
    }

    /// Number of vertices in the store.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Replaces the whole vertex arena.
    pub(crate) fn replace_vertices(&mut self, vertices: SlotMap<VertexId, VertexData>) {
        self.vertices = vertices;
    }

    // --- Edge operations ---

    /// Inserts an edge and returns its ID.
    pub fn add_edge(&mut self, data: EdgeData) -> EdgeId {
        self.edges.insert(data)
    }

    /// Returns a reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn edge(&self, id: EdgeId) -> Result<&EdgeData, TopologyError> {
        self.edges
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    /// Returns a mutable reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn edge_mut(&mut self, id: EdgeId) -> Result<&mut EdgeData, TopologyError> {
        self.edges
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    /// Iterates over all edges in key order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &EdgeData)> {
        self.edges.iter()
    }

    /// Number of half-edges in the store.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Deletes an edge from the arena without touching its neighbours.
    pub(crate) fn free_edge(&mut self, id: EdgeId) {
        self.edges.remove(id);
    }

    // --- Face operations ---

    /// Inserts a face and returns its ID.
    pub fn add_face(&mut self, data: FaceData) -> FaceId {
        self.faces.insert(data)
    }

    /// Returns a reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn face(&self, id: FaceId) -> Result<&FaceData, TopologyError> {
        self.faces
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))
    }

    /// Returns a mutable reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn face_mut(&mut self, id: FaceId) -> Result<&mut FaceData, TopologyError> {
        self.faces
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))
    }

    /// Iterates over all faces in key order.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &FaceData)> {
        self.faces.iter()
    }

    /// Number of faces in the store.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Deletes a face record without touching its edges.
    pub(crate) fn free_face(&mut self, id: FaceId) {
        self.faces.remove(id);
    }

    // --- Mesh operations ---

    /// Inserts a mesh and returns its ID.
    pub fn add_mesh(&mut self, data: MeshData) -> MeshId {
        self.meshes.insert(data)
    }

    /// Returns a reference to the mesh data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn mesh(&self, id: MeshId) -> Result<&MeshData, TopologyError> {
        self.meshes
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("mesh".into()))
    }

    /// Returns a mutable reference to the mesh data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn mesh_mut(&mut self, id: MeshId) -> Result<&mut MeshData, TopologyError> {
        self.meshes
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("mesh".into()))
    }

    /// Deletes a mesh record. Its faces are left in place.
    pub(crate) fn free_mesh(&mut self, id: MeshId) -> Option<MeshData> {
        self.meshes.remove(id)
    }
}
