use std::collections::HashMap;

use tracing::debug;

use crate::error::Result;
use crate::math::DisjointSet;
use crate::topology::{FaceId, MeshData, MeshId, TopologyStore};

/// Splits shells whose faces are no longer edge-connected.
///
/// Connectivity follows `rev` links between faces of the same shell. The
/// component holding a shell's first face keeps the shell; every other
/// component becomes a new shell placed right after it. Caches and
/// orientation are refreshed on every shell that was split.
pub struct SeparateMeshes {
    meshes: Vec<MeshId>,
}

impl SeparateMeshes {
    /// Creates a new `SeparateMeshes` operation.
    #[must_use]
    pub fn new(meshes: Vec<MeshId>) -> Self {
        Self { meshes }
    }

    /// Executes the operation, returning the resulting shell list.
    ///
    /// # Errors
    ///
    /// Returns an error if a shell or one of its faces is missing.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<Vec<MeshId>> {
        let mut out = Vec::with_capacity(self.meshes.len());
        for &mesh in &self.meshes {
            let components = components(store, mesh)?;
            out.push(mesh);
            if components.len() < 2 {
                continue;
            }
            debug!(parts = components.len(), "splitting shell");

            let mut parts = components.into_iter();
            if let Some(first) = parts.next() {
                store.mesh_mut(mesh)?.faces = first;
                refresh(store, mesh)?;
            }
            for faces in parts {
                let split = store.add_mesh(MeshData::new(faces.clone()));
                for face in faces {
                    store.face_mut(face)?.mesh = Some(split);
                }
                refresh(store, split)?;
                out.push(split);
            }
        }
        Ok(out)
    }
}

/// Edge-connected face groups of `mesh`, each in the shell's face order.
fn components(store: &TopologyStore, mesh: MeshId) -> Result<Vec<Vec<FaceId>>> {
    let faces = &store.mesh(mesh)?.faces;
    let index: HashMap<FaceId, usize> = faces.iter().enumerate().map(|(i, &f)| (f, i)).collect();
    let mut sets = DisjointSet::new(faces.len());
    for (i, &face) in faces.iter().enumerate() {
        for e in store.face_edges(face)? {
            let Some(rev) = store.edge(e)?.rev else {
                continue;
            };
            if let Some(&j) = store.edge(rev)?.face.and_then(|f| index.get(&f)) {
                sets.union(i, j);
            }
        }
    }
    Ok(sets
        .groups()
        .into_iter()
        .map(|group| group.into_iter().map(|i| faces[i]).collect())
        .collect())
}

fn refresh(store: &mut TopologyStore, mesh: MeshId) -> Result<()> {
    store.cache_mesh_edges(mesh)?;
    store.calc_mesh_orientation(mesh)?;
    Ok(())
}
