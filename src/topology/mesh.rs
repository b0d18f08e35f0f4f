use std::collections::{HashSet, VecDeque};

use crate::error::TopologyError;
use crate::math::Vector3;

use super::edge::EdgeId;
use super::face::FaceId;
use super::vertex::VertexId;
use super::TopologyStore;

slotmap::new_key_type! {
    /// Unique identifier for a mesh (shell) in the topology store.
    pub struct MeshId;
}

/// Data associated with a mesh.
///
/// A mesh is one edge-connected shell of faces. It may be open or closed.
/// `open_edges` and `closed_edges` are caches refreshed by
/// [`TopologyStore::cache_mesh_edges`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshData {
    /// The faces that make up this shell.
    pub faces: Vec<FaceId>,
    /// Edges with no `rev` partner.
    pub open_edges: Vec<EdgeId>,
    /// One edge per stitched pair: the one with the smaller key.
    pub closed_edges: Vec<EdgeId>,
    /// Whether this closed shell is inside out (encloses negative volume).
    pub is_negative: bool,
}

impl MeshData {
    /// Creates a mesh over `faces` with empty caches.
    #[must_use]
    pub fn new(faces: Vec<FaceId>) -> Self {
        Self {
            faces,
            ..Self::default()
        }
    }

    /// Whether this shell is closed (watertight).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.open_edges.is_empty()
    }

    /// Number of faces in the shell.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

impl TopologyStore {
    /// Refreshes the open and closed edge lists of `mesh`.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh is missing or a face ring is broken.
    pub fn cache_mesh_edges(&mut self, mesh: MeshId) -> Result<(), TopologyError> {
        let mut open_edges = Vec::new();
        let mut closed_edges = Vec::new();
        for &face in &self.mesh(mesh)?.faces {
            for e in self.face_edges(face)? {
                match self.edge(e)?.rev {
                    None => open_edges.push(e),
                    Some(rev) if e < rev => closed_edges.push(e),
                    Some(_) => {}
                }
            }
        }
        let data = self.mesh_mut(mesh)?;
        data.open_edges = open_edges;
        data.closed_edges = closed_edges;
        Ok(())
    }

    /// Walks the `rev` adjacency of `mesh` and derives `is_negative`.
    ///
    /// Returns `true` if every stitched pair runs in opposite directions.
    /// A closed, consistent shell is negative when its signed volume is
    /// below zero; open or inconsistent shells are never negative.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh or one of its entities is missing.
    pub fn calc_mesh_orientation(&mut self, mesh: MeshId) -> Result<bool, TopologyError> {
        let data = self.mesh(mesh)?;
        let closed = data.is_closed();
        let Some(&seed) = data.faces.first() else {
            self.mesh_mut(mesh)?.is_negative = false;
            return Ok(true);
        };

        let mut consistent = true;
        let mut visited: HashSet<FaceId> = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(seed);
        queue.push_back(seed);

        while let Some(face) = queue.pop_front() {
            for e in self.face_edges(face)? {
                let Some(rev) = self.edge(e)?.rev else {
                    continue;
                };
                let (a, b) = self.edge_vertices(e)?;
                let (ra, rb) = self.edge_vertices(rev)?;
                if a != rb || b != ra {
                    consistent = false;
                }
                if let Some(neighbour) = self.edge(rev)?.face {
                    if visited.insert(neighbour) {
                        queue.push_back(neighbour);
                    }
                }
            }
        }

        let is_negative = closed && consistent && self.mesh_signed_volume(mesh)? < 0.0;
        self.mesh_mut(mesh)?.is_negative = is_negative;
        Ok(consistent)
    }

    /// Signed volume enclosed by the faces of `mesh`.
    ///
    /// Sums tetrahedra from the first vertex of the shell over a fan
    /// triangulation of every face. Only meaningful for closed shells.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh or one of its entities is missing.
    pub fn mesh_signed_volume(&self, mesh: MeshId) -> Result<f64, TopologyError> {
        let data = self.mesh(mesh)?;
        let Some(&first) = data.faces.first() else {
            return Ok(0.0);
        };
        let origin = self.face_points(first)?[0];

        let mut six_volume = 0.0;
        for &face in &data.faces {
            let points = self.face_points(face)?;
            let a: Vector3 = points[0] - origin;
            for w in points[1..].windows(2) {
                let b = w[0] - origin;
                let c = w[1] - origin;
                six_volume += a.dot(&b.cross(&c));
            }
        }
        Ok(six_volume / 6.0)
    }

    /// Distinct vertices used by `mesh`, in first-visit order.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh or one of its faces is missing.
    pub fn mesh_vertices(&self, mesh: MeshId) -> Result<Vec<VertexId>, TopologyError> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for &face in &self.mesh(mesh)?.faces {
            for v in self.face_vertices(face)? {
                if seen.insert(v) {
                    out.push(v);
                }
            }
        }
        Ok(out)
    }

    /// Inverts every face of `mesh` and flips `is_negative`.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh or a face ring is missing.
    pub fn invert_mesh(&mut self, mesh: MeshId) -> Result<(), TopologyError> {
        let faces = self.mesh(mesh)?.faces.clone();
        for face in faces {
            self.invert_face(face)?;
        }
        let data = self.mesh_mut(mesh)?;
        if data.is_closed() {
            data.is_negative = !data.is_negative;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use crate::topology::fixtures::{cube_points, cube_quads, cube_set, open_box_set};
    use crate::{MeshOptions, MeshSet};

    #[test]
    fn closed_cube_caches() {
        let set = cube_set(1.0);
        let data = set.store().mesh(set.meshes()[0]).unwrap();
        assert!(data.is_closed());
        assert_eq!(data.face_count(), 6);
        assert_eq!(data.closed_edges.len(), 12);
        assert!(data.open_edges.is_empty());
        assert!(!data.is_negative);
    }

    #[test]
    fn closed_edges_pick_smaller_key() {
        let set = cube_set(1.0);
        let store = set.store();
        let data = store.mesh(set.meshes()[0]).unwrap();
        for &e in &data.closed_edges {
            assert!(e < store.edge(e).unwrap().rev.unwrap());
        }
    }

    #[test]
    fn open_box_has_rim() {
        let set = open_box_set(2.0);
        let data = set.store().mesh(set.meshes()[0]).unwrap();
        assert!(!data.is_closed());
        assert_eq!(data.open_edges.len(), 4);
        assert_eq!(data.closed_edges.len(), 8);
        assert!(!data.is_negative);
    }

    #[test]
    fn signed_volume_of_cube() {
        let set = cube_set(3.0);
        let v = set.store().mesh_signed_volume(set.meshes()[0]).unwrap();
        assert_relative_eq!(v, 27.0, epsilon = 1e-9);
    }

    #[test]
    fn reversed_cube_is_negative_until_inverted() {
        let polys: Vec<Vec<usize>> = cube_quads()
            .into_iter()
            .map(|q| q.into_iter().rev().collect())
            .collect();
        let mut set =
            MeshSet::from_polygons(&cube_points(1.0), &polys, MeshOptions::default()).unwrap();
        let mesh = set.meshes()[0];
        assert!(set.store().mesh(mesh).unwrap().is_negative);

        set.store_mut().invert_mesh(mesh).unwrap();
        assert!(!set.store().mesh(mesh).unwrap().is_negative);
        assert_relative_eq!(
            set.store().mesh_signed_volume(mesh).unwrap(),
            1.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn mesh_vertices_are_distinct() {
        let set = cube_set(1.0);
        let verts = set.store().mesh_vertices(set.meshes()[0]).unwrap();
        assert_eq!(verts.len(), 8);
    }
}
