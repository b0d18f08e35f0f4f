use crate::error::{GeometryError, TopologyError};
use crate::math::polygon_3d::{
    point_in_polygon_3d, polygon_area_3d, polygon_plane, project, unproject,
};
use crate::math::{Point2, Point3, Projection, Vector3};

use super::edge::EdgeId;
use super::mesh::MeshId;
use super::vertex::VertexId;
use super::TopologyStore;

slotmap::new_key_type! {
    /// Unique identifier for a face in the topology store.
    pub struct FaceId;
}

/// Data associated with a face.
///
/// A face owns a closed ring of half-edges. The supporting plane and the
/// projection used to flatten the face are cached and refreshed by
/// [`TopologyStore::recalc_face`].
#[derive(Debug, Clone, PartialEq)]
pub struct FaceData {
    /// One edge of the ring.
    pub edge: EdgeId,
    /// Number of edges in the ring.
    pub n_edges: usize,
    /// Unit normal of the supporting plane.
    pub normal: Vector3,
    /// Plane offset: `normal . p + d = 0` for points on the face.
    pub d: f64,
    /// Coordinate plane used to flatten the face.
    pub projection: Projection,
    /// Shell this face belongs to, once stitched.
    pub mesh: Option<MeshId>,
}

impl FaceData {
    /// Creates a face record for a ring of `n_edges` edges starting at `edge`.
    ///
    /// The plane is zeroed until the face is recalculated.
    #[must_use]
    pub fn new(edge: EdgeId, n_edges: usize) -> Self {
        Self {
            edge,
            n_edges,
            normal: Vector3::zeros(),
            d: 0.0,
            projection: Projection::Xy,
            mesh: None,
        }
    }
}

impl TopologyStore {
    /// Returns the ring of `face` in `next` order, starting at `face.edge`.
    ///
    /// # Errors
    ///
    /// Returns an error if the ring does not close after exactly `n_edges`
    /// steps or references a missing edge.
    pub fn face_edges(&self, face: FaceId) -> Result<Vec<EdgeId>, TopologyError> {
        let data = self.face(face)?;
        let start = data.edge;
        let mut ring = Vec::with_capacity(data.n_edges);
        let mut e = start;
        for _ in 0..data.n_edges {
            ring.push(e);
            e = self.edge(e)?.next;
        }
        if e != start || ring.is_empty() {
            return Err(TopologyError::InvalidTopology(format!(
                "face ring does not close after {} edges",
                data.n_edges
            )));
        }
        Ok(ring)
    }

    /// Returns the start vertex of every edge of `face`, in ring order.
    ///
    /// # Errors
    ///
    /// Returns an error if the ring is broken.
    pub fn face_vertices(&self, face: FaceId) -> Result<Vec<VertexId>, TopologyError> {
        self.face_edges(face)?
            .into_iter()
            .map(|e| self.edge(e).map(|d| d.vert))
            .collect()
    }

    /// Returns the positions of the vertices of `face`, in ring order.
    ///
    /// # Errors
    ///
    /// Returns an error if the ring is broken or a vertex is missing.
    pub fn face_points(&self, face: FaceId) -> Result<Vec<Point3>, TopologyError> {
        self.face_vertices(face)?
            .into_iter()
            .map(|v| self.vertex(v).map(|d| d.point))
            .collect()
    }

    /// Recomputes the plane and projection of `face` from its vertices.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if the polygon has fewer than
    /// three edges or no area. The cached plane is left untouched then.
    pub fn recalc_face(&mut self, face: FaceId) -> crate::Result<()> {
        let points = self.face_points(face)?;
        let (normal, d) = polygon_plane(&points).ok_or_else(|| {
            GeometryError::Degenerate(format!("face with {} vertices has no area", points.len()))
        })?;
        let data = self.face_mut(face)?;
        data.normal = normal;
        data.d = d;
        data.projection = Projection::from_normal(&normal);
        Ok(())
    }

    /// Reverses the orientation of `face` in place.
    ///
    /// `next` and `prev` are swapped on every edge and each edge takes the
    /// start vertex of its old successor, so an edge keeps covering the same
    /// segment and its `rev` link stays valid once the neighbouring face is
    /// inverted too. Inverting only part of a shell leaves `rev` pairs
    /// running in the same direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the ring is broken.
    pub fn invert_face(&mut self, face: FaceId) -> Result<(), TopologyError> {
        let ring = self.face_edges(face)?;
        let shifted: Vec<VertexId> = ring
            .iter()
            .map(|&e| self.edge_end(e))
            .collect::<Result<_, _>>()?;

        for (&e, vert) in ring.iter().zip(shifted) {
            let data = self.edge_mut(e)?;
            std::mem::swap(&mut data.next, &mut data.prev);
            data.vert = vert;
        }

        let data = self.face_mut(face)?;
        data.normal = -data.normal;
        data.d = -data.d;
        Ok(())
    }

    /// Deletes `face` and its edges.
    ///
    /// Neighbouring edges lose their `rev` link first; the owning mesh drops
    /// the face and refreshes its edge caches.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is missing or its ring is broken.
    pub fn remove_face(&mut self, face: FaceId) -> Result<(), TopologyError> {
        let ring = self.face_edges(face)?;
        for &e in &ring {
            self.clear_rev(e)?;
        }
        for e in ring {
            self.free_edge(e);
        }
        let mesh = self.face(face)?.mesh;
        self.free_face(face);
        if let Some(mesh) = mesh {
            self.mesh_mut(mesh)?.faces.retain(|&f| f != face);
            self.cache_mesh_edges(mesh)?;
        }
        Ok(())
    }

    /// Average of the vertex positions of `face`.
    ///
    /// # Errors
    ///
    /// Returns an error if the ring is broken.
    pub fn face_centroid(&self, face: FaceId) -> Result<Point3, TopologyError> {
        let points = self.face_points(face)?;
        #[allow(clippy::cast_precision_loss)]
        let inv = 1.0 / points.len() as f64;
        let sum = points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Ok(Point3::from(sum * inv))
    }

    /// Area of `face`, measured along its cached normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the ring is broken.
    pub fn face_area(&self, face: FaceId) -> Result<f64, TopologyError> {
        let normal = self.face(face)?.normal;
        Ok(polygon_area_3d(&self.face_points(face)?, &normal))
    }

    /// Flattens `point` with the projection of `face`.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is missing.
    pub fn face_project_point(
        &self,
        face: FaceId,
        point: &Point3,
    ) -> Result<Point2, TopologyError> {
        Ok(project(self.face(face)?.projection, point))
    }

    /// Lifts a flattened point back onto the plane of `face`.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is missing.
    pub fn face_unproject_point(
        &self,
        face: FaceId,
        point: &Point2,
    ) -> Result<Point3, TopologyError> {
        let data = self.face(face)?;
        Ok(unproject(data.projection, point, &data.normal, data.d))
    }

    /// Returns `true` if `point`, assumed on the plane of `face`, lies inside
    /// it.
    ///
    /// # Errors
    ///
    /// Returns an error if the ring is broken.
    pub fn face_contains_point(
        &self,
        face: FaceId,
        point: &Point3,
    ) -> Result<bool, TopologyError> {
        let projection = self.face(face)?.projection;
        Ok(point_in_polygon_3d(point, &self.face_points(face)?, projection))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use crate::math::{Point2, Point3, Projection, Vector3};
    use crate::topology::fixtures::{cube_set, unit_square_face};
    use crate::topology::TopologyStore;

    #[test]
    fn ring_closes_both_ways() {
        let mut store = TopologyStore::new();
        let (face, _) = unit_square_face(&mut store);
        let data = store.face(face).unwrap().clone();

        let mut e = data.edge;
        for _ in 0..data.n_edges {
            e = store.edge(e).unwrap().next;
        }
        assert_eq!(e, data.edge);

        for _ in 0..data.n_edges {
            e = store.edge(e).unwrap().prev;
        }
        assert_eq!(e, data.edge);
    }

    #[test]
    fn recalc_picks_plane_and_projection() {
        let mut store = TopologyStore::new();
        let (face, _) = unit_square_face(&mut store);
        let data = store.face(face).unwrap();
        assert_relative_eq!(data.normal, Vector3::z());
        assert_eq!(data.projection, Projection::Xy);
        assert_relative_eq!(store.face_area(face).unwrap(), 1.0);
    }

    #[test]
    fn invert_reverses_ring_and_normal() {
        let mut store = TopologyStore::new();
        let (face, verts) = unit_square_face(&mut store);
        store.invert_face(face).unwrap();

        let inverted = store.face_vertices(face).unwrap();
        // Edge 0 now runs from the old vertex 1 back to vertex 0.
        assert_eq!(inverted, vec![verts[1], verts[0], verts[3], verts[2]]);
        assert_relative_eq!(store.face(face).unwrap().normal, -Vector3::z());
    }

    #[test]
    fn inverting_whole_shell_keeps_rev_symmetry() {
        let mut set = cube_set(1.0);
        let faces: Vec<_> = set.store().faces().map(|(id, _)| id).collect();
        let store = set.store_mut();
        for face in faces {
            store.invert_face(face).unwrap();
        }
        for (id, data) in store.edges() {
            let rev = data.rev.unwrap();
            assert_eq!(store.edge(rev).unwrap().rev, Some(id));
            assert_eq!(store.edge(rev).unwrap().vert, store.edge_end(id).unwrap());
        }
    }

    #[test]
    fn project_roundtrip_on_face() {
        let mut store = TopologyStore::new();
        let (face, _) = unit_square_face(&mut store);
        let flat = store
            .face_project_point(face, &Point3::new(0.25, 0.75, 0.0))
            .unwrap();
        assert_relative_eq!(flat, Point2::new(0.25, 0.75));
        let back = store.face_unproject_point(face, &flat).unwrap();
        assert_relative_eq!(back, Point3::new(0.25, 0.75, 0.0));
    }

    #[test]
    fn contains_and_centroid() {
        let mut store = TopologyStore::new();
        let (face, _) = unit_square_face(&mut store);
        assert_relative_eq!(
            store.face_centroid(face).unwrap(),
            Point3::new(0.5, 0.5, 0.0)
        );
        assert!(store
            .face_contains_point(face, &Point3::new(0.5, 0.5, 0.0))
            .unwrap());
        assert!(!store
            .face_contains_point(face, &Point3::new(1.5, 0.5, 0.0))
            .unwrap());
    }

    #[test]
    fn remove_face_opens_neighbours() {
        let mut set = cube_set(1.0);
        let mesh = set.meshes()[0];
        let face = set.store().mesh(mesh).unwrap().faces[0];
        set.store_mut().remove_face(face).unwrap();

        let data = set.store().mesh(mesh).unwrap();
        assert_eq!(data.faces.len(), 5);
        assert_eq!(data.open_edges.len(), 4);
        assert!(!data.is_closed());
    }
}
