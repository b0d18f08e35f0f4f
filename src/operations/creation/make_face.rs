use crate::error::{Result, TopologyError};
use crate::math::polygon_3d::polygon_plane;
use crate::math::{Point3, Projection};
use crate::topology::{EdgeId, FaceData, FaceId, TopologyStore, VertexId};

/// Creates a face from a loop of existing vertices.
///
/// The face gets its own ring of unstitched half-edges; `rev` links are
/// established later by stitching.
pub struct MakeFace {
    vertices: Vec<VertexId>,
}

impl MakeFace {
    /// Creates a new `MakeFace` operation.
    #[must_use]
    pub fn new(vertices: Vec<VertexId>) -> Self {
        Self { vertices }
    }

    /// Executes the operation, creating the face in the topology store.
    ///
    /// Nothing is inserted when the loop is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::DegenerateFace`] if the loop has fewer than
    /// three vertices, repeats a vertex consecutively, has a zero-length
    /// edge, or encloses no area. Returns an error if a vertex is missing.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<FaceId> {
        let n = self.vertices.len();
        if n < 3 {
            return Err(TopologyError::DegenerateFace(format!("{n} vertices")).into());
        }

        let points: Vec<Point3> = self
            .vertices
            .iter()
            .map(|&v| store.vertex(v).map(|d| d.point))
            .collect::<std::result::Result<_, _>>()?;

        for i in 0..n {
            let j = (i + 1) % n;
            if self.vertices[i] == self.vertices[j] {
                return Err(
                    TopologyError::DegenerateFace(format!("vertex repeated at {i}")).into(),
                );
            }
            if points[i] == points[j] {
                return Err(
                    TopologyError::DegenerateFace(format!("zero-length edge at {i}")).into(),
                );
            }
        }

        let (normal, d) = polygon_plane(&points)
            .ok_or_else(|| TopologyError::DegenerateFace("polygon has no area".into()))?;

        let ring: Vec<EdgeId> = self
            .vertices
            .iter()
            .map(|&v| store.add_isolated_edge(v))
            .collect();
        let face = store.add_face(FaceData {
            normal,
            d,
            projection: Projection::from_normal(&normal),
            ..FaceData::new(ring[0], n)
        });

        for i in 0..n {
            let edge = store.edge_mut(ring[i])?;
            edge.next = ring[(i + 1) % n];
            edge.prev = ring[(i + n - 1) % n];
            edge.face = Some(face);
        }

        Ok(face)
    }
}
