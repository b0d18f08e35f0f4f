use std::collections::{HashMap, HashSet};

use slotmap::SlotMap;
use tracing::debug;

use crate::error::Result;
use crate::topology::{EdgeId, MeshId, TopologyStore, VertexData, VertexId};

/// Rebuilds the vertex arena from the vertices the edges actually use.
///
/// Vertices are renumbered in the order the shells first reach them, then
/// any remaining edges of the store in key order. Positions that are equal
/// bit for bit collapse into one vertex, which keeps the first tag seen.
/// Vertices no edge starts at are dropped.
pub struct CollectVertices {
    meshes: Vec<MeshId>,
}

impl CollectVertices {
    /// Creates a new `CollectVertices` operation.
    #[must_use]
    pub fn new(meshes: Vec<MeshId>) -> Self {
        Self { meshes }
    }

    /// Executes the operation.
    ///
    /// # Errors
    ///
    /// Returns an error if a shell, face ring or vertex is missing.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<()> {
        let mut order: Vec<EdgeId> = Vec::with_capacity(store.edge_count());
        let mut seen = HashSet::with_capacity(store.edge_count());
        for &mesh in &self.meshes {
            for &face in &store.mesh(mesh)?.faces {
                for e in store.face_edges(face)? {
                    if seen.insert(e) {
                        order.push(e);
                    }
                }
            }
        }
        order.extend(store.edges().map(|(e, _)| e).filter(|e| !seen.contains(e)));

        let before = store.vertex_count();
        let mut vertices: SlotMap<VertexId, VertexData> = SlotMap::with_key();
        let mut by_position: HashMap<[u64; 3], VertexId> = HashMap::new();
        let mut remap: HashMap<VertexId, VertexId> = HashMap::new();
        let mut targets = Vec::with_capacity(order.len());
        for e in order {
            let old = store.edge(e)?.vert;
            let new = match remap.get(&old) {
                Some(&new) => new,
                None => {
                    let data = store.vertex(old)?;
                    let new = *by_position
                        .entry(data.exact_key())
                        .or_insert_with(|| vertices.insert(data.clone()));
                    remap.insert(old, new);
                    new
                }
            };
            targets.push((e, new));
        }

        for (e, vert) in targets {
            store.edge_mut(e)?.vert = vert;
        }
        debug!(before, after = vertices.len(), "collected vertices");
        store.replace_vertices(vertices);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::query::IsValid;
    use crate::topology::fixtures::{cube_points, cube_quads};
    use crate::{MeshOptions, MeshSet};

    #[test]
    fn unused_vertices_are_dropped() {
        let mut points = cube_points(1.0);
        points.push(Point3::new(5.0, 5.0, 5.0));
        let mut set =
            MeshSet::from_polygons(&points, &cube_quads(), MeshOptions::default()).unwrap();
        assert_eq!(set.store().vertex_count(), 9);

        let meshes = set.meshes().to_vec();
        CollectVertices::new(meshes).execute(set.store_mut()).unwrap();
        assert_eq!(set.store().vertex_count(), 8);
        IsValid::new(set.meshes()[0]).check(set.store()).unwrap();
    }

    #[test]
    fn coincident_positions_merge() {
        // Each quad gets its own copy of its corners, so nothing stitches
        // until the copies are merged.
        let corners = cube_points(1.0);
        let mut points = Vec::new();
        let mut polys = Vec::new();
        for quad in cube_quads() {
            polys.push((points.len()..points.len() + 4).collect::<Vec<_>>());
            points.extend(quad.iter().map(|&i| corners[i]));
        }
        let mut set = MeshSet::from_polygons(&points, &polys, MeshOptions::default()).unwrap();
        assert_eq!(set.meshes().len(), 6);
        assert_eq!(set.store().vertex_count(), 24);

        set.collect_vertices().unwrap();
        assert_eq!(set.store().vertex_count(), 8);

        let faces: Vec<_> = set.faces().collect();
        let restitched =
            MeshSet::from_faces(set.store().clone(), faces, MeshOptions::default()).unwrap();
        assert_eq!(restitched.meshes().len(), 1);
        assert!(restitched.is_closed());
    }

    #[test]
    fn negative_zero_matches_zero() {
        let mut points = cube_points(1.0);
        points.push(Point3::new(-0.0, 0.0, -0.0));
        let mut polys = cube_quads();
        // Swap corner 0 of the bottom quad for its signed-zero twin.
        polys[0][0] = 8;
        let mut set = MeshSet::from_polygons(&points, &polys, MeshOptions::default()).unwrap();
        set.collect_vertices().unwrap();
        assert_eq!(set.store().vertex_count(), 8);
    }

    #[test]
    fn first_tag_survives() {
        let mut set = MeshSet::default();
        let store = set.store_mut();
        let a = store.add_vertex(VertexData::new(Point3::origin()).with_tag(7));
        let b = store.add_vertex(VertexData::new(Point3::origin()).with_tag(9));
        let ea = store.add_isolated_edge(a);
        let eb = store.add_isolated_edge(b);

        CollectVertices::new(Vec::new()).execute(store).unwrap();
        assert_eq!(store.vertex_count(), 1);
        let va = store.edge(ea).unwrap().vert;
        assert_eq!(store.edge(eb).unwrap().vert, va);
        assert_eq!(store.vertex(va).unwrap().tag, Some(7));
    }
}
