use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::Result;
use crate::math::Point3;
use crate::topology::{
    EdgeId, FaceData, FaceId, MeshData, MeshId, TopologyStore, VertexData, VertexId,
};

use super::{CollectVertices, SeparateMeshes};

/// Rewrites shells into a layout that depends only on their geometry and
/// connectivity.
///
/// Vertices are collected and shells separated first. Each face ring is
/// then rotated to start at its lexicographically smallest position, faces
/// are sorted by their position sequence within a shell, and shells by
/// their first face. A fresh store is built in that order, so keys, and
/// with them every key-order tie-break, are canonical as well. Running it
/// on its own output changes nothing.
pub struct Canonicalize {
    meshes: Vec<MeshId>,
}

/// A face ring rotated into canonical order, with its positions.
struct CanonicalFace {
    ring: Vec<EdgeId>,
    points: Vec<Point3>,
    source: FaceId,
}

struct CanonicalMesh {
    faces: Vec<CanonicalFace>,
    is_negative: bool,
}

impl Canonicalize {
    /// Creates a new `Canonicalize` operation.
    #[must_use]
    pub fn new(meshes: Vec<MeshId>) -> Self {
        Self { meshes }
    }

    /// Executes the operation, returning the rebuilt store and its shells.
    ///
    /// `store` is left with vertices collected and shells separated; faces
    /// outside `meshes` are not carried over.
    ///
    /// # Errors
    ///
    /// Returns an error if a shell, face ring or vertex is missing.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<(TopologyStore, Vec<MeshId>)> {
        CollectVertices::new(self.meshes.clone()).execute(store)?;
        let meshes = SeparateMeshes::new(self.meshes.clone()).execute(store)?;

        let mut ordered = Vec::with_capacity(meshes.len());
        for mesh in meshes {
            let data = store.mesh(mesh)?;
            let mut faces = data
                .faces
                .iter()
                .map(|&face| canonical_face(store, face))
                .collect::<Result<Vec<_>>>()?;
            faces.sort_by(|a, b| cmp_sequences(&a.points, &b.points));
            ordered.push(CanonicalMesh {
                faces,
                is_negative: data.is_negative,
            });
        }
        ordered.sort_by(|a, b| match (a.faces.first(), b.faces.first()) {
            (Some(fa), Some(fb)) => cmp_sequences(&fa.points, &fb.points),
            (fa, fb) => fa.is_some().cmp(&fb.is_some()),
        });

        rebuild(store, &ordered)
    }
}

fn canonical_face(store: &TopologyStore, face: FaceId) -> Result<CanonicalFace> {
    let mut ring = store.face_edges(face)?;
    let mut points = store.face_points(face)?;
    let n = points.len();
    let rotated = |r: usize| points[r..].iter().chain(&points[..r]);
    let best = (1..n).fold(0, |best, r| {
        let ord = rotated(r)
            .zip(rotated(best))
            .map(|(a, b)| cmp_points(a, b))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal);
        if ord.is_lt() {
            r
        } else {
            best
        }
    });

    ring.rotate_left(best);
    points.rotate_left(best);
    Ok(CanonicalFace {
        ring,
        points,
        source: face,
    })
}

fn cmp_points(a: &Point3, b: &Point3) -> Ordering {
    a.x.total_cmp(&b.x)
        .then(a.y.total_cmp(&b.y))
        .then(a.z.total_cmp(&b.z))
}

fn cmp_sequences(a: &[Point3], b: &[Point3]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(p, q)| cmp_points(p, q))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

/// Builds a fresh store holding `meshes` in the given order.
fn rebuild(
    old: &TopologyStore,
    meshes: &[CanonicalMesh],
) -> Result<(TopologyStore, Vec<MeshId>)> {
    let mut store = TopologyStore::new();
    let mut vertex_map: HashMap<VertexId, VertexId> = HashMap::new();
    let mut edge_map: HashMap<EdgeId, EdgeId> = HashMap::new();
    let mut out = Vec::with_capacity(meshes.len());

    for mesh in meshes {
        let mut faces = Vec::with_capacity(mesh.faces.len());
        for face in &mesh.faces {
            let mut ring = Vec::with_capacity(face.ring.len());
            for &e in &face.ring {
                let vert = old.edge(e)?.vert;
                let new_vert = match vertex_map.get(&vert) {
                    Some(&v) => v,
                    None => {
                        let v = store.add_vertex(VertexData::clone(old.vertex(vert)?));
                        vertex_map.insert(vert, v);
                        v
                    }
                };
                let new_edge = store.add_isolated_edge(new_vert);
                edge_map.insert(e, new_edge);
                ring.push(new_edge);
            }

            let source = old.face(face.source)?;
            let n = ring.len();
            let new_face = store.add_face(FaceData {
                normal: source.normal,
                d: source.d,
                projection: source.projection,
                ..FaceData::new(ring[0], n)
            });
            for i in 0..n {
                let edge = store.edge_mut(ring[i])?;
                edge.next = ring[(i + 1) % n];
                edge.prev = ring[(i + n - 1) % n];
                edge.face = Some(new_face);
            }
            faces.push(new_face);
        }

        let id = store.add_mesh(MeshData {
            is_negative: mesh.is_negative,
            ..MeshData::new(faces.clone())
        });
        for face in faces {
            store.face_mut(face)?.mesh = Some(id);
        }
        out.push(id);
    }

    for (&old_edge, &new_edge) in &edge_map {
        let rev = old.edge(old_edge)?.rev.and_then(|r| edge_map.get(&r).copied());
        store.edge_mut(new_edge)?.rev = rev;
    }
    for &mesh in &out {
        store.cache_mesh_edges(mesh)?;
    }
    Ok((store, out))
}
