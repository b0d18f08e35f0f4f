use std::collections::HashSet;

use crate::error::Result;
use crate::math::polygon_3d::polygon_plane;
use crate::math::Point3;
use crate::topology::{EdgeId, FaceId, TopologyStore, VertexId};

/// Merges the face across an edge into the edge's own face.
///
/// The maximal run of consecutive edges the two faces share around `edge`
/// is dropped and the remaining edges of both rings are threaded into one.
/// The face owning `edge` survives; the other face is deleted.
///
/// Returns `None` and leaves the store untouched if the edge is open, both
/// sides are the same face, the faces belong to different shells, or the
/// merged ring would have fewer than three edges, repeat a vertex, or
/// enclose no area.
pub struct MergeFaces {
    edge: EdgeId,
}

impl MergeFaces {
    /// Creates a new `MergeFaces` operation.
    #[must_use]
    pub fn new(edge: EdgeId) -> Self {
        Self { edge }
    }

    /// Executes the operation, returning the surviving face.
    ///
    /// # Errors
    ///
    /// Returns an error if `edge` or one of the faces is missing or broken.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<Option<FaceId>> {
        let Some((face, other)) = sides(store, self.edge)? else {
            return Ok(None);
        };
        let n = store.face(face)?.n_edges.min(store.face(other)?.n_edges);

        let mut first = self.edge;
        let mut last = self.edge;
        let mut shared = 1;
        while shared < n {
            let prev = store.edge(first)?.prev;
            let across = store.edge(rev_of(store, first)?)?.next;
            if store.edge(prev)?.rev != Some(across) {
                break;
            }
            first = prev;
            shared += 1;
        }
        while shared < n {
            let next = store.edge(last)?.next;
            let across = store.edge(rev_of(store, last)?)?.prev;
            if store.edge(next)?.rev != Some(across) {
                break;
            }
            last = next;
            shared += 1;
        }
        if shared >= n {
            return Ok(None);
        }

        join_faces(store, face, other, first, last, shared)
    }
}

/// Drops one stitched pair of half-edges.
///
/// Across two faces this is a merge that drops only the pair at `edge`.
/// Inside one face the pair must form a spur (the edge turns straight back
/// along its partner), which is cut off the ring.
///
/// Returns `None` and leaves the store untouched if the pair is neither,
/// or the resulting ring would be degenerate.
pub struct RemoveHalfEdge {
    edge: EdgeId,
}

impl RemoveHalfEdge {
    /// Creates a new `RemoveHalfEdge` operation.
    #[must_use]
    pub fn new(edge: EdgeId) -> Self {
        Self { edge }
    }

    /// Executes the operation, returning the face that kept the remaining
    /// edges.
    ///
    /// # Errors
    ///
    /// Returns an error if `edge` or its face is missing or broken.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<Option<FaceId>> {
        let Some(rev) = store.edge(self.edge)?.rev else {
            return Ok(None);
        };
        let face = store.edge(self.edge)?.face;
        if face != store.edge(rev)?.face {
            let Some((face, other)) = sides(store, self.edge)? else {
                return Ok(None);
            };
            return join_faces(store, face, other, self.edge, self.edge, 1);
        }
        let Some(face) = face else {
            return Ok(None);
        };

        let (head, tail) = if store.edge(self.edge)?.next == rev {
            (self.edge, rev)
        } else if store.edge(rev)?.next == self.edge {
            (rev, self.edge)
        } else {
            return Ok(None);
        };
        cut_spur(store, face, head, tail)
    }
}

/// The faces on either side of `edge`, when they are distinct faces of the
/// same shell.
fn sides(store: &TopologyStore, edge: EdgeId) -> Result<Option<(FaceId, FaceId)>> {
    let data = store.edge(edge)?;
    let (Some(face), Some(rev)) = (data.face, data.rev) else {
        return Ok(None);
    };
    let Some(other) = store.edge(rev)?.face else {
        return Ok(None);
    };
    if face == other || store.face(face)?.mesh != store.face(other)?.mesh {
        return Ok(None);
    }
    Ok(Some((face, other)))
}

fn rev_of(store: &TopologyStore, edge: EdgeId) -> Result<EdgeId> {
    Ok(store.edge(edge)?.rev.unwrap_or(edge))
}

/// Follows `next` from `from` to `to`, both inclusive.
fn walk(store: &TopologyStore, from: EdgeId, to: EdgeId, limit: usize) -> Result<Vec<EdgeId>> {
    let mut out = vec![from];
    let mut e = from;
    while e != to && out.len() <= limit {
        e = store.edge(e)?.next;
        out.push(e);
    }
    Ok(out)
}

/// Returns `true` if the ring through `edges` is a usable face boundary.
fn is_usable_ring(store: &TopologyStore, edges: &[EdgeId]) -> Result<bool> {
    if edges.len() < 3 {
        return Ok(false);
    }
    let verts: Vec<VertexId> = edges
        .iter()
        .map(|&e| store.edge(e).map(|d| d.vert))
        .collect::<std::result::Result<_, _>>()?;
    let distinct: HashSet<VertexId> = verts.iter().copied().collect();
    if distinct.len() != verts.len() {
        return Ok(false);
    }
    let points: Vec<Point3> = verts
        .iter()
        .map(|&v| store.vertex(v).map(|d| d.point))
        .collect::<std::result::Result<_, _>>()?;
    Ok(polygon_plane(&points).is_some())
}

/// Threads `other` into `face`, dropping the `shared` edges from `first` to
/// `last` in `face` together with their partners.
fn join_faces(
    store: &mut TopologyStore,
    face: FaceId,
    other: FaceId,
    first: EdgeId,
    last: EdgeId,
    shared: usize,
) -> Result<Option<FaceId>> {
    let n_face = store.face(face)?.n_edges;
    let n_other = store.face(other)?.n_edges;

    let face_start = store.edge(last)?.next;
    let face_end = store.edge(first)?.prev;
    let other_start = store.edge(rev_of(store, first)?)?.next;
    let other_end = store.edge(rev_of(store, last)?)?.prev;

    let kept_face = walk(store, face_start, face_end, n_face)?;
    let kept_other = walk(store, other_start, other_end, n_other)?;
    if kept_face.len() != n_face - shared || kept_other.len() != n_other - shared {
        return Ok(None);
    }
    let merged: Vec<EdgeId> = kept_face.iter().chain(&kept_other).copied().collect();
    if !is_usable_ring(store, &merged)? {
        return Ok(None);
    }

    let dropped = walk(store, first, last, shared)?;
    let dropped_rev = dropped
        .iter()
        .map(|&e| rev_of(store, e))
        .collect::<Result<Vec<_>>>()?;

    store.edge_mut(face_end)?.next = other_start;
    store.edge_mut(other_start)?.prev = face_end;
    store.edge_mut(other_end)?.next = face_start;
    store.edge_mut(face_start)?.prev = other_end;
    for &e in &kept_other {
        store.edge_mut(e)?.face = Some(face);
    }
    for e in dropped.into_iter().chain(dropped_rev) {
        store.free_edge(e);
    }
    {
        let data = store.face_mut(face)?;
        data.n_edges = merged.len();
        data.edge = face_start;
    }

    let mesh = store.face(other)?.mesh;
    store.free_face(other);
    store.recalc_face(face)?;
    if let Some(mesh) = mesh {
        store.mesh_mut(mesh)?.faces.retain(|&f| f != other);
        store.cache_mesh_edges(mesh)?;
    }
    Ok(Some(face))
}

/// Cuts the spur `head -> tail` (where `tail` runs back along `head`) out
/// of the ring of `face`.
fn cut_spur(
    store: &mut TopologyStore,
    face: FaceId,
    head: EdgeId,
    tail: EdgeId,
) -> Result<Option<FaceId>> {
    let n = store.face(face)?.n_edges;
    let before = store.edge(head)?.prev;
    let after = store.edge(tail)?.next;
    if n < 5 || before == tail {
        return Ok(None);
    }
    let kept = walk(store, after, before, n)?;
    if kept.len() != n - 2 || !is_usable_ring(store, &kept)? {
        return Ok(None);
    }

    store.edge_mut(before)?.next = after;
    store.edge_mut(after)?.prev = before;
    store.free_edge(head);
    store.free_edge(tail);
    {
        let data = store.face_mut(face)?;
        data.n_edges = kept.len();
        data.edge = after;
    }
    store.recalc_face(face)?;
    if let Some(mesh) = store.face(face)?.mesh {
        store.cache_mesh_edges(mesh)?;
    }
    Ok(Some(face))
}
