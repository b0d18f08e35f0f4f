use crate::error::TopologyError;
use crate::math::Point3;

use super::face::FaceId;
use super::vertex::VertexId;
use super::TopologyStore;

slotmap::new_key_type! {
    /// Unique identifier for a half-edge in the topology store.
    pub struct EdgeId;
}

/// Data associated with a half-edge.
///
/// A half-edge runs from `vert` to `next.vert` along the boundary of its
/// owning face. `next`/`prev` form the face's ring; an edge that belongs to
/// no ring points at itself. `rev` is the oppositely directed half-edge of
/// the adjoining face, or `None` on an open boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeData {
    /// Start vertex.
    pub vert: VertexId,
    /// Owning face, `None` while the edge is unlinked.
    pub face: Option<FaceId>,
    /// Next edge around the face.
    pub next: EdgeId,
    /// Previous edge around the face.
    pub prev: EdgeId,
    /// Opposite half-edge, if stitched.
    pub rev: Option<EdgeId>,
}

impl TopologyStore {
    /// Inserts an edge that forms a ring of one and belongs to no face.
    pub fn add_isolated_edge(&mut self, vert: VertexId) -> EdgeId {
        self.edges.insert_with_key(|id| EdgeData {
            vert,
            face: None,
            next: id,
            prev: id,
            rev: None,
        })
    }

    /// Returns the vertex at which `edge` ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge or its successor is missing.
    pub fn edge_end(&self, edge: EdgeId) -> Result<VertexId, TopologyError> {
        let next = self.edge(edge)?.next;
        Ok(self.edge(next)?.vert)
    }

    /// Returns the `(start, end)` vertices of `edge`.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge or its successor is missing.
    pub fn edge_vertices(&self, edge: EdgeId) -> Result<(VertexId, VertexId), TopologyError> {
        Ok((self.edge(edge)?.vert, self.edge_end(edge)?))
    }

    /// Returns the start and end positions of `edge`.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge or one of its vertices is missing.
    pub fn edge_points(&self, edge: EdgeId) -> Result<(Point3, Point3), TopologyError> {
        let (a, b) = self.edge_vertices(edge)?;
        Ok((self.vertex(a)?.point, self.vertex(b)?.point))
    }

    /// Returns `true` if `edge` is a ring of one with no owning face.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is missing.
    pub fn is_isolated(&self, edge: EdgeId) -> Result<bool, TopologyError> {
        let data = self.edge(edge)?;
        Ok(data.next == edge && data.prev == edge && data.face.is_none())
    }

    /// Links `a` and `b` as each other's `rev`.
    ///
    /// Any previous partners of either edge are released first.
    ///
    /// # Errors
    ///
    /// Returns an error if either edge is missing.
    pub fn link_rev(&mut self, a: EdgeId, b: EdgeId) -> Result<(), TopologyError> {
        self.clear_rev(a)?;
        self.clear_rev(b)?;
        self.edge_mut(a)?.rev = Some(b);
        self.edge_mut(b)?.rev = Some(a);
        Ok(())
    }

    /// Clears the `rev` link of `edge` and of its partner.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is missing.
    pub fn clear_rev(&mut self, edge: EdgeId) -> Result<(), TopologyError> {
        if let Some(rev) = self.edge(edge)?.rev {
            if let Ok(partner) = self.edge_mut(rev) {
                if partner.rev == Some(edge) {
                    partner.rev = None;
                }
            }
            self.edge_mut(edge)?.rev = None;
        }
        Ok(())
    }

    /// Splices the isolated `edge` into the ring of `other`, just before it.
    ///
    /// `edge` joins `other`'s face and that face's edge count grows by one.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::EdgeStillLinked`] if `edge` is not isolated,
    /// or an error if either edge is missing.
    pub fn insert_before(&mut self, edge: EdgeId, other: EdgeId) -> Result<(), TopologyError> {
        if !self.is_isolated(edge)? {
            return Err(TopologyError::EdgeStillLinked);
        }
        let prev = self.edge(other)?.prev;
        self.splice_between(edge, prev, other)
    }

    /// Splices the isolated `edge` into the ring of `other`, just after it.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::EdgeStillLinked`] if `edge` is not isolated,
    /// or an error if either edge is missing.
    pub fn insert_after(&mut self, edge: EdgeId, other: EdgeId) -> Result<(), TopologyError> {
        if !self.is_isolated(edge)? {
            return Err(TopologyError::EdgeStillLinked);
        }
        let next = self.edge(other)?.next;
        self.splice_between(edge, other, next)
    }

    fn splice_between(
        &mut self,
        edge: EdgeId,
        prev: EdgeId,
        next: EdgeId,
    ) -> Result<(), TopologyError> {
        let face = self.edge(prev)?.face;
        {
            let data = self.edge_mut(edge)?;
            data.prev = prev;
            data.next = next;
            data.face = face;
        }
        self.edge_mut(prev)?.next = edge;
        self.edge_mut(next)?.prev = edge;
        if let Some(face) = face {
            self.face_mut(face)?.n_edges += 1;
        }
        Ok(())
    }

    /// Removes `edge` from its ring, leaving it isolated.
    ///
    /// The neighbours are joined around it, the `rev` link is cleared on both
    /// sides, and the owning face's edge count shrinks by one.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge or a neighbour is missing.
    pub fn unlink(&mut self, edge: EdgeId) -> Result<(), TopologyError> {
        self.clear_rev(edge)?;
        let EdgeData {
            next, prev, face, ..
        } = self.edge(edge)?.clone();

        if next != edge {
            self.edge_mut(prev)?.next = next;
            self.edge_mut(next)?.prev = prev;
        }
        if let Some(face) = face {
            let data = self.face_mut(face)?;
            data.n_edges = data.n_edges.saturating_sub(1);
            if data.edge == edge {
                data.edge = next;
            }
        }

        let data = self.edge_mut(edge)?;
        data.next = edge;
        data.prev = edge;
        data.face = None;
        Ok(())
    }
}
