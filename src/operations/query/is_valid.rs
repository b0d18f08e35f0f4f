use std::collections::{HashSet, VecDeque};

use crate::error::TopologyError;
use crate::topology::{EdgeId, FaceId, MeshId, TopologyStore};

/// Validates the topological consistency of a shell.
///
/// Checked, per face: the ring closes after `n_edges` steps in both
/// directions, every ring edge points back at the face, and the face points
/// back at the shell. Per edge: the start vertex resolves, and a `rev`
/// partner links back, starts where this edge ends, and lives in the same
/// shell. Finally the faces must be edge-connected and the open edge cache
/// must match the unpaired edges.
pub struct IsValid {
    mesh: MeshId,
}

impl IsValid {
    /// Creates a new `IsValid` query.
    #[must_use]
    pub fn new(mesh: MeshId) -> Self {
        Self { mesh }
    }

    /// Executes the validation, returning `true` if the shell is valid.
    #[must_use]
    pub fn execute(&self, store: &TopologyStore) -> bool {
        self.check(store).is_ok()
    }

    /// Executes the validation, reporting the first violation found.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidTopology`] describing the violation,
    /// or [`TopologyError::EntityNotFound`] for a dangling handle.
    pub fn check(&self, store: &TopologyStore) -> Result<(), TopologyError> {
        let data = store.mesh(self.mesh)?;
        let mut open = 0;
        for &face in &data.faces {
            if store.face(face)?.mesh != Some(self.mesh) {
                return Err(invalid("face does not point back at its shell"));
            }
            check_ring(store, face)?;
            for e in store.face_edges(face)? {
                store.vertex(store.edge(e)?.vert)?;
                match store.edge(e)?.rev {
                    None => open += 1,
                    Some(rev) => self.check_rev(store, e, rev)?,
                }
            }
        }
        if open != data.open_edges.len() {
            return Err(invalid("open edge cache is stale"));
        }
        check_connected(store, &data.faces)
    }

    fn check_rev(
        &self,
        store: &TopologyStore,
        e: EdgeId,
        rev: EdgeId,
    ) -> Result<(), TopologyError> {
        let partner = store.edge(rev)?;
        if partner.rev != Some(e) {
            return Err(invalid("rev link is not symmetric"));
        }
        if partner.vert != store.edge_end(e)? {
            return Err(invalid("rev partner does not run opposite"));
        }
        let Some(face) = partner.face else {
            return Err(invalid("rev partner has no face"));
        };
        if store.face(face)?.mesh != Some(self.mesh) {
            return Err(invalid("rev partner belongs to another shell"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> TopologyError {
    TopologyError::InvalidTopology(reason.into())
}

fn check_ring(store: &TopologyStore, face: FaceId) -> Result<(), TopologyError> {
    let ring = store.face_edges(face)?;
    for &e in &ring {
        let data = store.edge(e)?;
        if data.face != Some(face) {
            return Err(invalid("ring edge does not point back at its face"));
        }
        if store.edge(data.next)?.prev != e {
            return Err(invalid("next/prev links disagree"));
        }
    }

    let start = store.face(face)?.edge;
    let mut e = start;
    for _ in 0..ring.len() {
        e = store.edge(e)?.prev;
    }
    if e != start {
        return Err(invalid("ring does not close along prev"));
    }
    Ok(())
}

fn check_connected(store: &TopologyStore, faces: &[FaceId]) -> Result<(), TopologyError> {
    let Some(&seed) = faces.first() else {
        return Ok(());
    };
    let mut visited = HashSet::from([seed]);
    let mut queue = VecDeque::from([seed]);
    while let Some(face) = queue.pop_front() {
        for e in store.face_edges(face)? {
            let Some(rev) = store.edge(e)?.rev else {
                continue;
            };
            if let Some(neighbour) = store.edge(rev)?.face {
                if visited.insert(neighbour) {
                    queue.push_back(neighbour);
                }
            }
        }
    }
    if visited.len() != faces.len() {
        return Err(invalid("shell is not edge-connected"));
    }
    Ok(())
}
