use crate::error::Result;
use crate::topology::{MeshId, TopologyStore};

/// Computes the enclosed volume of a shell.
///
/// Sums signed tetrahedra over a fan triangulation of every face, with the
/// first vertex of the shell as apex. Open shells and inside-out shells
/// enclose nothing and report `0`.
pub struct Volume {
    mesh: MeshId,
}

impl Volume {
    /// Creates a new `Volume` query.
    #[must_use]
    pub fn new(mesh: MeshId) -> Self {
        Self { mesh }
    }

    /// Executes the query, returning the volume.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh or one of its faces is missing.
    pub fn execute(&self, store: &TopologyStore) -> Result<f64> {
        let data = store.mesh(self.mesh)?;
        if !data.is_closed() || data.is_negative {
            return Ok(0.0);
        }
        Ok(store.mesh_signed_volume(self.mesh)?.max(0.0))
    }
}
