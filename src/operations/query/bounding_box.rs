use crate::error::{MeshError, Result};
use crate::math::Point3;
use crate::topology::{MeshId, TopologyStore};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Smallest box holding every point, or `None` if there are none.
    #[must_use]
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self { min: first, max: first }, |acc, p| Self {
            min: acc.min.inf(p),
            max: acc.max.sup(p),
        }))
    }

    /// Smallest box holding both boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Returns `true` if `point` lies inside or on the box.
    #[must_use]
    pub fn contains(&self, point: &Point3) -> bool {
        (0..3).all(|i| self.min[i] <= point[i] && point[i] <= self.max[i])
    }
}

/// Computes the axis-aligned bounding box of a shell.
pub struct BoundingBox {
    mesh: MeshId,
}

impl BoundingBox {
    /// Creates a new `BoundingBox` query.
    #[must_use]
    pub fn new(mesh: MeshId) -> Self {
        Self { mesh }
    }

    /// Executes the query, returning the AABB.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh is missing or has no faces.
    pub fn execute(&self, store: &TopologyStore) -> Result<Aabb> {
        let points = store
            .mesh_vertices(self.mesh)?
            .into_iter()
            .map(|v| store.vertex(v).map(|d| d.point))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Aabb::from_points(&points)
            .ok_or_else(|| MeshError::Failed("bounding box of an empty shell".into()).into())
    }
}
