use crate::math::Point3;

slotmap::new_key_type! {
    /// Unique identifier for a vertex in the topology store.
    pub struct VertexId;
}

/// Data associated with a topological vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexData {
    /// The 3D position of the vertex.
    pub point: Point3,
    /// Caller-defined tag, carried through stitching untouched.
    pub tag: Option<u32>,
}

impl VertexData {
    /// Creates a new untagged vertex at the given point.
    #[must_use]
    pub fn new(point: Point3) -> Self {
        Self { point, tag: None }
    }

    /// Returns a copy of this vertex carrying `tag`.
    #[must_use]
    pub fn with_tag(mut self, tag: u32) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Key that is equal exactly when two positions are bit-for-bit equal.
    ///
    /// `-0.0` and `0.0` are folded together so the key agrees with `==`.
    #[must_use]
    pub fn exact_key(&self) -> [u64; 3] {
        let bits = |c: f64| if c == 0.0 { 0 } else { c.to_bits() };
        [bits(self.point.x), bits(self.point.y), bits(self.point.z)]
    }
}
