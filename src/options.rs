/// Options controlling how a [`MeshSet`](crate::MeshSet) is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshOptions {
    /// Pair non-manifold edges across empty wedges instead of material
    /// wedges. Touching cavities then stay separate shells.
    pub avoid_cavities: bool,
    /// Fail the whole build on a degenerate polygon instead of dropping it.
    pub strict: bool,
}

impl MeshOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets [`MeshOptions::avoid_cavities`].
    #[must_use]
    pub fn avoid_cavities(mut self, value: bool) -> Self {
        self.avoid_cavities = value;
        self
    }

    /// Sets [`MeshOptions::strict`].
    #[must_use]
    pub fn strict(mut self, value: bool) -> Self {
        self.strict = value;
        self
    }
}
