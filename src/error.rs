use thiserror::Error;

/// Top-level error type for the halfmesh crate.
#[derive(Debug, Error)]
pub enum HalfmeshError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors related to the half-edge topology.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("degenerate face: {0}")]
    DegenerateFace(String),

    #[error("edge is still linked into a ring")]
    EdgeStillLinked,

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors related to mesh construction and mesh-level operations.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation failed: {0}")]
    Failed(String),
}

/// Convenience type alias for results using [`HalfmeshError`].
pub type Result<T> = std::result::Result<T, HalfmeshError>;
